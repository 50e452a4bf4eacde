/*!
 * Tests for the provider clients against a local HTTP stub
 */

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use lexiscribe::app_config::{ExtractionConfig, ModelProvider};
use lexiscribe::errors::ProviderError;
use lexiscribe::providers::gemini::{Gemini, GeminiRequest};
use lexiscribe::providers::{LanguageModel, ModelClient};

/// Serve the given (status line, body) answers, one per connection, and
/// return the raw requests that were received
async fn serve(responses: Vec<(&'static str, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 8192];
            while !request_complete(&request) {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            requests.push(String::from_utf8_lossy(&request).to_string());
        }
        requests
    });

    (format!("http://{}", address), handle)
}

/// Whether the headers and the announced body length have arrived
fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let content_length = headers.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

fn config_for(provider: ModelProvider, endpoint: &str) -> ExtractionConfig {
    let mut config = ExtractionConfig { provider, ..ExtractionConfig::default() };
    let provider_config = config.active_provider_config_mut();
    provider_config.endpoint = endpoint.to_string();
    provider_config.model = "test-model".to_string();
    provider_config.api_key = "secret".to_string();
    config.common.retry_count = 0;
    config
}

#[test]
fn test_fromConfig_shouldLabelClientWithProviderAndModel() {
    let client = ModelClient::from_config(&config_for(ModelProvider::Ollama, "http://localhost:11434")).unwrap();
    assert_eq!(client.label(), "ollama/test-model");

    let client = ModelClient::from_config(&config_for(ModelProvider::Anthropic, "https://api.anthropic.com")).unwrap();
    assert_eq!(client.label(), "anthropic/test-model");
}

#[test]
fn test_geminiRequest_shouldSerializeCamelCaseWithoutModel() {
    let request = GeminiRequest::new("gemini-1.5-flash")
        .add_user_text("page text")
        .temperature(0.5)
        .max_output_tokens(256);

    let value = serde_json::to_value(&request).unwrap();

    assert!(value.get("model").is_none());
    assert_eq!(value["contents"][0]["role"], "user");
    assert_eq!(value["contents"][0]["parts"][0]["text"], "page text");
    assert_eq!(value["generationConfig"]["temperature"], 0.5);
    assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
}

#[test]
fn test_gemini_generateUrl_shouldTrimTrailingSlash() {
    let client = Gemini::new("key", "http://localhost:9000/");
    assert_eq!(
        client.generate_url("gemini-1.5-flash"),
        "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
    );
}

#[tokio::test]
async fn test_ollama_generate_shouldReturnResponseText() {
    let body = r#"{"model":"test-model","response":"[{\"espanol\":\"Abeja\",\"aymara\":\"Vmaña\"}]","done":true}"#;
    let (url, server) = serve(vec![("200 OK", body.to_string())]).await;
    let client = ModelClient::from_config(&config_for(ModelProvider::Ollama, &url)).unwrap();

    let text = client.generate("Extract the entries").await.unwrap();
    let requests = server.await.unwrap();

    assert_eq!(text, r#"[{"espanol":"Abeja","aymara":"Vmaña"}]"#);
    assert!(requests[0].starts_with("POST /api/generate"));
    assert!(requests[0].contains(r#""stream":false"#));
    assert!(requests[0].contains("Extract the entries"));
}

#[tokio::test]
async fn test_gemini_generate_shouldSendKeyHeaderAndJoinParts() {
    let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[]"}]},"finishReason":"STOP"}]}"#;
    let (url, server) = serve(vec![("200 OK", body.to_string())]).await;
    let client = ModelClient::from_config(&config_for(ModelProvider::Gemini, &url)).unwrap();

    let text = client.generate("page").await.unwrap();
    let requests = server.await.unwrap();

    assert_eq!(text, "[]");
    assert!(requests[0].starts_with("POST /v1beta/models/test-model:generateContent"));
    assert!(requests[0].to_lowercase().contains("x-goog-api-key: secret"));
}

#[tokio::test]
async fn test_anthropic_generate_withRateLimit_shouldReturnRateLimitError() {
    let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
    let (url, server) = serve(vec![("429 Too Many Requests", body.to_string())]).await;
    let client = ModelClient::from_config(&config_for(ModelProvider::Anthropic, &url)).unwrap();

    let result = client.generate("page").await;
    server.await.unwrap();

    assert!(matches!(result, Err(ProviderError::RateLimitExceeded(ref message)) if message.contains("slow down")));
}

#[tokio::test]
async fn test_generate_withServerErrorThenSuccess_shouldRetry() {
    let ok = r#"{"model":"test-model","response":"[]","done":true}"#;
    let (url, server) = serve(vec![
        ("503 Service Unavailable", "{}".to_string()),
        ("200 OK", ok.to_string()),
    ]).await;
    let mut config = config_for(ModelProvider::Ollama, &url);
    config.common.retry_count = 1;
    config.common.retry_backoff_ms = 10;
    let client = ModelClient::from_config(&config).unwrap();

    let text = client.generate("page").await.unwrap();
    let requests = server.await.unwrap();

    assert_eq!(text, "[]");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_generate_withUnauthorized_shouldNotRetry() {
    let (url, server) = serve(vec![("401 Unauthorized", "{}".to_string())]).await;
    let mut config = config_for(ModelProvider::Gemini, &url);
    config.common.retry_count = 3;
    config.common.retry_backoff_ms = 10;
    let client = ModelClient::from_config(&config).unwrap();

    let result = client.generate("page").await;
    let requests = server.await.unwrap();

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_generate_withClosedPort_shouldReturnConnectionError() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    let client = ModelClient::from_config(&config_for(ModelProvider::Ollama, &format!("http://{}", address))).unwrap();

    let result = client.generate("page").await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}
