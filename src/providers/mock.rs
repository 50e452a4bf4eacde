/*!
 * Mock language model for testing.
 *
 * This module provides a model that simulates different behaviors without
 * any network access:
 * - `MockModel::fixed(text)` - Always answers with the same text
 * - `MockModel::malformed()` - Answers with prose instead of JSON
 * - `MockModel::failing()` - Always fails with an error
 * - `MockModel::scripted(steps)` - Plays back one step per call
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::LanguageModel;

/// One scripted answer
#[derive(Debug, Clone, PartialEq)]
pub enum MockStep {
    /// Answer with this text
    Reply(String),
    /// Fail with an API error carrying this message
    Fail(String),
}

/// Behavior mode for the mock model
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always answers with the given text
    Fixed(String),
    /// Answers with text that is not JSON
    Malformed,
    /// Fails intermittently (every Nth request), otherwise answers `[]`
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty answer
    Empty,
    /// Plays the steps in order; answers `[]` once they run out
    Scripted(Vec<MockStep>),
}

/// Mock model for testing extraction behavior
#[derive(Debug, Clone)]
pub struct MockModel {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every prompt received, shared between clones
    prompts: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional, overrides `Fixed`)
    custom_response: Option<fn(&str) -> String>,
}

impl MockModel {
    /// Create a new mock model with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Always answer with `text`
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(text.into()))
    }

    /// Answer with prose instead of a JSON array
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Fail every `fail_every`-th request
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Always fail
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Always answer with an empty string
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Play back `steps`, one per call
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        Self::new(MockBehavior::Scripted(steps))
    }

    /// Set a custom response generator, called with the full prompt
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Build a JSON array answer with the given keys and term pairs
    pub fn entries_json(output_key: &str, source_key: &str, pairs: &[(&str, &str)]) -> String {
        let items: Vec<serde_json::Value> = pairs.iter()
            .map(|(output, source)| {
                let mut object = serde_json::Map::new();
                object.insert(output_key.to_string(), serde_json::Value::String(output.to_string()));
                object.insert(source_key.to_string(), serde_json::Value::String(source.to_string()));
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(items).to_string()
    }

    /// Wrap an answer in a ```json fence, as chat models often do
    pub fn fenced(json: &str) -> String {
        format!("```json\n{}\n```", json)
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match &self.behavior {
            MockBehavior::Fixed(text) => Ok(match self.custom_response {
                Some(generator) => generator(prompt),
                None => text.clone(),
            }),

            MockBehavior::Malformed => Ok("Here are the entries you asked for: Abeja. Vmaña".to_string()),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok("[]".to_string())
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Scripted(steps) => match steps.get(count) {
                Some(MockStep::Reply(text)) => Ok(text.clone()),
                Some(MockStep::Fail(message)) => Err(ProviderError::ApiError {
                    message: message.clone(),
                    status_code: 500,
                }),
                None => Ok("[]".to_string()),
            },
        }
    }

    fn label(&self) -> String {
        "mock".to_string()
    }
}
