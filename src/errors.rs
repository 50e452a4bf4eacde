/*!
 * Error types for the lexiscribe application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map an HTTP error status and body onto the matching variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors raised while opening or reading the source document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document could not be opened at all
    #[error("Failed to open document {path}: {message}")]
    Open {
        /// Path of the document
        path: String,
        /// Underlying cause
        message: String,
    },

    /// The document type is not supported
    #[error("Unsupported document type: {0}")]
    Unsupported(String),

    /// A single page could not be read
    #[error("Failed to load page {page_number}: {message}")]
    PageLoad {
        /// 1-based page number
        page_number: u32,
        /// Underlying cause
        message: String,
    },
}

/// Errors that make a page contribute zero entries
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The model answered with something that is not a JSON array
    #[error("Invalid JSON from model on page {page_number}: {message}")]
    InvalidJson {
        /// 1-based page number
        page_number: u32,
        /// Parser message
        message: String,
        /// Raw model response, kept for diagnostics
        raw_response: String,
    },

    /// The model call itself failed
    #[error("Model call failed on page {page_number}: {source}")]
    Model {
        /// 1-based page number
        page_number: u32,
        /// Provider failure
        #[source]
        source: ProviderError,
    },
}

impl ExtractionError {
    /// The page the failure belongs to
    pub fn page_number(&self) -> u32 {
        match self {
            Self::InvalidJson { page_number, .. } | Self::Model { page_number, .. } => *page_number,
        }
    }
}

/// Errors raised while writing output files
#[derive(Error, Debug)]
pub enum ExportError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer failure
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
