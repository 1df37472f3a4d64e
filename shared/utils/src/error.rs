use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LedgerError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Document fetch error: {message}")]
    Fetch { message: String },

    #[error("Image decode error: {message}")]
    Decode { message: String },

    #[error("OCR engine error: {message}")]
    Ocr { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl LedgerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Fetch { .. } => "DOCUMENT_FETCH_ERROR",
            Self::Decode { .. } => "IMAGE_DECODE_ERROR",
            Self::Ocr { .. } => "OCR_ENGINE_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Fetch { .. } => 502,
            Self::Decode { .. } => 422,
            Self::Ocr { .. } => 500,
            Self::Configuration { .. } => 500,
            Self::Timeout { .. } => 504,
            Self::Internal { .. } => 500,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// Conversion from common error types
impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        Self::fetch(error.to_string())
    }
}

impl From<base64::DecodeError> for LedgerError {
    fn from(error: base64::DecodeError) -> Self {
        Self::fetch(format!("invalid base64 payload: {}", error))
    }
}

impl From<image::ImageError> for LedgerError {
    fn from(error: image::ImageError) -> Self {
        Self::decode(error.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        Self::ocr(format!("malformed TSV output: {}", error))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}
