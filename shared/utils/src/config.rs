use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub ocr: OcrConfig,
    pub extraction: ExtractionSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    /// Upper bound on fetch + OCR + extraction for one request
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable; looked up on PATH when unset
    pub tesseract_cmd: Option<String>,
    pub language: String,
    pub page_segmentation_mode: Option<u8>,
}

/// Which header token defines a column when several match the same slot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSlotPolicy {
    #[default]
    LastWins,
    FirstWins,
}

/// Tunables of the table-reconstruction engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Fixed vertical clustering threshold; estimated per document when unset
    pub y_gap: Option<i32>,
    /// Distinct keyword categories a row needs to be taken as the header
    pub min_header_score: usize,
    /// Quantities above this are treated as OCR misreads
    pub max_quantity: f64,
    pub discard_quantity_equal_to_amount: bool,
    pub header_slot_policy: HeaderSlotPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with LEDGERLENS prefix
            .add_source(
                Environment::with_prefix("LEDGERLENS")
                    .separator("__")
                    .try_parsing(true),
            );

        config.build()?.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_request_size: 16 * 1024 * 1024, // 16MB
            timeout_seconds: 60,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            max_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: None,
            language: "eng".to_string(),
            page_segmentation_mode: None,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            y_gap: None,
            min_header_score: 2,
            max_quantity: 25.0,
            discard_quantity_equal_to_amount: true,
            header_slot_policy: HeaderSlotPolicy::LastWins,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_defaults() {
        let settings = ExtractionSettings::default();
        assert_eq!(settings.y_gap, None);
        assert_eq!(settings.min_header_score, 2);
        assert_eq!(settings.max_quantity, 25.0);
        assert!(settings.discard_quantity_equal_to_amount);
        assert_eq!(settings.header_slot_policy, HeaderSlotPolicy::LastWins);
    }

    #[test]
    fn test_slot_policy_names() {
        let policy: HeaderSlotPolicy = serde_json::from_str("\"first_wins\"").unwrap();
        assert_eq!(policy, HeaderSlotPolicy::FirstWins);
        assert_eq!(
            serde_json::to_string(&HeaderSlotPolicy::LastWins).unwrap(),
            "\"last_wins\""
        );
    }

    #[test]
    fn test_partial_extraction_section() {
        let settings: ExtractionSettings =
            serde_json::from_str(r#"{ "max_quantity": 50.0 }"#).unwrap();
        assert_eq!(settings.max_quantity, 50.0);
        assert_eq!(settings.min_header_score, 2);
    }
}
