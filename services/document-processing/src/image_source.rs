//! Image Source
//!
//! Resolves a document reference (http(s) URL or base64 `data:` URL) to
//! image bytes and decodes them into an RGB bitmap.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::RgbImage;
use ledgerlens_utils::{
    validate_document_reference, validate_file_size, FetchConfig, LedgerError, LedgerResult,
    ReferenceKind,
};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Fetches bill images over HTTP
#[derive(Debug, Clone)]
pub struct ImageSource {
    client: Client,
    max_bytes: usize,
}

impl ImageSource {
    pub fn new(config: &FetchConfig) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Resolve a reference to raw image bytes
    pub async fn fetch(&self, reference: &str) -> LedgerResult<Vec<u8>> {
        let reference = reference.trim();
        let bytes = match validate_document_reference(reference)? {
            ReferenceKind::Http => self.download(reference).await?,
            ReferenceKind::DataUrl => decode_data_url(reference)?,
        };

        validate_file_size(bytes.len(), self.max_bytes)?;
        Ok(bytes)
    }

    async fn download(&self, url: &str) -> LedgerResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        info!(status = %response.status(), content_type = %content_type, "Fetched document");

        let mut response = response.error_for_status()?;
        let declared = response
            .content_length()
            .map(|length| usize::try_from(length).unwrap_or(usize::MAX));
        if let Some(length) = declared {
            validate_file_size(length, self.max_bytes)?;
        }

        // Chunked bodies carry no length, so the limit is enforced while reading
        let mut body = Vec::with_capacity(declared.unwrap_or(0).min(self.max_bytes));
        while let Some(chunk) = response.chunk().await? {
            validate_file_size(body.len() + chunk.len(), self.max_bytes)?;
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URL
pub fn decode_data_url(reference: &str) -> LedgerResult<Vec<u8>> {
    const MARKER: &str = ";base64,";

    // ASCII lowercasing keeps byte offsets, so the index applies to the original
    let start = reference
        .to_ascii_lowercase()
        .find(MARKER)
        .ok_or_else(|| LedgerError::validation("document", "Malformed data URL"))?;
    let payload = &reference[start + MARKER.len()..];

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(payload)?)
}

/// Decode image bytes and normalize to 8-bit RGB
pub fn decode_image(bytes: &[u8]) -> LedgerResult<RgbImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}
