//! Bill Extraction Service
//!
//! Orchestrates image loading, OCR and table reconstruction, and renders
//! the outcome as a prediction envelope.

use image::RgbImage;
use ledgerlens_models::{BillExtraction, PredictionEnvelope};
use ledgerlens_utils::{BillTableParser, LedgerError, LedgerResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::image_source::{decode_image, ImageSource};
use crate::ocr_engine::OcrEngine;

/// Bill extractor service
pub struct BillExtractor<E> {
    source: Arc<ImageSource>,
    engine: Arc<E>,
    parser: Arc<BillTableParser>,
    timeout: Duration,
}

impl<E> Clone for BillExtractor<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            engine: Arc::clone(&self.engine),
            parser: Arc::clone(&self.parser),
            timeout: self.timeout,
        }
    }
}

impl<E: OcrEngine> BillExtractor<E> {
    pub fn new(source: ImageSource, engine: E, parser: BillTableParser, timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            engine: Arc::new(engine),
            parser: Arc::new(parser),
            timeout,
        }
    }

    /// Predict line items for a referenced document
    pub async fn predict(&self, reference: &str) -> PredictionEnvelope {
        render(self.bounded(self.extract_reference(reference)).await)
    }

    /// Predict line items for uploaded image bytes
    pub async fn predict_upload(&self, data: Vec<u8>) -> PredictionEnvelope {
        render(self.bounded(self.extract_bytes(data)).await)
    }

    pub async fn extract_reference(&self, reference: &str) -> LedgerResult<BillExtraction> {
        let bytes = self.source.fetch(reference).await?;
        self.extract_bytes(bytes).await
    }

    /// Decode, OCR and parse on the blocking pool
    pub async fn extract_bytes(&self, data: Vec<u8>) -> LedgerResult<BillExtraction> {
        let engine = Arc::clone(&self.engine);
        let parser = Arc::clone(&self.parser);

        tokio::task::spawn_blocking(move || {
            let image = decode_image(&data)?;
            extract_image(engine.as_ref(), &parser, &image)
        })
        .await
        .map_err(|e| LedgerError::internal(format!("extraction task failed: {}", e)))?
    }

    async fn bounded<F>(&self, work: F) -> LedgerResult<BillExtraction>
    where
        F: Future<Output = LedgerResult<BillExtraction>>,
    {
        tokio::time::timeout(self.timeout, work)
            .await
            .unwrap_or_else(|_| Err(LedgerError::timeout(self.timeout)))
    }
}

/// Run OCR over a decoded bitmap and rebuild its line-item table
pub fn extract_image<E: OcrEngine + ?Sized>(
    engine: &E,
    parser: &BillTableParser,
    image: &RgbImage,
) -> LedgerResult<BillExtraction> {
    let output = engine.recognize(image)?;
    if output.is_empty() {
        warn!("OCR engine returned no boxes");
    }

    let tokens = output.into_tokens()?;
    let extraction = parser.parse(&tokens);

    if !extraction.has_header() {
        info!("No header row detected; returning empty item list");
    }
    Ok(extraction)
}

fn render(result: LedgerResult<BillExtraction>) -> PredictionEnvelope {
    match result {
        Ok(extraction) => {
            info!(
                items = extraction.item_count(),
                reconciled_amount = extraction.reconciled_amount(),
                "Extraction succeeded"
            );
            PredictionEnvelope::success(&extraction)
        }
        Err(error) => {
            warn!(code = error.error_code(), error = %error, "Extraction failed");
            PredictionEnvelope::failure(error.to_string())
        }
    }
}
