//! LedgerLens Document Processing Service
//!
//! Reconstructs itemized line items from bill images: fetch, OCR with
//! Tesseract, then rebuild the table from word positions.

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::{header, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use ledgerlens_models::{PredictRequest, PredictionEnvelope};
use ledgerlens_utils::{
    init_logging, validate_model, AppConfig, BillTableParser, LedgerError, LedgerResult,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

mod extraction;
mod image_source;
mod middleware;
mod ocr_engine;

use extraction::BillExtractor;
use image_source::ImageSource;
use middleware::request_id_middleware;
use ocr_engine::{OcrEngine, TesseractEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting LedgerLens Document Processing Service");

    let engine = TesseractEngine::from_config(&config.ocr)?;
    let source = ImageSource::new(&config.fetch)?;
    let parser = BillTableParser::with_settings(config.extraction.clone());
    let extractor = BillExtractor::new(
        source,
        engine,
        parser,
        Duration::from_secs(config.server.timeout_seconds),
    );

    let app = create_app(extractor, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Document Processing Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub struct AppState<E> {
    pub extractor: BillExtractor<E>,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
        }
    }
}

fn create_app<E: OcrEngine>(extractor: BillExtractor<E>, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict::<E>))
        .route("/api/v1/documents/extract", post(extract_upload::<E>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE]),
                )
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
        .with_state(AppState { extractor })
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "ledgerlens-document-processing",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Extract line items from a referenced bill image.
///
/// Always answers with an envelope; failures are reported in-band.
async fn predict<E: OcrEngine>(
    State(state): State<AppState<E>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Json<PredictionEnvelope> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Json(PredictionEnvelope::failure(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };

    if let Err(e) = validate_model(&request) {
        return Json(PredictionEnvelope::failure(e.to_string()));
    }

    info!(document = %preview(&request.document), "Prediction requested");
    Json(state.extractor.predict(&request.document).await)
}

/// Extract line items from an uploaded bill image.
///
/// Upload size is bounded by `server.max_request_size` through the body
/// limit layer; an oversized body surfaces as a read error.
async fn extract_upload<E: OcrEngine>(
    State(state): State<AppState<E>>,
    mut multipart: Multipart,
) -> Json<PredictionEnvelope> {
    match read_upload(&mut multipart).await {
        Ok(data) => Json(state.extractor.predict_upload(data).await),
        Err(e) => Json(PredictionEnvelope::failure(e.to_string())),
    }
}

async fn read_upload(multipart: &mut Multipart) -> LedgerResult<Vec<u8>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| LedgerError::validation("file", format!("Upload error: {}", e)))?
        .ok_or_else(|| LedgerError::validation("file", "No file provided"))?;

    let filename = field.file_name().unwrap_or("unknown").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| LedgerError::validation("file", format!("Read error: {}", e)))?;

    info!(filename = %filename, size_bytes = data.len(), "Received upload");

    Ok(data.to_vec())
}

/// Data URLs can be megabytes long; log only their head
fn preview(reference: &str) -> &str {
    match reference.char_indices().nth(64) {
        Some((end, _)) => &reference[..end],
        None => reference,
    }
}
