//! JSON request and response envelope of the prediction API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::bill::{BillExtraction, LineItem};

/// Output tokens attributed to each emitted line item in the usage estimate
pub const OUTPUT_TOKENS_PER_ITEM: usize = 4;

/// Incoming prediction request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictRequest {
    /// http(s) URL or `data:` URL of the bill image
    #[validate(length(min = 1, message = "Document reference must not be empty"))]
    pub document: String,
}

/// Response envelope; always well-formed, even on failure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionEnvelope {
    pub is_success: bool,
    pub data: Option<BillData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillData {
    pub pagewise_line_items: Vec<PageLineItems>,
    pub total_item_count: usize,
    pub reconciled_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageLineItems {
    pub page_no: String,
    pub bill_items: Vec<LineItem>,
}

/// Synthesized usage figures for reporting only; not a resource measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub total_tokens: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn estimate(ocr_tokens: usize, item_count: usize) -> Self {
        let output_tokens = item_count * OUTPUT_TOKENS_PER_ITEM;
        Self {
            total_tokens: ocr_tokens + output_tokens,
            input_tokens: ocr_tokens,
            output_tokens,
        }
    }
}

impl PredictionEnvelope {
    /// Wrap a single-page extraction
    pub fn success(extraction: &BillExtraction) -> Self {
        let data = BillData {
            pagewise_line_items: vec![PageLineItems {
                page_no: "1".to_string(),
                bill_items: extraction.line_items.clone(),
            }],
            total_item_count: extraction.item_count(),
            reconciled_amount: extraction.reconciled_amount(),
        };

        Self {
            is_success: true,
            data: Some(data),
            token_usage: Some(TokenUsage::estimate(
                extraction.token_count,
                extraction.item_count(),
            )),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            data: None,
            token_usage: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = PredictionEnvelope::failure("download failed");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "is_success": false,
                "data": null,
                "error": "download failed"
            })
        );
    }

    #[test]
    fn test_success_envelope_shape() {
        let extraction = BillExtraction {
            header_index: Some(0),
            boundaries: None,
            line_items: vec![LineItem::new("Livi 300mg Tab", Some(2.0), Some(50.0), 100.0)],
            token_count: 11,
        };

        let value = serde_json::to_value(PredictionEnvelope::success(&extraction)).unwrap();

        assert_eq!(value["is_success"], json!(true));
        assert_eq!(value["data"]["total_item_count"], json!(1));
        assert_eq!(value["data"]["reconciled_amount"], json!(100.0));
        assert_eq!(value["data"]["pagewise_line_items"][0]["page_no"], json!("1"));
        assert_eq!(
            value["data"]["pagewise_line_items"][0]["bill_items"][0],
            json!({
                "item_name": "Livi 300mg Tab",
                "item_quantity": 2.0,
                "item_rate": 50.0,
                "item_amount": 100.0
            })
        );
        assert_eq!(
            value["token_usage"],
            json!({ "total_tokens": 15, "input_tokens": 11, "output_tokens": 4 })
        );
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_empty_extraction_is_still_success() {
        let envelope = PredictionEnvelope::success(&BillExtraction::default());
        assert!(envelope.is_success);
        let data = envelope.data.unwrap();
        assert_eq!(data.total_item_count, 0);
        assert!(data.pagewise_line_items[0].bill_items.is_empty());
    }

    #[test]
    fn test_predict_request_validation() {
        let request = PredictRequest { document: String::new() };
        assert!(request.validate().is_err());

        let request = PredictRequest {
            document: "https://example.com/bill.png".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
