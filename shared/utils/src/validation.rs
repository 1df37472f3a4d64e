use crate::error::{LedgerError, LedgerResult};
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> LedgerResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(LedgerError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match (&error.message, &error.code) {
                (Some(message), _) => message.to_string(),
                (None, code) if *code == "length" => {
                    format!("Length validation failed for field '{}'", field)
                }
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

/// Kind of document reference accepted by the prediction API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Http,
    DataUrl,
}

pub fn validate_document_reference(reference: &str) -> LedgerResult<ReferenceKind> {
    let trimmed = reference.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(ReferenceKind::Http)
    } else if lower.starts_with("data:") {
        if !lower.contains(";base64,") {
            return Err(LedgerError::validation(
                "document",
                "Only base64-encoded data URLs are supported",
            ));
        }
        Ok(ReferenceKind::DataUrl)
    } else {
        Err(LedgerError::validation(
            "document",
            "Document must be an http(s) URL or a data URL",
        ))
    }
}

pub fn validate_file_size(file_size: usize, max_size: usize) -> LedgerResult<()> {
    if file_size > max_size {
        return Err(LedgerError::validation(
            "file_size",
            format!(
                "File size {} bytes exceeds maximum allowed size {} bytes",
                file_size, max_size
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_models::PredictRequest;

    #[test]
    fn test_validate_model_reports_message() {
        let request = PredictRequest {
            document: String::new(),
        };
        let error = validate_model(&request).unwrap_err();
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert!(error.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_validate_document_reference() {
        assert_eq!(
            validate_document_reference("https://cdn.example.com/bill.png").unwrap(),
            ReferenceKind::Http
        );
        assert_eq!(
            validate_document_reference("HTTP://example.com/a.jpg").unwrap(),
            ReferenceKind::Http
        );
        assert_eq!(
            validate_document_reference("data:image/png;base64,iVBORw0KGgo=").unwrap(),
            ReferenceKind::DataUrl
        );
        assert!(validate_document_reference("data:text/plain,hello").is_err());
        assert!(validate_document_reference("ftp://example.com/a.png").is_err());
        assert!(validate_document_reference("bill.png").is_err());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(4096, 2048).is_err());
    }
}
