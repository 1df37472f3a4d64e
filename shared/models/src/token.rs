//! Positioned OCR tokens and the rows they are grouped into.
//!
//! Tokens arrive from the OCR engine in its native emission order. Rows are
//! derived from them once per document and discarded after extraction.

use serde::{Deserialize, Serialize};

/// A single OCR-recognized word with its pixel position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Left edge in pixels
    pub x: i32,
    /// Top edge in pixels
    pub y: i32,
    pub text: String,
}

impl Token {
    pub fn new(x: i32, y: i32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }

    /// Blank placeholders emitted by the OCR engine carry no text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Tokens sharing one visual line, ordered left to right
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row {
    pub tokens: Vec<Token>,
}

impl Row {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|t| t.x);
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Space-joined token text in left-to-right order
    pub fn joined_text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lower-cased joined text, the form every keyword rule matches against
    pub fn normalized_text(&self) -> String {
        self.joined_text().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_sorts_tokens_by_x() {
        let row = Row::new(vec![
            Token::new(300, 10, "Qty"),
            Token::new(10, 11, "Description"),
            Token::new(400, 9, "Rate"),
        ]);

        let xs: Vec<i32> = row.tokens.iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![10, 300, 400]);
        assert_eq!(row.joined_text(), "Description Qty Rate");
        assert_eq!(row.normalized_text(), "description qty rate");
    }

    #[test]
    fn test_blank_token_detection() {
        assert!(Token::new(0, 0, "   ").is_blank());
        assert!(Token::new(0, 0, "").is_blank());
        assert!(!Token::new(0, 0, " x ").is_blank());
    }
}
