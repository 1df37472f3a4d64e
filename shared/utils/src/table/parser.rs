//! Bill Table Parser
//!
//! Runs the full reconstruction: tokens → rows → header and boundaries →
//! line items. Pure and synchronous; identical input yields identical output.

use ledgerlens_models::{BillExtraction, Token};

use super::header::locate_header;
use super::items::extract_items;
use super::rows::assemble_rows;
use crate::config::ExtractionSettings;

/// Table-reconstruction engine configured with extraction tunables
#[derive(Debug, Clone, Default)]
pub struct BillTableParser {
    settings: ExtractionSettings,
}

impl BillTableParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    /// Reconstruct the line-item table from an OCR token stream
    pub fn parse(&self, tokens: &[Token]) -> BillExtraction {
        let token_count = tokens.iter().filter(|t| !t.is_blank()).count();
        let rows = assemble_rows(tokens, self.settings.y_gap);

        let header = locate_header(&rows, &self.settings);
        let header_index = header.as_ref().map(|h| h.index);
        let boundaries = header.map(|h| h.boundaries);

        let line_items = extract_items(&rows, header_index, boundaries.as_ref(), &self.settings);

        tracing::info!(
            tokens = token_count,
            rows = rows.len(),
            header_index = ?header_index,
            items = line_items.len(),
            "Parsed bill table"
        );

        BillExtraction {
            header_index,
            boundaries,
            line_items,
            token_count,
        }
    }
}
