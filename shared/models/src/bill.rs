//! Bill line-item models.
//!
//! This module defines the column layout inferred from a header row and the
//! structured line items produced from the rows that follow it.

use serde::{Deserialize, Serialize};

/// X thresholds separating adjacent table columns.
///
/// Every boundary is optional; present boundaries are strictly increasing
/// in declaration order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnBoundaries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_end: Option<f64>,
}

impl ColumnBoundaries {
    /// Boundaries in column order, absent ones included
    pub fn ordered(&self) -> [Option<f64>; 4] {
        [self.desc_end, self.date_end, self.qty_end, self.rate_end]
    }

    pub fn is_empty(&self) -> bool {
        self.ordered().iter().all(Option::is_none)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        let present: Vec<f64> = self.ordered().into_iter().flatten().collect();
        present.windows(2).all(|w| w[0] < w[1])
    }
}

/// One structured billing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub item_name: String,
    pub item_quantity: f64,
    pub item_rate: f64,
    pub item_amount: f64,
}

impl LineItem {
    /// Build an item, defaulting quantity to 1.0 and rate to the amount
    pub fn new(
        item_name: impl Into<String>,
        item_quantity: Option<f64>,
        item_rate: Option<f64>,
        item_amount: f64,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            item_quantity: item_quantity.unwrap_or(1.0),
            item_rate: item_rate.unwrap_or(item_amount),
            item_amount,
        }
    }
}

/// Result of reconstructing the line-item table of one document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillExtraction {
    pub header_index: Option<usize>,
    pub boundaries: Option<ColumnBoundaries>,
    pub line_items: Vec<LineItem>,
    /// Non-blank tokens that went into the extraction
    pub token_count: usize,
}

impl BillExtraction {
    pub fn item_count(&self) -> usize {
        self.line_items.len()
    }

    /// Sum of every item amount
    pub fn reconciled_amount(&self) -> f64 {
        self.line_items.iter().map(|item| item.item_amount).sum()
    }

    pub fn has_header(&self) -> bool {
        self.header_index.is_some()
    }
}
