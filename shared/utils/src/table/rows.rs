//! Row Assembler
//!
//! Clusters the OCR token stream into horizontal rows in reading order.

use ledgerlens_models::{Row, Token};

/// Threshold used when too few distinct tops exist to estimate one
pub const DEFAULT_Y_GAP: i32 = 12;
/// Lower bound on an estimated threshold
pub const MIN_Y_GAP: i32 = 10;
const Y_GAP_SCALE: f64 = 0.8;

/// Estimate the vertical clustering threshold from the token tops.
///
/// Takes the median gap between consecutive distinct tops, scaled by 0.8
/// and floored at [`MIN_Y_GAP`]. Blank tokens are ignored.
pub fn estimate_y_gap(tokens: &[Token]) -> i32 {
    let mut tops: Vec<i32> = tokens
        .iter()
        .filter(|t| !t.is_blank())
        .map(|t| t.y)
        .collect();
    tops.sort_unstable();
    tops.dedup();

    if tops.len() < 3 {
        return DEFAULT_Y_GAP;
    }

    let mut diffs: Vec<u32> = tops
        .windows(2)
        .map(|w| w[1].abs_diff(w[0]))
        .filter(|d| *d > 0)
        .collect();
    diffs.sort_unstable();

    let median = median(&diffs);
    ((median * Y_GAP_SCALE) as i32).max(MIN_Y_GAP)
}

fn median(sorted: &[u32]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Group tokens into rows.
///
/// A token joins the current row when its top is within `y_gap` of the
/// previous token's top; otherwise it opens a new row. `None` estimates the
/// threshold from the tokens themselves.
pub fn assemble_rows(tokens: &[Token], y_gap: Option<i32>) -> Vec<Row> {
    let y_gap = y_gap.unwrap_or_else(|| estimate_y_gap(tokens));

    let mut rows = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut last_y: Option<i32> = None;

    for token in tokens.iter().filter(|t| !t.is_blank()) {
        let text = token.text.trim();

        let breaks_row = last_y
            .is_some_and(|prev| i64::from(token.y.abs_diff(prev)) > i64::from(y_gap));
        if breaks_row {
            rows.push(Row::new(std::mem::take(&mut current)));
        }

        current.push(Token::new(token.x, token.y, text));
        last_y = Some(token.y);
    }

    if !current.is_empty() {
        rows.push(Row::new(current));
    }

    tracing::debug!(rows = rows.len(), y_gap, "Assembled rows");
    rows
}
