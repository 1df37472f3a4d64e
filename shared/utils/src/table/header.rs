//! Header Locator
//!
//! Finds the table's column-label row and derives column boundaries from
//! the positions of its labels.

use ledgerlens_models::{ColumnBoundaries, Row};

use crate::config::{ExtractionSettings, HeaderSlotPolicy};

/// Keyword categories scored when looking for the header row
const HEADER_CATEGORIES: &[(&str, &[&str])] = &[
    ("description", &["description", "particular"]),
    ("quantity", &["qty", "quantity", "hour", "hrs"]),
    ("rate", &["rate", "price"]),
    (
        "amount",
        &["amount", "amt", "net", "total", "gross", "discount"],
    ),
];

/// Semantic column a header label maps to, in canonical left-to-right order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderSlot {
    Description,
    Date,
    Quantity,
    Rate,
    Amount,
}

impl HeaderSlot {
    pub const ALL: [HeaderSlot; 5] = [
        HeaderSlot::Description,
        HeaderSlot::Date,
        HeaderSlot::Quantity,
        HeaderSlot::Rate,
        HeaderSlot::Amount,
    ];

    /// First matching rule wins for a single label
    pub fn classify(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        let has = |terms: &[&str]| terms.iter().any(|term| label.contains(term));

        if has(&["desc", "particular"]) {
            Some(Self::Description)
        } else if has(&["date"]) {
            Some(Self::Date)
        } else if has(&["qty", "quantity", "hour", "hrs"]) {
            Some(Self::Quantity)
        } else if has(&["rate", "price"]) {
            Some(Self::Rate)
        } else if has(&["amount", "amt", "net", "gross", "total"]) {
            Some(Self::Amount)
        } else {
            None
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The chosen header row and the column layout read from it
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub index: usize,
    pub boundaries: ColumnBoundaries,
}

/// Number of distinct keyword categories present in the row
pub fn header_score(row: &Row) -> usize {
    let line = row.normalized_text();
    HEADER_CATEGORIES
        .iter()
        .filter(|(_, terms)| terms.iter().any(|term| line.contains(term)))
        .count()
}

/// Pick the best-scoring row as header; earliest row wins ties.
///
/// Returns `None` when no row reaches `settings.min_header_score`.
pub fn locate_header(rows: &[Row], settings: &ExtractionSettings) -> Option<HeaderMatch> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in rows.iter().enumerate() {
        let score = header_score(row);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }

    let (index, score) = best?;
    if score < settings.min_header_score.max(1) {
        tracing::debug!(best_score = score, "No header row detected");
        return None;
    }

    let boundaries = column_boundaries(&rows[index], settings.header_slot_policy);
    tracing::debug!(header_index = index, score, ?boundaries, "Header row located");

    Some(HeaderMatch { index, boundaries })
}

/// Assign header labels to slots and place a boundary halfway between
/// each pair of adjacent slots, named after the slot on its left.
pub fn column_boundaries(header: &Row, policy: HeaderSlotPolicy) -> ColumnBoundaries {
    let mut slot_x: [Option<i32>; 5] = [None; 5];

    for token in &header.tokens {
        let Some(slot) = HeaderSlot::classify(&token.text) else {
            continue;
        };
        let entry = &mut slot_x[slot.index()];
        if entry.is_none() || policy == HeaderSlotPolicy::LastWins {
            *entry = Some(token.x);
        }
    }

    let mut positioned: Vec<(i32, HeaderSlot)> = HeaderSlot::ALL
        .iter()
        .filter_map(|slot| slot_x[slot.index()].map(|x| (x, *slot)))
        .collect();
    positioned.sort();
    positioned.dedup_by_key(|(x, _)| *x);

    let mut boundaries = ColumnBoundaries::default();
    for pair in positioned.windows(2) {
        let (left_x, left_slot) = pair[0];
        let (right_x, _) = pair[1];
        let midpoint = (f64::from(left_x) + f64::from(right_x)) / 2.0;

        match left_slot {
            HeaderSlot::Description => boundaries.desc_end = Some(midpoint),
            HeaderSlot::Date => boundaries.date_end = Some(midpoint),
            HeaderSlot::Quantity => boundaries.qty_end = Some(midpoint),
            HeaderSlot::Rate => boundaries.rate_end = Some(midpoint),
            HeaderSlot::Amount => {}
        }
    }

    enforce_increasing(boundaries)
}

/// Drop boundaries that would break left-to-right column order
fn enforce_increasing(boundaries: ColumnBoundaries) -> ColumnBoundaries {
    let mut floor = f64::NEG_INFINITY;
    let mut keep = |value: Option<f64>| match value {
        Some(v) if v > floor => {
            floor = v;
            Some(v)
        }
        _ => None,
    };

    ColumnBoundaries {
        desc_end: keep(boundaries.desc_end),
        date_end: keep(boundaries.date_end),
        qty_end: keep(boundaries.qty_end),
        rate_end: keep(boundaries.rate_end),
    }
}
