//! Item Extractor
//!
//! Converts the rows below the header into line items by bucketing each
//! token into a column and applying numeric sanity rules.

use ledgerlens_models::{ColumnBoundaries, LineItem, Row};

use super::numeric::{has_digit, parse_number};
use crate::config::ExtractionSettings;

/// Billing-section names printed as divider rows between items
const SECTION_KEYWORDS: &[&str] = &[
    "consultation",
    "room",
    "nursing",
    "laboratory",
    "radiology",
    "surgery",
    "procedure",
    "investigation",
    "pharmacy",
    "others",
    "medicine",
    "consumable",
];

/// Why a row produced no line item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    Totals,
    SectionHeader,
    CategoryTotal,
    MissingDescription,
    MissingAmount,
}

/// Column a data token falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Description,
    Date,
    Quantity,
    Rate,
    Amount,
}

#[derive(Debug, Default)]
struct BucketedRow<'a> {
    description: Vec<&'a str>,
    quantity: Vec<&'a str>,
    rate: Vec<&'a str>,
    amount: Vec<&'a str>,
}

fn bucket_for(x: i32, boundaries: &ColumnBoundaries) -> Bucket {
    let x = f64::from(x);
    let below = |boundary: Option<f64>| boundary.is_some_and(|b| x < b);

    if below(boundaries.desc_end) {
        Bucket::Description
    } else if below(boundaries.date_end) {
        Bucket::Date
    } else if below(boundaries.qty_end) {
        Bucket::Quantity
    } else if below(boundaries.rate_end) {
        Bucket::Rate
    } else {
        Bucket::Amount
    }
}

fn bucket_row<'a>(row: &'a Row, boundaries: &ColumnBoundaries) -> BucketedRow<'a> {
    let mut buckets = BucketedRow::default();
    for token in &row.tokens {
        let text = token.text.as_str();
        match bucket_for(token.x, boundaries) {
            Bucket::Description => buckets.description.push(text),
            Bucket::Date => {}
            Bucket::Quantity => buckets.quantity.push(text),
            Bucket::Rate => buckets.rate.push(text),
            Bucket::Amount => buckets.amount.push(text),
        }
    }
    buckets
}

/// Footer, section-divider and category-total rows carry no item
pub fn classify_non_item(line: &str) -> Option<RowSkip> {
    let trimmed = line.trim();
    if trimmed.starts_with("total") || trimmed.contains("grand total") {
        return Some(RowSkip::Totals);
    }
    if !has_digit(trimmed) && SECTION_KEYWORDS.iter().any(|kw| trimmed.contains(kw)) {
        return Some(RowSkip::SectionHeader);
    }
    if trimmed.contains("category total") {
        return Some(RowSkip::CategoryTotal);
    }
    None
}

/// Join description tokens and drop a leading serial number
pub fn clean_description(tokens: &[&str]) -> String {
    let joined = tokens.join(" ");
    let mut parts = joined.split_whitespace().peekable();
    if parts
        .peek()
        .is_some_and(|first| first.chars().all(|c| c.is_ascii_digit()))
    {
        parts.next();
    }
    parts.collect::<Vec<_>>().join(" ")
}

fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Turn one data row into a line item, or report why it was skipped
pub fn extract_row(
    row: &Row,
    boundaries: &ColumnBoundaries,
    settings: &ExtractionSettings,
) -> Result<LineItem, RowSkip> {
    if let Some(skip) = classify_non_item(&row.normalized_text()) {
        return Err(skip);
    }

    let buckets = bucket_row(row, boundaries);

    let description = clean_description(&buckets.description);
    let mut quantity = parse_number(&buckets.quantity.concat());
    let mut rate = parse_number(&buckets.rate.concat());

    let amount_tokens: Vec<&str> = buckets
        .amount
        .iter()
        .copied()
        .filter(|t| has_digit(t) && !t.contains('/'))
        .collect();
    let amount = amount_tokens.last().and_then(|t| parse_number(t));
    if rate.is_none() && amount_tokens.len() >= 2 {
        rate = parse_number(amount_tokens[amount_tokens.len() - 2]);
    }

    if let (Some(q), Some(a)) = (quantity, amount) {
        if settings.discard_quantity_equal_to_amount && same_value(q, a) {
            quantity = None;
        }
    }
    if quantity.is_some_and(|q| q > settings.max_quantity || q <= 0.0) {
        quantity = None;
    }

    if description.is_empty() {
        return Err(RowSkip::MissingDescription);
    }
    let Some(amount) = amount else {
        return Err(RowSkip::MissingAmount);
    };

    Ok(LineItem::new(description, quantity, rate, amount))
}

/// Extract line items from every row after the header, in row order
pub fn extract_items(
    rows: &[Row],
    header_index: Option<usize>,
    boundaries: Option<&ColumnBoundaries>,
    settings: &ExtractionSettings,
) -> Vec<LineItem> {
    let (Some(header_index), Some(boundaries)) = (header_index, boundaries) else {
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .skip(header_index + 1)
        .filter_map(|(idx, row)| match extract_row(row, boundaries, settings) {
            Ok(item) => Some(item),
            Err(reason) => {
                tracing::trace!(row = idx, ?reason, text = %row.joined_text(), "Skipped row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_models::Token;

    fn row(tokens: &[(i32, &str)]) -> Row {
        Row::new(tokens.iter().map(|(x, t)| Token::new(*x, 0, *t)).collect())
    }

    fn boundaries() -> ColumnBoundaries {
        ColumnBoundaries {
            desc_end: Some(155.0),
            date_end: None,
            qty_end: Some(350.0),
            rate_end: Some(450.0),
        }
    }

    fn extract(tokens: &[(i32, &str)]) -> Result<LineItem, RowSkip> {
        extract_row(&row(tokens), &boundaries(), &ExtractionSettings::default())
    }

    #[test]
    fn test_full_row() {
        let item = extract(&[
            (10, "92"),
            (40, "Livi"),
            (70, "300mg"),
            (100, "Tab"),
            (300, "2"),
            (400, "50.00"),
            (500, "100.00"),
        ])
        .unwrap();

        assert_eq!(item.item_name, "Livi 300mg Tab");
        assert_eq!(item.item_quantity, 2.0);
        assert_eq!(item.item_rate, 50.0);
        assert_eq!(item.item_amount, 100.0);
    }

    #[test]
    fn test_non_item_rows() {
        assert_eq!(classify_non_item("total 450.00"), Some(RowSkip::Totals));
        assert_eq!(classify_non_item("  grand total 450.00"), Some(RowSkip::Totals));
        assert_eq!(classify_non_item("pharmacy"), Some(RowSkip::SectionHeader));
        assert_eq!(
            classify_non_item("room charges"),
            Some(RowSkip::SectionHeader)
        );
        assert_eq!(
            classify_non_item("category total 1,200.00"),
            Some(RowSkip::CategoryTotal)
        );
        assert_eq!(classify_non_item("room rent 2 1500 3000"), None);
        assert_eq!(classify_non_item("livi 300mg tab 2 50.00 100.00"), None);
    }

    #[test]
    fn test_grand_total_row_skipped() {
        assert_eq!(
            extract(&[(10, "Grand"), (60, "Total"), (500, "450.00")]),
            Err(RowSkip::Totals)
        );
    }

    #[test]
    fn test_section_row_skipped() {
        assert_eq!(extract(&[(10, "PHARMACY")]), Err(RowSkip::SectionHeader));
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description(&["92", "Livi", "300mg", "Tab"]), "Livi 300mg Tab");
        assert_eq!(clean_description(&["300mg", "Tab"]), "300mg Tab");
        assert_eq!(clean_description(&["12"]), "");
        assert_eq!(clean_description(&[]), "");
    }

    #[test]
    fn test_quantity_equal_to_amount_discarded() {
        let item = extract(&[(40, "Dressing"), (300, "40"), (500, "40.00")]).unwrap();
        assert_eq!(item.item_quantity, 1.0);
        assert_eq!(item.item_rate, 40.0);
        assert_eq!(item.item_amount, 40.0);
    }

    #[test]
    fn test_equal_quantity_kept_when_rule_disabled() {
        let settings = ExtractionSettings {
            discard_quantity_equal_to_amount: false,
            max_quantity: 100.0,
            ..Default::default()
        };
        let item = extract_row(
            &row(&[(40, "Dressing"), (300, "40"), (500, "40.00")]),
            &boundaries(),
            &settings,
        )
        .unwrap();
        assert_eq!(item.item_quantity, 40.0);
    }

    #[test]
    fn test_quantity_threshold() {
        let item = extract(&[(40, "Gloves"), (300, "30"), (500, "300.00")]).unwrap();
        assert_eq!(item.item_quantity, 1.0);

        let item = extract(&[(40, "Gloves"), (300, "24"), (500, "240.00")]).unwrap();
        assert_eq!(item.item_quantity, 24.0);
    }

    #[test]
    fn test_zero_quantity_defaults() {
        let item = extract(&[(40, "Gloves"), (300, "0"), (500, "240.00")]).unwrap();
        assert_eq!(item.item_quantity, 1.0);
    }

    #[test]
    fn test_rate_from_amount_bucket() {
        // Gross and net both to the right of the rate boundary
        let item = extract(&[(40, "X-Ray"), (300, "1"), (470, "1,200.00"), (520, "1,100.00")]).unwrap();
        assert_eq!(item.item_rate, 1200.0);
        assert_eq!(item.item_amount, 1100.0);
    }

    #[test]
    fn test_amount_ignores_dates_and_words() {
        let item = extract(&[(40, "Consult"), (470, "12/05/2024"), (500, "500.00"), (560, "Rs")]).unwrap();
        assert_eq!(item.item_amount, 500.0);
        assert_eq!(item.item_rate, 500.0);
    }

    #[test]
    fn test_unparseable_amount_rejects_row() {
        assert_eq!(
            extract(&[(40, "Consult"), (500, "5OO.0O1")]),
            Err(RowSkip::MissingAmount)
        );
    }

    #[test]
    fn test_missing_description_or_amount() {
        assert_eq!(
            extract(&[(10, "7"), (300, "2"), (500, "100.00")]),
            Err(RowSkip::MissingDescription)
        );
        assert_eq!(
            extract(&[(40, "Bandage"), (300, "2")]),
            Err(RowSkip::MissingAmount)
        );
    }

    #[test]
    fn test_quantity_tokens_are_concatenated() {
        let item = extract(&[(40, "Saline"), (300, "1,"), (320, "5"), (500, "900.00")]).unwrap();
        assert_eq!(item.item_quantity, 15.0);
    }

    #[test]
    fn test_date_bucket_dropped() {
        let boundaries = ColumnBoundaries {
            desc_end: Some(150.0),
            date_end: Some(250.0),
            qty_end: Some(350.0),
            rate_end: Some(450.0),
        };
        let item = extract_row(
            &row(&[(40, "ECG"), (200, "12/05"), (300, "1"), (400, "250"), (500, "250")]),
            &boundaries,
            &ExtractionSettings::default(),
        )
        .unwrap();
        assert_eq!(item.item_name, "ECG");
        assert_eq!(item.item_rate, 250.0);
    }

    #[test]
    fn test_missing_boundaries_widen_next_bucket() {
        // Only a description boundary: everything right of it is amount
        let boundaries = ColumnBoundaries {
            desc_end: Some(215.0),
            ..Default::default()
        };
        let item = extract_row(
            &row(&[(10, "Injection"), (300, "3"), (420, "150.00")]),
            &boundaries,
            &ExtractionSettings::default(),
        )
        .unwrap();
        assert_eq!(item.item_quantity, 1.0);
        assert_eq!(item.item_rate, 3.0);
        assert_eq!(item.item_amount, 150.0);
    }

    #[test]
    fn test_no_header_yields_nothing() {
        let rows = vec![row(&[(40, "Livi"), (500, "100.00")])];
        let settings = ExtractionSettings::default();
        assert!(extract_items(&rows, None, None, &settings).is_empty());
    }

    #[test]
    fn test_rows_before_header_ignored() {
        let rows = vec![
            row(&[(40, "Deposit"), (500, "1000.00")]),
            row(&[(10, "Description"), (300, "Qty"), (400, "Rate"), (500, "Amount")]),
            row(&[(40, "Livi"), (500, "100.00")]),
        ];
        let items = extract_items(&rows, Some(1), Some(&boundaries()), &ExtractionSettings::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Livi");
    }
}
