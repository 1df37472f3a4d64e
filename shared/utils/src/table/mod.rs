//! Bill Table Reconstruction Module
//!
//! Rebuilds the line-item table of a bill from positioned OCR tokens:
//! rows are assembled from token tops, the header row fixes the column
//! boundaries, and each following row is bucketed into columns.

pub mod rows;
pub mod header;
pub mod items;
pub mod numeric;
pub mod parser;

pub use rows::{assemble_rows, estimate_y_gap};
pub use header::{column_boundaries, header_score, locate_header, HeaderMatch, HeaderSlot};
pub use items::{classify_non_item, clean_description, extract_items, extract_row, RowSkip};
pub use numeric::parse_number;
pub use parser::BillTableParser;
