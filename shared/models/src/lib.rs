//! # LedgerLens Core Domain Models
//!
//! Data types shared between the table-reconstruction engine and the
//! document-processing service.
//!
//! ## Key Models
//!
//! - **Token** / **Row**: positioned OCR words and the visual lines they form
//! - **ColumnBoundaries**: x thresholds inferred from the header row
//! - **LineItem**: one structured billing entry
//! - **BillExtraction**: the line items of one document plus header metadata
//! - **PredictionEnvelope**: the JSON envelope returned by the prediction API

pub mod token;
pub mod bill;
pub mod envelope;


pub use token::*;
pub use bill::*;
pub use envelope::*;
