pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod table;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;
pub use table::*;
