//! Error types used by the parsing modules

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
