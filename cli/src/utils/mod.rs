//! Shared helpers for the DINSY CLI

pub mod formatting;

pub use formatting::{parse_output_format, OutputFormat};
