//! Display helpers shared by the console tables.

pub mod format;

pub use format::{format_date, format_fingerprint, format_optional, truncate_string};
