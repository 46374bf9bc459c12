//! Permissive parsers for uploaded evidence.
//!
//! Both parsers are total: malformed input degrades to a best-effort
//! interpretation (or an empty result) instead of an error.

pub mod delimited;
pub mod structured;

pub use delimited::{parse_delimited, to_records, write_delimited, Row};
pub use structured::normalize;
