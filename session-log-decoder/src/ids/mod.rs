//! State/event ID tables
//!
//! Parses the `S` and `E` mapping literals of a log and merges them into one
//! ID lookup.

pub mod literal;
pub mod table;

pub use literal::parse_id_mapping;
pub use table::{IdEntry, IdTable};
