//! Data file readers
//!
//! This module contains the tokenizer for line-oriented task logs and the
//! reader for binary analog data files.

pub mod analog;
pub mod log_file;

// Re-export reader types
pub use analog::{load_analog_data, parse_analog_data, AnalogSample};
pub use log_file::{parse_data, parse_print, read_log_file, split_info, tokenize, LogLine};
