//! Core types for the session log decoder library
//!
//! This module defines the fundamental records produced when a task log is
//! parsed: occurrences (state entries and events), subject identifiers and the
//! error taxonomy for malformed logs and session queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Time in milliseconds since the start of the session
pub type Millis = i64;

/// A single state entry or event within a session
///
/// Occurrences are kept in the order they appear in the log file, which is
/// non-decreasing in time for logs written by the task framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Milliseconds since the session started
    pub time: Millis,
    /// State or event name resolved through the ID table
    pub name: String,
}

impl Occurrence {
    /// Create a new occurrence
    pub fn new(time: Millis, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
        }
    }
}

/// Whether an ID belongs to the state or event space of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Entry into a state of the task's state machine
    State,
    /// An event (input, timer or published event)
    Event,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::State => write!(f, "state"),
            Category::Event => write!(f, "event"),
        }
    }
}

/// Subject identifier, stored as an integer or as the raw string
///
/// Integer IDs are derived from the raw string by dropping every non-digit
/// character, so `m012` becomes `12`. The remaining digits must fit in a `u64`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectId {
    Int(u64),
    Text(String),
}

impl SubjectId {
    /// Build a subject ID from the raw info value
    pub fn from_raw(raw: &str, integer: bool) -> Result<Self> {
        if !integer {
            return Ok(SubjectId::Text(raw.to_string()));
        }

        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(LogError::InvalidSubjectId(raw.to_string()));
        }
        digits
            .parse::<u64>()
            .map(SubjectId::Int)
            .map_err(|_| LogError::SubjectIdOutOfRange(raw.to_string()))
    }

    /// Integer value, if this is an integer ID
    pub fn as_int(&self) -> Option<u64> {
        match self {
            SubjectId::Int(v) => Some(*v),
            SubjectId::Text(_) => None,
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Int(v) => write!(f, "{}", v),
            SubjectId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for SubjectId {
    fn from(value: u64) -> Self {
        SubjectId::Int(value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        SubjectId::Text(value.to_string())
    }
}

/// Errors that can occur while reading task logs
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("No '{0}' line found in log file")]
    MissingTable(char),

    #[error("Required info line '{0}' not found")]
    MissingInfo(&'static str),

    #[error("Malformed info line: {0:?}")]
    MalformedInfo(String),

    #[error("Malformed data line: {0:?}")]
    MalformedData(String),

    #[error("Malformed print line: {0:?}")]
    MalformedPrint(String),

    #[error("Invalid ID table: {0}")]
    InvalidIdTable(String),

    #[error("ID {0} is defined more than once")]
    DuplicateId(u32),

    #[error("Name '{0}' is defined more than once")]
    DuplicateName(String),

    #[error("Unknown state/event ID: {0}")]
    UnknownId(u32),

    #[error("Subject ID contains no digits: {0:?}")]
    InvalidSubjectId(String),

    #[error("Subject ID {0:?} is too large for an integer ID")]
    SubjectIdOutOfRange(String),

    #[error("Invalid start date {0:?}, expected YYYY/MM/DD HH:MM:SS")]
    InvalidDateTime(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Session cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unable to import file {file_name}: {source}")]
    Import {
        file_name: String,
        #[source]
        source: Box<LogError>,
    },
}

impl LogError {
    /// Attach the name of the file being imported
    pub fn in_file(self, file_name: impl Into<String>) -> Self {
        match self {
            already @ LogError::Import { .. } => already,
            other => LogError::Import {
                file_name: file_name.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Contract violations in session selection queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Start and end of a range must be the same type")]
    MismatchedRangeTypes,

    #[error("All elements of a selection must be the same type")]
    MixedTypes,

    #[error("Unsupported selection: {0}")]
    UnsupportedShape(String),

    #[error("Unable to convert {0:?} to a date, format must be YYYY-MM-DD")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_subject_id_strips_letters() {
        assert_eq!(SubjectId::from_raw("m007", true).unwrap(), SubjectId::Int(7));
        assert_eq!(SubjectId::from_raw("a1b2", true).unwrap(), SubjectId::Int(12));
    }

    #[test]
    fn test_integer_subject_id_without_digits() {
        let err = SubjectId::from_raw("mouse", true).unwrap_err();
        assert!(matches!(err, LogError::InvalidSubjectId(raw) if raw == "mouse"));
    }

    #[test]
    fn test_integer_subject_id_too_large() {
        let err = SubjectId::from_raw("m123456789012345678901234", true).unwrap_err();
        assert!(matches!(err, LogError::SubjectIdOutOfRange(raw) if raw == "m123456789012345678901234"));
        assert_eq!(
            SubjectId::from_raw("m18446744073709551615", true).unwrap(),
            SubjectId::Int(u64::MAX)
        );
    }

    #[test]
    fn test_string_subject_id_kept_verbatim() {
        let id = SubjectId::from_raw("m007", false).unwrap();
        assert_eq!(id, SubjectId::Text("m007".to_string()));
        assert_eq!(id.to_string(), "m007");
        assert_eq!(id.as_int(), None);
    }

    #[test]
    fn test_import_error_wraps_once() {
        let err = LogError::UnknownId(9).in_file("a.txt").in_file("b.txt");
        match err {
            LogError::Import { file_name, source } => {
                assert_eq!(file_name, "a.txt");
                assert!(matches!(*source, LogError::UnknownId(9)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::State.to_string(), "state");
        assert_eq!(Category::Event.to_string(), "event");
    }
}
