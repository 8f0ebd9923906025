//! Task log tokenizer
//!
//! A task log is line oriented text. Every non-blank line starts with a
//! one-character tag followed by a separator and the payload:
//!
//! | Tag | Payload                        |
//! |-----|--------------------------------|
//! | `I` | `<Key> : <Value>`              |
//! | `S` | mapping of state name to ID    |
//! | `E` | mapping of event name to ID    |
//! | `D` | `<timestamp_ms> <ID>`          |
//! | `P` | `<timestamp_ms> <text>`        |

use crate::types::{LogError, Millis, Result};
use std::path::Path;

/// One classified line of a task log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// Session information (`I`)
    Info(String),
    /// State name to ID table (`S`)
    StateIdTable(String),
    /// Event name to ID table (`E`)
    EventIdTable(String),
    /// Timestamped state entry or event (`D`)
    Data(String),
    /// Timestamped print statement (`P`)
    Print(String),
}

impl LogLine {
    /// The tag character this line was read from
    pub fn tag(&self) -> char {
        match self {
            LogLine::Info(_) => 'I',
            LogLine::StateIdTable(_) => 'S',
            LogLine::EventIdTable(_) => 'E',
            LogLine::Data(_) => 'D',
            LogLine::Print(_) => 'P',
        }
    }

    /// Line content after the tag and separator
    pub fn payload(&self) -> &str {
        match self {
            LogLine::Info(p)
            | LogLine::StateIdTable(p)
            | LogLine::EventIdTable(p)
            | LogLine::Data(p)
            | LogLine::Print(p) => p,
        }
    }
}

/// Split log content into classified lines
///
/// Blank lines are dropped and surrounding whitespace is trimmed. Lines with an
/// unrecognised tag are skipped.
pub fn tokenize(content: &str) -> Vec<LogLine> {
    let mut lines = Vec::new();

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let mut chars = line.chars();
        let tag = chars.next();
        chars.next(); // separator
        let payload = chars.as_str().to_string();

        let classified = match tag {
            Some('I') => LogLine::Info(payload),
            Some('S') => LogLine::StateIdTable(payload),
            Some('E') => LogLine::EventIdTable(payload),
            Some('D') => LogLine::Data(payload),
            Some('P') => LogLine::Print(payload),
            _ => {
                log::debug!("Skipping line {} with unknown tag: {:?}", line_no + 1, line);
                continue;
            }
        };
        lines.push(classified);
    }

    log::trace!("Tokenized {} log lines", lines.len());
    lines
}

/// Read a whole log file and tokenize it
///
/// Returns the file name (without directory) together with the lines.
pub fn read_log_file(path: &Path) -> Result<(String, Vec<LogLine>)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    log::info!("Importing data file: {}", file_name);

    let content = std::fs::read_to_string(path).map_err(|e| LogError::from(e).in_file(&file_name))?;

    Ok((file_name, tokenize(&content)))
}

/// Parse a `D` payload into `(timestamp, ID)`
pub fn parse_data(payload: &str) -> Result<(Millis, u32)> {
    let malformed = || LogError::MalformedData(payload.to_string());

    let mut tokens = payload.split_whitespace();
    let time = tokens.next().ok_or_else(malformed)?;
    let id = tokens.next().ok_or_else(malformed)?;
    if tokens.next().is_some() {
        return Err(malformed());
    }

    let time = time.parse::<Millis>().map_err(|_| malformed())?;
    let id = id.parse::<u32>().map_err(|_| malformed())?;
    Ok((time, id))
}

/// Parse a `P` payload into `(timestamp, text)`
///
/// The text is everything after the first space and may be empty.
pub fn parse_print(payload: &str) -> Result<(Millis, String)> {
    let (time, text) = payload.split_once(' ').unwrap_or((payload, ""));
    let time = time
        .parse::<Millis>()
        .map_err(|_| LogError::MalformedPrint(payload.to_string()))?;
    Ok((time, text.to_string()))
}

/// Split an `I` payload into `(name, value)`
pub fn split_info(payload: &str) -> Result<(&str, &str)> {
    payload
        .split_once(" : ")
        .ok_or_else(|| LogError::MalformedInfo(payload.to_string()))
}
