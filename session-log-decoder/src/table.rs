//! Tabular projection of sessions
//!
//! Turns a log into one row per info line, state entry, event and print line,
//! with durations for states and for paired events. An experiment table
//! concatenates the session tables of a folder and turns each session's info
//! rows into columns.
//!
//! Paired events describe the start and end of one action, e.g. entering and
//! leaving a nose poke. When a start event is followed by its end event, only
//! the start produces a row and the end is used to compute its duration.

use crate::config::ImportConfig;
use crate::experiment::{list_data_files, ImportFailure};
use crate::formats::{parse_data, parse_print, read_log_file, split_info, tokenize, LogLine};
use crate::ids::IdTable;
use crate::types::{Category, LogError, Millis, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Column names of a session table, in order
pub const COLUMNS: [&str; 5] = ["type", "name", "time", "duration", "value"];

/// Kind of a table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Info,
    State,
    Event,
    Print,
}

impl From<Category> for RowType {
    fn from(category: Category) -> Self {
        match category {
            Category::State => RowType::State,
            Category::Event => RowType::Event,
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowType::Info => write!(f, "info"),
            RowType::State => write!(f, "state"),
            RowType::Event => write!(f, "event"),
            RowType::Print => write!(f, "print"),
        }
    }
}

/// One row of a session table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "type")]
    pub row_type: RowType,
    /// State, event or info name
    pub name: Option<String>,
    /// Milliseconds since session start (not set for info rows)
    pub time: Option<Millis>,
    /// Duration of a state or paired event
    pub duration: Option<Millis>,
    /// Info value or print text
    pub value: Option<String>,
}

impl Row {
    fn info(name: &str, value: &str) -> Self {
        Row {
            row_type: RowType::Info,
            name: Some(name.to_string()),
            time: None,
            duration: None,
            value: Some(value.to_string()),
        }
    }

    fn occurrence(category: Category, name: &str, time: Millis) -> Self {
        Row {
            row_type: category.into(),
            name: Some(name.to_string()),
            time: Some(time),
            duration: None,
            value: None,
        }
    }

    fn print(time: Millis, text: String) -> Self {
        Row {
            row_type: RowType::Print,
            name: None,
            time: Some(time),
            duration: None,
            value: Some(text),
        }
    }

    /// Cell values in [`COLUMNS`] order, `None` for empty cells
    pub fn cells(&self) -> [Option<String>; 5] {
        [
            Some(self.row_type.to_string()),
            self.name.clone(),
            self.time.map(|t| t.to_string()),
            self.duration.map(|d| d.to_string()),
            self.value.clone(),
        ]
    }

    /// True for state and event rows
    pub fn is_occurrence(&self) -> bool {
        matches!(self.row_type, RowType::State | RowType::Event)
    }
}

/// Configuration of paired start/end events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Key: start event name, Value: end event name
    #[serde(default)]
    pub paired_events: BTreeMap<String, String>,

    /// Suffix marking end events whose start event shares the same stem,
    /// e.g. `_out` pairs `poke_out` with `poke_in`
    #[serde(default)]
    pub pair_end_suffix: Option<String>,
}

impl PairingConfig {
    /// Create an empty pairing configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add an explicit start/end pair
    pub fn with_pair(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.paired_events.insert(start.into(), end.into());
        self
    }

    /// Builder method: set the end-event suffix
    pub fn with_end_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.pair_end_suffix = Some(suffix.into());
        self
    }

    /// Explicit pairs plus pairs discovered from the event names
    ///
    /// For every event ending in the suffix, the first other event (in ID table
    /// order) starting with the same stem becomes its start event. Explicit
    /// pairs are never replaced by discovered ones.
    pub fn resolve(&self, id_table: &IdTable) -> BTreeMap<String, String> {
        let mut pairs = self.paired_events.clone();

        let suffix = match self.pair_end_suffix.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return pairs,
        };

        for end_event in id_table.event_names().filter(|ev| ev.ends_with(suffix)) {
            let stem = &end_event[..end_event.len() - suffix.len()];
            if stem.is_empty() {
                continue;
            }

            let start_event = id_table
                .event_names()
                .find(|ev| ev.starts_with(stem) && *ev != end_event);

            match start_event {
                Some(start) if pairs.contains_key(start) => {
                    log::debug!("Keeping explicit pair for '{}', ignoring '{}'", start, end_event);
                }
                Some(start) => {
                    pairs.insert(start.to_string(), end_event.to_string());
                }
                None => log::trace!("No start event found for '{}'", end_event),
            }
        }

        pairs
    }
}

/// Rows of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTable {
    /// File the session was read from
    pub file_name: String,
    pub rows: Vec<Row>,
}

impl SessionTable {
    /// Build the table for a log file
    pub fn from_file(path: &Path, pairing: &PairingConfig) -> Result<Self> {
        let (file_name, lines) = read_log_file(path)?;
        Self::from_lines(&file_name, &lines, pairing).map_err(|e| e.in_file(&file_name))
    }

    /// Build the table for log content already in memory
    pub fn parse(file_name: &str, content: &str, pairing: &PairingConfig) -> Result<Self> {
        Self::from_lines(file_name, &tokenize(content), pairing)
    }

    /// Build the table from tokenized log lines
    pub fn from_lines(file_name: &str, lines: &[LogLine], pairing: &PairingConfig) -> Result<Self> {
        let id_table = IdTable::from_log_lines(lines)?;

        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            match line {
                LogLine::Info(payload) => {
                    let (name, value) = split_info(payload)?;
                    rows.push(Row::info(name, value));
                }
                LogLine::Data(payload) => {
                    let (time, id) = parse_data(payload)?;
                    let entry = id_table.resolve(id)?;
                    rows.push(Row::occurrence(entry.category, &entry.name, time));
                }
                LogLine::Print(payload) => {
                    let (time, text) = parse_print(payload)?;
                    rows.push(Row::print(time, text));
                }
                LogLine::StateIdTable(_) | LogLine::EventIdTable(_) => {}
            }
        }

        add_state_durations(&mut rows)?;

        let pairs = pairing.resolve(&id_table);
        if !pairs.is_empty() {
            pair_events(&mut rows, &pairs)?;
        }

        Ok(SessionTable {
            file_name: file_name.to_string(),
            rows,
        })
    }

    /// Info rows as `(name, value)`
    pub fn info(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().filter_map(|row| match (row.row_type, &row.name, &row.value) {
            (RowType::Info, Some(name), Some(value)) => Some((name.as_str(), value.as_str())),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Set each state's duration to the time until the next state entry
///
/// The last state of the session has no duration.
fn add_state_durations(rows: &mut [Row]) -> Result<()> {
    let states: Vec<(usize, Millis)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match (row.row_type, row.time) {
            (RowType::State, Some(time)) => Some((i, time)),
            _ => None,
        })
        .collect();

    for pair in states.windows(2) {
        let ((idx, time), (_, next_time)) = (pair[0], pair[1]);
        rows[idx].duration = Some(duration(time, next_time)?);
    }
    Ok(())
}

/// Milliseconds from `start` to `end`, failing if the difference overflows
fn duration(start: Millis, end: Millis) -> Result<Millis> {
    end.checked_sub(start).ok_or_else(|| {
        LogError::MalformedData(format!("duration from {} to {} is out of range", start, end))
    })
}

/// Give paired start rows a duration and drop the matched end rows
///
/// A start row stays pending until the next end row of its pair. A second start
/// before that end replaces the pending one, which is left without a duration.
/// End rows with no pending start are kept unchanged.
fn pair_events(rows: &mut Vec<Row>, pairs: &BTreeMap<String, String>) -> Result<()> {
    let end_to_start: HashMap<&str, &str> = pairs
        .iter()
        .map(|(start, end)| (end.as_str(), start.as_str()))
        .collect();
    let mut pending: HashMap<&str, Option<(Millis, usize)>> =
        pairs.keys().map(|start| (start.as_str(), None)).collect();
    let mut matched_ends = HashSet::new();

    for i in 0..rows.len() {
        let (name, time) = match &rows[i] {
            Row {
                row_type: RowType::State | RowType::Event,
                name: Some(name),
                time: Some(time),
                ..
            } => (name.as_str(), *time),
            _ => continue,
        };

        if let Some((start, _)) = pairs.get_key_value(name) {
            pending.insert(start.as_str(), Some((time, i)));
        } else if let Some(&start) = end_to_start.get(name) {
            if let Some((start_time, start_idx)) = pending.get_mut(start).and_then(Option::take) {
                rows[start_idx].duration = Some(duration(start_time, time)?);
                matched_ends.insert(i);
            }
        }
    }

    let mut idx = 0;
    rows.retain(|_| {
        let keep = !matched_ends.contains(&idx);
        idx += 1;
        keep
    });
    Ok(())
}

/// One row of an experiment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRow {
    #[serde(flatten)]
    pub row: Row,
    /// Values of the table's info columns for this row's session
    pub info: Vec<Option<String>>,
}

/// Session tables of an experiment with info rows promoted to columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentTable {
    /// Info column names in first-seen order
    pub info_columns: Vec<String>,
    pub rows: Vec<ExperimentRow>,
    #[serde(skip)]
    skipped_files: Vec<ImportFailure>,
}

impl ExperimentTable {
    /// Build the table for every data file in a folder
    ///
    /// Files that cannot be read are skipped with a warning and reported
    /// through [`ExperimentTable::skipped_files`].
    pub fn from_folder(folder: &Path, config: &ImportConfig, pairing: &PairingConfig) -> Result<Self> {
        let files = list_data_files(folder, config)?;

        let build = |name: &String| (name.clone(), SessionTable::from_file(&folder.join(name), pairing));
        let results: Vec<(String, Result<SessionTable>)> = if config.parallel {
            files.par_iter().map(build).collect()
        } else {
            files.iter().map(build).collect()
        };

        let mut tables = Vec::with_capacity(results.len());
        let mut skipped_files = Vec::new();
        for (file_name, result) in results {
            match result {
                Ok(table) => tables.push(table),
                Err(e) => {
                    log::warn!("{}", e);
                    skipped_files.push(ImportFailure {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut table = Self::from_session_tables(tables);
        table.skipped_files = skipped_files;
        Ok(table)
    }

    /// Concatenate session tables, promoting info rows to columns
    ///
    /// Sessions without a given info name have `None` in that column. If a
    /// session repeats an info name, its last value is used.
    pub fn from_session_tables(tables: Vec<SessionTable>) -> Self {
        let mut info_columns: Vec<String> = Vec::new();
        for table in &tables {
            for (name, _) in table.info() {
                if !info_columns.iter().any(|c| c == name) {
                    info_columns.push(name.to_string());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let info: HashMap<&str, &str> = table.info().collect();
            let values: Vec<Option<String>> = info_columns
                .iter()
                .map(|column| info.get(column.as_str()).map(|v| v.to_string()))
                .collect();

            for row in table.rows.iter().filter(|r| r.row_type != RowType::Info) {
                rows.push(ExperimentRow {
                    row: row.clone(),
                    info: values.clone(),
                });
            }
        }

        ExperimentTable {
            info_columns,
            rows,
            skipped_files: Vec::new(),
        }
    }

    /// All column names: [`COLUMNS`] followed by the info columns
    pub fn columns(&self) -> Vec<&str> {
        COLUMNS
            .iter()
            .copied()
            .chain(self.info_columns.iter().map(String::as_str))
            .collect()
    }

    /// Value of an info column for a row
    pub fn info_value<'a>(&self, row: &'a ExperimentRow, column: &str) -> Option<&'a str> {
        self.info_columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| row.info.get(idx))
            .and_then(|v| v.as_deref())
    }

    /// Data files left out of the table because they failed to parse
    pub fn skipped_files(&self) -> &[ImportFailure] {
        &self.skipped_files
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
