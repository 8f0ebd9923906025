//! Session import
//!
//! A [`Session`] is one run of a task for one subject, built from a single log
//! file. Apart from the session number, which the owning
//! [`Experiment`](crate::Experiment) assigns, a session is read-only once
//! built.

use crate::config::ImportConfig;
use crate::formats::{parse_data, read_log_file, tokenize, LogLine};
use crate::ids::IdTable;
use crate::types::{LogError, Millis, Occurrence, Result, SubjectId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Format of the `Start date` info value
pub const LOG_DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Format of [`Session::datetime_string`]
pub const DATETIME_STRING_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EXPERIMENT_NAME: &str = "Experiment name";
const TASK_NAME: &str = "Task name";
const SUBJECT_ID: &str = "Subject ID";
const START_DATE: &str = "Start date";

/// One imported session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// File name the session was read from (no directory)
    pub file_name: String,
    pub experiment_name: String,
    pub task_name: String,
    pub subject_id: SubjectId,
    /// Date and time the session started
    pub datetime: NaiveDateTime,
    /// Start time formatted as `YYYY-MM-DD HH:MM:SS`
    pub datetime_string: String,
    /// State entries and events in file order
    pub occurrences: Vec<Occurrence>,
    /// Key: state/event name, Value: times of its occurrences in file order
    ///
    /// Every name of the ID table has an entry, empty if it never occurred.
    pub times_by_name: BTreeMap<String, Vec<Millis>>,
    /// Print lines, each starting with its timestamp
    pub print_lines: Vec<String>,
    /// Position of this session among the subject's sessions, 1-based
    number: Option<u32>,
}

impl Session {
    /// Import a session from a log file
    pub fn from_file(path: &Path, config: &ImportConfig) -> Result<Self> {
        let (file_name, lines) = read_log_file(path)?;
        Self::from_lines(&file_name, &lines, config).map_err(|e| e.in_file(&file_name))
    }

    /// Import a session from log content already in memory
    pub fn parse(file_name: &str, content: &str, config: &ImportConfig) -> Result<Self> {
        Self::from_lines(file_name, &tokenize(content), config)
    }

    /// Build a session from tokenized log lines
    pub fn from_lines(file_name: &str, lines: &[LogLine], config: &ImportConfig) -> Result<Self> {
        let info: Vec<&str> = lines
            .iter()
            .filter_map(|line| match line {
                LogLine::Info(payload) => Some(payload.as_str()),
                _ => None,
            })
            .collect();

        let experiment_name = info_value(&info, EXPERIMENT_NAME)?.to_string();
        let task_name = info_value(&info, TASK_NAME)?.to_string();
        let subject_id = SubjectId::from_raw(info_value(&info, SUBJECT_ID)?, config.integer_subject_ids)?;

        let raw_datetime = info_value(&info, START_DATE)?;
        let datetime = NaiveDateTime::parse_from_str(raw_datetime, LOG_DATETIME_FORMAT)
            .map_err(|_| LogError::InvalidDateTime(raw_datetime.to_string()))?;

        let id_table = IdTable::from_log_lines(lines)?;

        let mut occurrences = Vec::new();
        let mut print_lines = Vec::new();
        for line in lines {
            match line {
                LogLine::Data(payload) => {
                    let (time, id) = parse_data(payload)?;
                    let entry = id_table.resolve(id)?;
                    occurrences.push(Occurrence::new(time, entry.name.clone()));
                }
                LogLine::Print(payload) => print_lines.push(payload.clone()),
                _ => {}
            }
        }

        let times_by_name = index_times(&id_table, &occurrences);

        log::debug!(
            "Imported session {}: subject {}, {} occurrences, {} print lines",
            file_name,
            subject_id,
            occurrences.len(),
            print_lines.len()
        );

        Ok(Session {
            file_name: file_name.to_string(),
            experiment_name,
            task_name,
            subject_id,
            datetime,
            datetime_string: datetime.format(DATETIME_STRING_FORMAT).to_string(),
            occurrences,
            times_by_name,
            print_lines,
            number: None,
        })
    }

    /// Session number within the subject, once assigned by an experiment
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = Some(number);
    }

    /// Calendar date the session started
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Times of every occurrence of a state or event
    ///
    /// Returns an empty slice for names that are not in the session's ID table.
    pub fn times(&self, name: &str) -> &[Millis] {
        self.times_by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occurrences with the given name, in order
    pub fn occurrences_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Occurrence> + 'a {
        self.occurrences.iter().filter(move |o| o.name == name)
    }

    /// Time of the last occurrence, zero for an empty session
    pub fn duration_ms(&self) -> Millis {
        self.occurrences.last().map(|o| o.time).unwrap_or(0)
    }
}

/// Value of the first info line containing `key`
fn info_value<'a>(info: &[&'a str], key: &'static str) -> Result<&'a str> {
    let line: &'a str = info
        .iter()
        .copied()
        .find(|line| line.contains(key))
        .ok_or(LogError::MissingInfo(key))?;

    line.split(" : ")
        .nth(1)
        .ok_or_else(|| LogError::MalformedInfo(line.to_string()))
}

fn index_times(id_table: &IdTable, occurrences: &[Occurrence]) -> BTreeMap<String, Vec<Millis>> {
    let mut times: BTreeMap<String, Vec<Millis>> =
        id_table.names().map(|name| (name.to_string(), Vec::new())).collect();

    for occurrence in occurrences {
        if let Some(list) = times.get_mut(&occurrence.name) {
            list.push(occurrence.time);
        }
    }
    times
}
