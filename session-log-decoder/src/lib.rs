//! Session Log Decoder Library
//!
//! A reusable library for importing the data files written by behavioural
//! experiment task runs and turning them into session and experiment records.
//!
//! # Architecture
//!
//! - Tokenizes line-oriented task logs (info, state/event ID tables, data and
//!   print lines)
//! - Resolves numeric state/event IDs through a strictly parsed ID table
//! - Builds immutable [`Session`] records with occurrence timelines
//! - Collects a folder of sessions into an [`Experiment`], with a session cache
//!   and per-subject session numbering
//! - Projects sessions and experiments into flat tables with state and
//!   paired-event durations
//!
//! The library does NOT:
//! - Talk to acquisition hardware or decode live data streams
//! - Run statistics or plot anything
//!
//! # Example Usage
//!
//! ```no_run
//! use session_log_decoder::{Experiment, ImportConfig, SubjectSelector, When};
//! use std::path::Path;
//!
//! let config = ImportConfig::new().with_integer_subject_ids(true);
//! let experiment = Experiment::open(Path::new("data/reversal_learning"), &config).unwrap();
//!
//! // First five sessions of every subject
//! let when: When = "...,5".parse().unwrap();
//! for session in experiment.get_sessions(&SubjectSelector::All, &when) {
//!     println!("{} #{:?}: {}", session.subject_id, session.number(), session.datetime_string);
//! }
//!
//! experiment.save().unwrap();
//! ```

// Public modules
pub mod config;
pub mod experiment;
pub mod formats;
pub mod ids;
pub mod query;
pub mod session;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use config::ImportConfig;
pub use experiment::{Experiment, ImportFailure};
pub use formats::{load_analog_data, AnalogSample, LogLine};
pub use ids::IdTable;
pub use query::{SubjectSelector, When, WhenItem};
pub use session::Session;
pub use table::{ExperimentRow, ExperimentTable, PairingConfig, Row, RowType, SessionTable, COLUMNS};
pub use types::{Category, LogError, Millis, Occurrence, QueryError, Result, SubjectId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
