//! Experiment import
//!
//! An [`Experiment`] is every session found in one data folder. Sessions that
//! were saved to the folder's cache file are reused, and only data files not in
//! the cache are parsed. After import, sessions are ordered by start time and
//! numbered per subject.

use crate::config::ImportConfig;
use crate::query::{SubjectSelector, When};
use crate::session::Session;
use crate::types::{LogError, Result, SubjectId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Version of the cache file layout
const CACHE_FORMAT_VERSION: u32 = 1;

/// On-disk layout of the session cache
#[derive(Serialize, Deserialize)]
struct SessionCache {
    version: u32,
    sessions: Vec<Session>,
}

/// A data file that could not be imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// File name within the experiment folder
    pub file_name: String,
    /// Description of the underlying error
    pub reason: String,
}

/// All sessions of one experiment folder
#[derive(Debug, Clone)]
pub struct Experiment {
    folder_name: String,
    path: PathBuf,
    config: ImportConfig,
    sessions: Vec<Session>,
    subject_ids: Vec<SubjectId>,
    sessions_per_subject: BTreeMap<SubjectId, u32>,
    new_files_imported: usize,
    import_failures: Vec<ImportFailure>,
}

impl Experiment {
    /// Import all sessions from a folder
    ///
    /// Only files directly inside the folder with the configured data
    /// extension are considered. Files that fail to parse are skipped and
    /// reported through [`Experiment::import_failures`].
    pub fn open(folder: &Path, config: &ImportConfig) -> Result<Self> {
        let folder_name = folder
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let cache_path = folder.join(&config.cache_file_name);
        let mut sessions = match load_cache(&cache_path) {
            Ok(sessions) => {
                log::info!("Saved sessions loaded from: {}", config.cache_file_name);
                sessions
            }
            Err(LogError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::warn!("Ignoring session cache {:?}: {}", cache_path, e);
                Vec::new()
            }
        };

        let cached: HashSet<&str> = sessions.iter().map(|s| s.file_name.as_str()).collect();
        let new_files = list_data_files(folder, config)?
            .into_iter()
            .filter(|name| !cached.contains(name.as_str()))
            .collect::<Vec<_>>();

        let mut import_failures = Vec::new();
        let new_files_imported = new_files.len();

        if !new_files.is_empty() {
            log::info!("Loading {} new data files", new_files.len());

            let parse = |name: &String| (name.clone(), Session::from_file(&folder.join(name), config));
            let results: Vec<(String, Result<Session>)> = if config.parallel {
                new_files.par_iter().map(parse).collect()
            } else {
                new_files.iter().map(parse).collect()
            };

            for (file_name, result) in results {
                match result {
                    Ok(session) => sessions.push(session),
                    Err(e) => {
                        log::warn!("{}", e);
                        import_failures.push(ImportFailure {
                            file_name,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let mut experiment = Experiment {
            folder_name,
            path: folder.to_path_buf(),
            config: config.clone(),
            sessions,
            subject_ids: Vec::new(),
            sessions_per_subject: BTreeMap::new(),
            new_files_imported,
            import_failures,
        };
        experiment.number_sessions();

        log::info!(
            "Experiment {}: {} sessions from {} subjects",
            experiment.folder_name,
            experiment.sessions.len(),
            experiment.subject_ids.len()
        );
        Ok(experiment)
    }

    /// Order sessions by start time and number them within each subject
    fn number_sessions(&mut self) {
        self.sessions
            .sort_by_cached_key(|s| (s.datetime_string.clone(), s.subject_id.to_string()));

        let mut counts: BTreeMap<SubjectId, u32> = BTreeMap::new();
        for session in &mut self.sessions {
            let count = counts.entry(session.subject_id.clone()).or_insert(0);
            *count += 1;
            session.set_number(*count);
        }

        self.subject_ids = counts.keys().cloned().collect();
        self.sessions_per_subject = counts;
    }

    /// Write all sessions to the folder's cache file
    ///
    /// Later calls to [`Experiment::open`] on the same folder only parse data
    /// files that are not in the cache.
    pub fn save(&self) -> Result<()> {
        let cache = SessionCache {
            version: CACHE_FORMAT_VERSION,
            sessions: self.sessions.clone(),
        };
        let bytes = bincode::serialize(&cache).map_err(|e| LogError::Cache(e.to_string()))?;
        std::fs::write(self.cache_path(), bytes)?;

        log::info!(
            "Saved {} sessions to {:?}",
            self.sessions.len(),
            self.cache_path()
        );
        Ok(())
    }

    /// Sessions matching a subject selection and a `when` criterion
    ///
    /// Sessions are returned in experiment order (by start time).
    pub fn get_sessions(&self, subjects: &SubjectSelector, when: &When) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| subjects.contains(&s.subject_id) && when.matches(s))
            .collect()
    }

    /// All sessions of one subject in session-number order
    pub fn subject_sessions(&self, subject_id: &SubjectId) -> Vec<&Session> {
        self.get_sessions(&SubjectSelector::from(subject_id.clone()), &When::All)
    }

    /// Name of the experiment folder
    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    /// Path of the experiment folder
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the session cache file
    pub fn cache_path(&self) -> PathBuf {
        self.path.join(&self.config.cache_file_name)
    }

    /// All sessions ordered by start time
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Distinct subject IDs in ascending order
    pub fn subject_ids(&self) -> &[SubjectId] {
        &self.subject_ids
    }

    pub fn n_subjects(&self) -> usize {
        self.subject_ids.len()
    }

    /// Key: subject ID, Value: number of that subject's sessions
    pub fn sessions_per_subject(&self) -> &BTreeMap<SubjectId, u32> {
        &self.sessions_per_subject
    }

    /// Number of data files parsed because they were not in the cache
    pub fn new_files_imported(&self) -> usize {
        self.new_files_imported
    }

    /// Data files that could not be imported
    pub fn import_failures(&self) -> &[ImportFailure] {
        &self.import_failures
    }
}

/// Data file names directly inside `folder`, sorted
pub(crate) fn list_data_files(folder: &Path, config: &ImportConfig) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if config.is_data_file(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn load_cache(path: &Path) -> Result<Vec<Session>> {
    let bytes = std::fs::read(path)?;
    let cache: SessionCache =
        bincode::deserialize(&bytes).map_err(|e| LogError::Cache(e.to_string()))?;

    if cache.version != CACHE_FORMAT_VERSION {
        return Err(LogError::Cache(format!(
            "unsupported cache version {}",
            cache.version
        )));
    }
    Ok(cache.sessions)
}
