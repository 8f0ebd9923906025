//! Unified state/event ID table
//!
//! Combines the state and event mappings of one log into a single lookup from
//! ID to name, remembering which space each ID came from.

use crate::formats::LogLine;
use crate::ids::literal::parse_id_mapping;
use crate::types::{Category, LogError, Result};
use std::collections::HashMap;

/// One entry of the ID table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdEntry {
    /// Numeric ID written in `D` lines
    pub id: u32,
    /// State or event name
    pub name: String,
    /// Which table the ID was defined in
    pub category: Category,
}

/// Immutable ID lookup for one session
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    /// Entries in definition order: states first, then events
    entries: Vec<IdEntry>,

    /// Key: ID, Value: index into `entries`
    by_id: HashMap<u32, usize>,

    /// Key: name, Value: index into `entries`
    by_name: HashMap<String, usize>,
}

impl IdTable {
    /// Build the table from parsed state and event mappings
    ///
    /// IDs must be unique across both mappings and a name may not appear in
    /// both.
    pub fn from_tables(states: Vec<(String, u32)>, events: Vec<(String, u32)>) -> Result<Self> {
        let mut table = IdTable::default();

        let tagged = states
            .into_iter()
            .map(|(name, id)| (name, id, Category::State))
            .chain(events.into_iter().map(|(name, id)| (name, id, Category::Event)));

        for (name, id, category) in tagged {
            if table.by_id.contains_key(&id) {
                return Err(LogError::DuplicateId(id));
            }
            if table.by_name.contains_key(&name) {
                return Err(LogError::DuplicateName(name));
            }

            let idx = table.entries.len();
            table.by_id.insert(id, idx);
            table.by_name.insert(name.clone(), idx);
            table.entries.push(IdEntry { id, name, category });
        }

        Ok(table)
    }

    /// Build the table from the first `S` and first `E` line of a log
    pub fn from_log_lines(lines: &[LogLine]) -> Result<Self> {
        let states = lines
            .iter()
            .find_map(|line| match line {
                LogLine::StateIdTable(payload) => Some(payload.as_str()),
                _ => None,
            })
            .ok_or(LogError::MissingTable('S'))?;

        let events = lines
            .iter()
            .find_map(|line| match line {
                LogLine::EventIdTable(payload) => Some(payload.as_str()),
                _ => None,
            })
            .ok_or(LogError::MissingTable('E'))?;

        Self::from_tables(parse_id_mapping(states)?, parse_id_mapping(events)?)
    }

    /// Name for an ID
    pub fn name(&self, id: u32) -> Option<&str> {
        self.entry(id).map(|e| e.name.as_str())
    }

    /// Category for an ID
    pub fn category(&self, id: u32) -> Option<Category> {
        self.entry(id).map(|e| e.category)
    }

    /// ID for a name
    pub fn id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).map(|&idx| self.entries[idx].id)
    }

    /// Resolve an ID to its entry, failing for IDs not in the table
    pub fn resolve(&self, id: u32) -> Result<&IdEntry> {
        self.entry(id).ok_or(LogError::UnknownId(id))
    }

    /// True if the name belongs to the state table
    pub fn is_state(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .map(|&idx| self.entries[idx].category == Category::State)
            .unwrap_or(false)
    }

    /// All names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// State names in definition order
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.names_in(Category::State)
    }

    /// Event names in definition order
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.names_in(Category::Event)
    }

    /// All entries in definition order
    pub fn entries(&self) -> &[IdEntry] {
        &self.entries
    }

    /// Number of IDs in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if neither table defined any IDs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: u32) -> Option<&IdEntry> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    fn names_in(&self, category: Category) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |e| e.category == category)
            .map(|e| e.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tokenize;

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(n, i)| (n.to_string(), *i)).collect()
    }

    #[test]
    fn test_lookup_and_category() {
        let table = IdTable::from_tables(
            pairs(&[("init", 1), ("reward", 2)]),
            pairs(&[("poke_in", 3), ("poke_out", 4)]),
        )
        .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.name(3), Some("poke_in"));
        assert_eq!(table.category(2), Some(Category::State));
        assert_eq!(table.category(4), Some(Category::Event));
        assert_eq!(table.id("reward"), Some(2));
        assert!(table.is_state("init"));
        assert!(!table.is_state("poke_in"));
        assert_eq!(table.name(9), None);
        assert!(matches!(table.resolve(9), Err(LogError::UnknownId(9))));
    }

    #[test]
    fn test_name_order() {
        let table = IdTable::from_tables(
            pairs(&[("b_state", 2), ("a_state", 1)]),
            pairs(&[("z_event", 3)]),
        )
        .unwrap();

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b_state", "a_state", "z_event"]);
        assert_eq!(table.state_names().collect::<Vec<_>>(), vec!["b_state", "a_state"]);
        assert_eq!(table.event_names().collect::<Vec<_>>(), vec!["z_event"]);
    }

    #[test]
    fn test_duplicate_id_across_tables() {
        let result = IdTable::from_tables(pairs(&[("init", 1)]), pairs(&[("go", 1)]));
        assert!(matches!(result, Err(LogError::DuplicateId(1))));
    }

    #[test]
    fn test_name_in_both_tables() {
        let result = IdTable::from_tables(pairs(&[("go", 1)]), pairs(&[("go", 2)]));
        assert!(matches!(result, Err(LogError::DuplicateName(name)) if name == "go"));
    }

    #[test]
    fn test_from_log_lines() {
        let lines = tokenize("S {'init': 1}\nE {'go': 2}\nS {'ignored': 9}\n");
        let table = IdTable::from_log_lines(&lines).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.name(9), None);
    }

    #[test]
    fn test_missing_tables() {
        let no_states = tokenize("E {'go': 2}\n");
        assert!(matches!(
            IdTable::from_log_lines(&no_states),
            Err(LogError::MissingTable('S'))
        ));

        let no_events = tokenize("S {'init': 1}\n");
        assert!(matches!(
            IdTable::from_log_lines(&no_events),
            Err(LogError::MissingTable('E'))
        ));
    }
}
