//! In-memory working set of locally known skills.
//!
//! Conflict resolution runs strictly one context at a time and mutates the
//! registry in place, so there is no locking here. If resolution is ever
//! parallelised this type needs an external guard.

use std::collections::HashMap;

use super::skill::SkillRecord;

/// Ordered collection of skill records keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<SkillRecord>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records; a later duplicate name replaces the
    /// earlier entry in place.
    #[must_use]
    pub fn from_records(records: Vec<SkillRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.upsert(record);
        }
        registry
    }

    /// Get skill by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Insert `record`, replacing any entry with the same name. Returns the
    /// previous record when one was replaced.
    pub fn upsert(&mut self, record: SkillRecord) -> Option<SkillRecord> {
        if let Some(&idx) = self.by_name.get(&record.name) {
            Some(std::mem::replace(&mut self.entries[idx], record))
        } else {
            self.by_name.insert(record.name.clone(), self.entries.len());
            self.entries.push(record);
            None
        }
    }

    /// Replace the entry stored under `target` with `record`, keeping its
    /// position. `record` is stored under `target` regardless of its own name.
    pub fn replace(&mut self, target: &str, mut record: SkillRecord) -> Option<SkillRecord> {
        record.name = target.to_string();
        self.upsert(record)
    }

    /// List all skills in insertion order
    #[must_use]
    pub fn records(&self) -> &[SkillRecord] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
