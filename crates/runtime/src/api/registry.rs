//! Name-to-identity resolution for competitors.
//!
//! Callers request bouts by display name; the ledger only knows
//! [`CompetitorId`]s. Lookups are case-insensitive and ignore surrounding
//! whitespace.

use std::collections::HashMap;

use fight_core::CompetitorId;

#[derive(Clone, Debug)]
struct Entry {
    name: String,
    id: CompetitorId,
}

/// Registered competitors, keyed by normalized name.
#[derive(Clone, Debug, Default)]
pub struct CompetitorRegistry {
    by_name: HashMap<String, Entry>,
}

impl CompetitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as `id`, replacing any previous binding for the name.
    pub fn register(&mut self, name: impl Into<String>, id: CompetitorId) {
        let name = name.into().trim().to_owned();
        self.by_name.insert(normalize(&name), Entry { name, id });
    }

    pub fn with(mut self, name: impl Into<String>, id: CompetitorId) -> Self {
        self.register(name, id);
        self
    }

    /// Canonical display name and identity for `name`.
    pub fn resolve(&self, name: &str) -> Option<(&str, &CompetitorId)> {
        self.by_name
            .get(&normalize(name))
            .map(|entry| (entry.name.as_str(), &entry.id))
    }

    pub fn name_of(&self, id: &CompetitorId) -> Option<&str> {
        self.by_name
            .values()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.name.as_str())
    }

    /// All registered display names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.values().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
