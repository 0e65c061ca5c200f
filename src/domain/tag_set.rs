//! Normalized tag-name sets.
//!
//! A `TagSet` holds the tags of one entity instance as two snapshots: the
//! user-facing `current` set and the `baseline` last known to be persisted.
//! Names are trimmed, case-sensitive, never empty, and unique within a set.
//! Order is first-occurrence order; comparisons between snapshots are set-based.

use std::collections::HashSet;
use std::fmt;

/// Trim, drop empty entries and deduplicate while keeping first-occurrence order.
pub fn normalize_tag_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();

    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }

    normalized
}

/// Split a comma-separated tag list (`"php, yii ,rust"`) into normalized names.
pub fn parse_tag_list(list: &str) -> Vec<String> {
    normalize_tag_names(list.split(','))
}

/// Tags that differ between the current set and the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    current: Vec<String>,
    /// `None` until the persisted state has been loaded or written.
    baseline: Option<Vec<String>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set whose current and baseline snapshots both equal the loaded names.
    pub fn from_persisted<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = normalize_tag_names(names);
        Self {
            baseline: Some(names.clone()),
            current: names,
        }
    }

    pub fn current(&self) -> &[String] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// True iff every (trimmed, non-empty) requested name is in the current set.
    pub fn contains_all<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        normalize_tag_names(names)
            .iter()
            .all(|name| self.current.contains(name))
    }

    /// Replace the current set wholesale.
    pub fn replace<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.current = normalize_tag_names(names);
    }

    /// Union the given names into the current set.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in normalize_tag_names(names) {
            if !self.current.contains(&name) {
                self.current.push(name);
            }
        }
    }

    /// Subtract the given names from the current set.
    pub fn remove<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed: HashSet<String> = normalize_tag_names(names).into_iter().collect();
        self.current.retain(|tag| !removed.contains(tag));
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }

    /// Symmetric difference against the baseline. With no baseline every
    /// current tag counts as added.
    pub fn diff(&self) -> TagDiff {
        let empty = Vec::new();
        let baseline = self.baseline.as_ref().unwrap_or(&empty);

        TagDiff {
            added: self
                .current
                .iter()
                .filter(|tag| !baseline.contains(tag))
                .cloned()
                .collect(),
            removed: baseline
                .iter()
                .filter(|tag| !self.current.contains(tag))
                .cloned()
                .collect(),
        }
    }

    /// Whether a save has anything to write.
    ///
    /// An unknown baseline on a stored entity may hide bindings, so it is
    /// always treated as dirty; a new entity has no bindings to hide.
    pub fn needs_save(&self, is_new_record: bool) -> bool {
        match &self.baseline {
            Some(_) => !self.diff().is_empty(),
            None => !is_new_record || !self.current.is_empty(),
        }
    }

    /// Record the current set as persisted.
    pub fn mark_persisted(&mut self) {
        self.baseline = Some(self.current.clone());
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.current.join(", "))
    }
}
