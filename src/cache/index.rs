//! Index descriptors and the slot tables behind them.

use std::collections::HashMap;

/// Separator placed between the parts of a composite key.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// A named, statically typed key extractor over cached values.
///
/// Unique indices (`multi == false`) identify at most one live entry, while
/// multi indices group every entry sharing the extracted key.
pub struct Index<V> {
    name: &'static str,
    multi: bool,
    extract: fn(&V) -> Option<String>,
}

impl<V> Index<V> {
    pub const fn unique(name: &'static str, extract: fn(&V) -> Option<String>) -> Self {
        Self {
            name,
            multi: false,
            extract,
        }
    }

    pub const fn multi(name: &'static str, extract: fn(&V) -> Option<String>) -> Self {
        Self {
            name,
            multi: true,
            extract,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn key_of(&self, value: &V) -> Option<String> {
        (self.extract)(value)
    }
}

impl<V> Clone for Index<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Index<V> {}

impl<V> std::fmt::Debug for Index<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("multi", &self.multi)
            .finish()
    }
}

/// Key for a single field; empty fields are not indexed.
pub fn key(part: &str) -> Option<String> {
    (!part.is_empty()).then(|| part.to_string())
}

/// Key for several fields; any empty part means the value is not indexed.
pub fn composite(parts: &[&str]) -> Option<String> {
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(join(parts))
}

/// Key for several fields where trailing parts may legitimately be empty,
/// e.g. the domain of a local account. The first part must be set.
pub fn composite_allow_empty(parts: &[&str]) -> Option<String> {
    match parts.first() {
        Some(first) if !first.is_empty() => Some(join(parts)),
        _ => None,
    }
}

fn join(parts: &[&str]) -> String {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(KEY_SEPARATOR);
        }
        out.push_str(part);
    }
    out
}

/// Per-index mapping from key to the slots registered under it.
///
/// Slots are kept in insertion order so multi lookups are stable.
#[derive(Debug, Default)]
pub(crate) struct IndexTable {
    tables: Vec<HashMap<String, Vec<u64>>>,
}

impl IndexTable {
    pub(crate) fn new(indices: usize) -> Self {
        Self {
            tables: (0..indices).map(|_| HashMap::new()).collect(),
        }
    }

    pub(crate) fn slots(&self, index: usize, key: &str) -> &[u64] {
        self.tables[index]
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn insert(&mut self, index: usize, key: String, slot: u64) {
        self.tables[index].entry(key).or_default().push(slot);
    }

    pub(crate) fn remove(&mut self, index: usize, key: &str, slot: u64) {
        let table = &mut self.tables[index];
        if let Some(slots) = table.get_mut(key) {
            slots.retain(|s| *s != slot);
            if slots.is_empty() {
                table.remove(key);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn key_count(&self, index: usize) -> usize {
        self.tables[index].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_rejects_empty_parts() {
        assert_eq!(composite(&["a", ""]), None);
        assert_eq!(composite(&["a", "b"]), Some(format!("a{KEY_SEPARATOR}b")));
    }

    #[test]
    fn composite_allow_empty_keeps_local_domain() {
        assert_eq!(
            composite_allow_empty(&["alice", ""]),
            Some(format!("alice{KEY_SEPARATOR}"))
        );
        assert_eq!(composite_allow_empty(&["", "example.org"]), None);
    }

    #[test]
    fn separator_keeps_dotted_parts_distinct() {
        assert_ne!(
            composite(&["alice", "example.org"]),
            composite(&["alice.example", "org"])
        );
    }

    #[test]
    fn table_drops_empty_keys() {
        let mut table = IndexTable::new(1);
        table.insert(0, "k".into(), 1);
        table.insert(0, "k".into(), 2);
        assert_eq!(table.slots(0, "k"), &[1, 2]);

        table.remove(0, "k", 1);
        assert_eq!(table.slots(0, "k"), &[2]);
        table.remove(0, "k", 2);
        assert_eq!(table.key_count(0), 0);
    }
}
