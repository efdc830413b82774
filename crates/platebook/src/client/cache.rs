//! Client-side record cache.
//!
//! Records are kept in server order and addressed by plate. Every mutation
//! is applied immediately and hands back an [`Undo`] token; callers roll the
//! token back when the matching server call fails, which restores the cache
//! to exactly its prior state.

use crate::record::Record;

/// Inverse of one cache mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an undo token must be rolled back or dropped deliberately"]
pub enum Undo {
    /// A record was appended; rollback removes it.
    Inserted {
        /// Plate of the appended record.
        plate: String,
    },
    /// Details were replaced; rollback restores them.
    Updated {
        /// Plate of the changed record.
        plate: String,
        /// Details before the change.
        previous: String,
    },
    /// A record was removed; rollback puts it back at `index`.
    Removed {
        /// Position the record occupied.
        index: usize,
        /// The removed record.
        record: Record,
    },
}

/// Ordered cache of records keyed by plate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordCache {
    records: Vec<Record>,
}

impl RecordCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached records and replace them with a fresh listing.
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// All cached records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the cache holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, plate: &str) -> Option<usize> {
        self.records.iter().position(|r| r.plate == plate)
    }

    /// Look up a record by its exact plate.
    #[must_use]
    pub fn get(&self, plate: &str) -> Option<&Record> {
        self.position(plate).map(|i| &self.records[i])
    }

    /// Map user input to the plate as cached.
    ///
    /// An exact match wins; otherwise the trimmed input is compared ignoring
    /// case. Returns `None` if no cached plate matches.
    #[must_use]
    pub fn resolve(&self, plate: &str) -> Option<&str> {
        if let Some(record) = self.get(plate) {
            return Some(&record.plate);
        }
        let needle = plate.trim().to_lowercase();
        self.records
            .iter()
            .find(|r| r.plate.to_lowercase() == needle)
            .map(|r| r.plate.as_str())
    }

    /// Append a record. Returns `None` if the plate is already cached.
    pub fn insert(&mut self, record: Record) -> Option<Undo> {
        if self.position(&record.plate).is_some() {
            return None;
        }
        let plate = record.plate.clone();
        self.records.push(record);
        Some(Undo::Inserted { plate })
    }

    /// Replace a record's details. Returns `None` if the plate is not cached.
    pub fn set_details(&mut self, plate: &str, details: impl Into<String>) -> Option<Undo> {
        let index = self.position(plate)?;
        let previous = std::mem::replace(&mut self.records[index].details, details.into());
        Some(Undo::Updated {
            plate: plate.to_string(),
            previous,
        })
    }

    /// Remove a record. Returns `None` if the plate is not cached.
    pub fn remove(&mut self, plate: &str) -> Option<Undo> {
        let index = self.position(plate)?;
        let record = self.records.remove(index);
        Some(Undo::Removed { index, record })
    }

    /// Record the store-assigned identifier once a create is confirmed.
    pub fn set_id(&mut self, plate: &str, id: i64) {
        if let Some(index) = self.position(plate) {
            self.records[index].id = Some(id);
        }
    }

    /// Revert the mutation that produced `undo`.
    pub fn rollback(&mut self, undo: Undo) {
        match undo {
            Undo::Inserted { plate } => {
                if let Some(index) = self.position(&plate) {
                    self.records.remove(index);
                }
            }
            Undo::Updated { plate, previous } => {
                if let Some(index) = self.position(&plate) {
                    self.records[index].details = previous;
                }
            }
            Undo::Removed { index, record } => {
                let index = index.min(self.records.len());
                self.records.insert(index, record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(plates: &[&str]) -> RecordCache {
        let mut cache = RecordCache::new();
        cache.replace_all(
            plates
                .iter()
                .map(|p| Record::new(*p, format!("details for {p}")))
                .collect(),
        );
        cache
    }

    #[test]
    fn test_insert_and_rollback() {
        let mut cache = cache_with(&["AAA1111"]);
        let before = cache.clone();

        let undo = cache.insert(Record::new("BBB2222", "new")).unwrap();
        assert_eq!(cache.len(), 2);

        cache.rollback(undo);
        assert_eq!(cache, before);
    }

    #[test]
    fn test_insert_duplicate_is_refused() {
        let mut cache = cache_with(&["AAA1111"]);
        assert!(cache.insert(Record::new("AAA1111", "again")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_details_and_rollback() {
        let mut cache = cache_with(&["AAA1111", "BBB2222"]);
        let before = cache.clone();

        let undo = cache.set_details("BBB2222", "changed").unwrap();
        assert_eq!(cache.get("BBB2222").unwrap().details, "changed");
        assert_eq!(cache.get("AAA1111").unwrap().details, "details for AAA1111");

        cache.rollback(undo);
        assert_eq!(cache, before);
    }

    #[test]
    fn test_set_details_unknown_plate() {
        let mut cache = cache_with(&["AAA1111"]);
        assert!(cache.set_details("ZZZ9999", "x").is_none());
    }

    #[test]
    fn test_remove_and_rollback_restores_position() {
        let mut cache = cache_with(&["AAA1111", "BBB2222", "CCC3333"]);
        let before = cache.clone();

        let undo = cache.remove("BBB2222").unwrap();
        assert!(cache.get("BBB2222").is_none());
        assert_eq!(cache.len(), 2);

        cache.rollback(undo);
        assert_eq!(cache, before);
    }

    #[test]
    fn test_remove_unknown_plate() {
        let mut cache = cache_with(&["AAA1111"]);
        assert!(cache.remove("ZZZ9999").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_ignores_case_and_padding() {
        let cache = cache_with(&["AAA1111", "BBB2222"]);
        assert_eq!(cache.resolve("AAA1111"), Some("AAA1111"));
        assert_eq!(cache.resolve(" bbb2222 "), Some("BBB2222"));
        assert_eq!(cache.resolve("ccc3333"), None);
    }

    #[test]
    fn test_resolve_prefers_exact_match() {
        let cache = cache_with(&["abc1234", "ABC1234"]);
        assert_eq!(cache.resolve("ABC1234"), Some("ABC1234"));
        assert_eq!(cache.resolve("abc1234"), Some("abc1234"));
    }

    #[test]
    fn test_set_id() {
        let mut cache = RecordCache::new();
        let _ = cache.insert(Record::new("AAA1111", "x"));
        cache.set_id("AAA1111", 42);
        assert_eq!(cache.get("AAA1111").unwrap().id, Some(42));
    }

    #[test]
    fn test_replace_all_discards_previous_state() {
        let mut cache = cache_with(&["AAA1111"]);
        cache.replace_all(vec![Record::new("BBB2222", "b")]);
        assert!(cache.get("AAA1111").is_none());
        assert_eq!(cache.records().len(), 1);
        assert!(!cache.is_empty());
    }
}
