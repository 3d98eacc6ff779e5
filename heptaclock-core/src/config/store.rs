//! In-RAM settings store
//!
//! Holds the persisted key/value set between flash writes. The firmware
//! loads it from a [`SettingsRecord`](super::record::SettingsRecord) at boot
//! and flushes it back whenever the dirty flag is set.

use heapless::{String, Vec};

use crate::traits::{SettingsStore, StoreError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of keys held
pub const MAX_ENTRIES: usize = 16;

/// Maximum key length in bytes
pub const MAX_KEY_LEN: usize = 16;

/// Maximum string value length in bytes
pub const MAX_TEXT_LEN: usize = 256;

/// A stored value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StoredValue {
    /// Integer setting
    Int(i32),
    /// String setting
    Text(String<MAX_TEXT_LEN>),
}

/// One key/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoredEntry {
    /// Setting key
    pub key: String<MAX_KEY_LEN>,
    /// Setting value
    pub value: StoredValue,
}

/// Fixed-capacity key/value store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<StoredEntry, MAX_ENTRIES>,
    dirty: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
        }
    }

    /// Rebuild a store from persisted entries (not marked dirty)
    pub fn from_entries(entries: Vec<StoredEntry, MAX_ENTRIES>) -> Self {
        Self {
            entries,
            dirty: false,
        }
    }

    /// Stored entries in insertion order
    pub fn entries(&self) -> &[StoredEntry] {
        &self.entries
    }

    /// Whether anything changed since the last [`mark_saved`](Self::mark_saved)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after `saved` reached flash
    ///
    /// The flag stays set if the store moved on since that snapshot was
    /// taken. Returns whether the store is now clean.
    pub fn mark_saved(&mut self, saved: &[StoredEntry]) -> bool {
        if self.entries.as_slice() == saved {
            self.dirty = false;
        }
        !self.dirty
    }

    fn find(&self, key: &str) -> Option<&StoredValue> {
        self.entries
            .iter()
            .find(|e| e.key.as_str() == key)
            .map(|e| &e.value)
    }

    fn put(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key.as_str() == key) {
            if entry.value != value {
                entry.value = value;
                self.dirty = true;
            }
            return Ok(());
        }

        let key = String::try_from(key).map_err(|_| StoreError::KeyTooLong)?;
        self.entries
            .push(StoredEntry { key, value })
            .map_err(|_| StoreError::Full)?;
        self.dirty = true;
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.find(key) {
            Some(StoredValue::Int(value)) => *value,
            _ => default,
        }
    }

    fn set_int(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        self.put(key, StoredValue::Int(value))
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        match self.find(key) {
            Some(StoredValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let text = String::try_from(value).map_err(|_| StoreError::ValueTooLong)?;
        self.put(key, StoredValue::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_default_and_overwrite() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_int("tz", 8), 8);

        store.set_int("tz", 2).unwrap();
        assert_eq!(store.get_int("tz", 8), 2);
        store.set_int("tz", -5).unwrap();
        assert_eq!(store.get_int("tz", 8), -5);
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn test_string_values() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_string("adjust_data"), None);
        store.set_string("adjust_data", "1|2|3").unwrap();
        assert_eq!(store.get_string("adjust_data"), Some("1|2|3"));
        // Type mismatch reads as absent
        assert_eq!(store.get_int("adjust_data", 7), 7);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut store = MemoryStore::new();
        assert!(!store.is_dirty());
        store.set_int("mtz", 0).unwrap();
        assert!(store.is_dirty());
        let snapshot = store.entries().to_vec();
        assert!(store.mark_saved(&snapshot));

        // Rewriting the same value is not a change
        store.set_int("mtz", 0).unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_limits() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.set_int("a_key_that_is_far_too_long", 1),
            Err(StoreError::KeyTooLong)
        );

        let long = [b'x'; MAX_TEXT_LEN + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(store.set_string("k", long), Err(StoreError::ValueTooLong));

        for i in 0..MAX_ENTRIES {
            let mut key: String<MAX_KEY_LEN> = String::new();
            core::fmt::Write::write_fmt(&mut key, format_args!("k{}", i)).unwrap();
            store.set_int(&key, 1).unwrap();
        }
        assert_eq!(store.set_int("extra", 1), Err(StoreError::Full));
    }

    #[test]
    fn test_failed_save_keeps_store_dirty() {
        let mut store = MemoryStore::new();
        store.set_int("servo_mute_en", 1).unwrap();

        // Snapshot taken but the write failed: nothing marks it saved, and
        // repeating the same command must still find the store dirty
        let _snapshot = store.entries().to_vec();
        store.set_int("servo_mute_en", 1).unwrap();
        assert!(store.is_dirty());
    }

    #[test]
    fn test_change_during_save_stays_dirty() {
        let mut store = MemoryStore::new();
        store.set_int("tz", 8).unwrap();
        let snapshot = store.entries().to_vec();

        store.set_int("tz", 9).unwrap();
        assert!(!store.mark_saved(&snapshot));
        assert!(store.is_dirty());

        let snapshot = store.entries().to_vec();
        assert!(store.mark_saved(&snapshot));
        assert!(!store.is_dirty());
    }
}
