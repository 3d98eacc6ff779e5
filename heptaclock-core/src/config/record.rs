//! Flash record wrapping the settings store
//!
//! The whole key/value set is written as one record under
//! `StorageKey::Settings`, with a header for validation.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::store::{MemoryStore, StoredEntry, StoredValue, MAX_ENTRIES};

/// Magic number to identify a valid settings record
pub const SETTINGS_MAGIC: u32 = 0x48434C4B; // "HCLK"

/// Current settings record version
pub const SETTINGS_VERSION: u8 = 1;

/// Settings record as stored in flash
///
/// This struct is serialized to flash using postcard.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettingsRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Stored key/value pairs
    pub entries: Vec<StoredEntry, MAX_ENTRIES>,
    /// CRC32 checksum (calculated over magic..entries)
    pub crc: u32,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsRecord {
    /// Create an empty record
    pub const fn new() -> Self {
        Self {
            magic: SETTINGS_MAGIC,
            version: SETTINGS_VERSION,
            entries: Vec::new(),
            crc: 0,
        }
    }

    /// Snapshot a store into a record with a fresh CRC
    pub fn from_store(store: &MemoryStore) -> Self {
        let mut record = Self::new();
        for entry in store.entries() {
            // Both sides share MAX_ENTRIES
            let _ = record.entries.push(entry.clone());
        }
        record.update_crc();
        record
    }

    /// Unpack into a store
    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_entries(self.entries)
    }

    /// Check if the header matches this firmware
    pub fn is_valid(&self) -> bool {
        self.magic == SETTINGS_MAGIC && self.version == SETTINGS_VERSION
    }

    /// Calculate CRC32 over the header and entries
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;

        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);

        for entry in &self.entries {
            crc = crc32_update(crc, &[entry.key.len() as u8]);
            crc = crc32_update(crc, entry.key.as_bytes());
            match &entry.value {
                StoredValue::Int(value) => {
                    crc = crc32_update(crc, &[0]);
                    crc = crc32_update(crc, &value.to_le_bytes());
                }
                StoredValue::Text(text) => {
                    crc = crc32_update(crc, &[1]);
                    crc = crc32_update(crc, &(text.len() as u16).to_le_bytes());
                    crc = crc32_update(crc, text.as_bytes());
                }
            }
        }

        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
