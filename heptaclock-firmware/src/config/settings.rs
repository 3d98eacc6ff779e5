//! Settings record on flash
//!
//! The RAM store is written as one postcard-encoded [`SettingsRecord`].
//! A record that is missing, unreadable or fails its header/CRC check is
//! ignored and the clock boots on defaults.

use defmt::*;

use heptaclock_core::config::{MemoryStore, SettingsRecord};
use heptaclock_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use heptaclock_hal_rp2040::FlashStorageTrait;

/// Largest encoded record accepted
const RECORD_BUFFER_SIZE: usize = 768;

/// Settings persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Flash read or write failed
    Flash(FlashError),
    /// Record bytes did not decode
    Deserialize,
    /// Record did not fit the encode buffer
    Serialize,
    /// Wrong magic or version
    InvalidFormat,
    /// Payload does not match its CRC
    CrcMismatch,
}

impl From<FlashError> for SettingsError {
    fn from(e: FlashError) -> Self {
        SettingsError::Flash(e)
    }
}

/// Read the store persisted by [`save_settings`], or an empty one
pub async fn load_settings(storage: &mut FlashStorage<'_>) -> MemoryStore {
    let mut buffer = [0u8; RECORD_BUFFER_SIZE];
    let result = match storage.read(StorageKey::Settings, &mut buffer).await {
        Ok(len) => decode(&buffer[..len]),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(record) => {
            info!("Loaded {} settings from flash", record.entries.len());
            record.into_store()
        }
        Err(SettingsError::Flash(FlashError::NotFound)) => {
            info!("No stored settings, using defaults");
            MemoryStore::new()
        }
        Err(e) => {
            warn!("Stored settings unusable ({:?}), using defaults", e);
            MemoryStore::new()
        }
    }
}

/// Write a record snapshot to flash
pub async fn save_settings(
    storage: &mut FlashStorage<'_>,
    record: &SettingsRecord,
) -> Result<(), SettingsError> {
    let mut buffer = [0u8; RECORD_BUFFER_SIZE];
    let bytes =
        postcard::to_slice(record, &mut buffer).map_err(|_| SettingsError::Serialize)?;
    storage.write(StorageKey::Settings, bytes).await?;

    debug!("Saved {} settings ({} bytes)", record.entries.len(), bytes.len());
    Ok(())
}

fn decode(bytes: &[u8]) -> Result<SettingsRecord, SettingsError> {
    let record: SettingsRecord =
        postcard::from_bytes(bytes).map_err(|_| SettingsError::Deserialize)?;
    if !record.is_valid() {
        return Err(SettingsError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(SettingsError::CrcMismatch);
    }
    Ok(record)
}
