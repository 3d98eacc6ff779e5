//! Settings partition on the RP2040's QSPI flash
//!
//! The last 64KB of the 2MB flash hold a sequential-storage map with one
//! item per [`StorageKey`]. Everything below it belongs to the firmware
//! image (see `memory.x`).

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use heptaclock_hal::flash::{FlashError, StorageKey};

/// Flash size on the Pico module
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Bytes reserved for settings at the top of flash
pub const SETTINGS_PARTITION_SIZE: usize = 64 * 1024;

/// Byte range of the settings partition
pub const SETTINGS_RANGE: Range<u32> =
    ((FLASH_SIZE - SETTINGS_PARTITION_SIZE) as u32)..(FLASH_SIZE as u32);

/// Scratch space for one map item: key byte plus the encoded record
const ITEM_BUFFER_SIZE: usize = 1024;

/// Settings storage over the on-board flash
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    item: [u8; ITEM_BUFFER_SIZE],
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            item: [0; ITEM_BUFFER_SIZE],
        }
    }
}

fn map_error<E>(e: sequential_storage::Error<E>) -> FlashError {
    match e {
        sequential_storage::Error::Storage { .. } => FlashError::Flash,
        sequential_storage::Error::FullStorage => FlashError::Full,
        sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
        _ => FlashError::Storage,
    }
}

impl<'d> heptaclock_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let record = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut self.item,
            &key,
        )
        .await
        .map_err(map_error)?
        .ok_or(FlashError::NotFound)?;

        let target = buffer
            .get_mut(..record.len())
            .ok_or(FlashError::BufferTooSmall)?;
        target.copy_from_slice(record);
        Ok(record.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        map::store_item(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut self.item,
            &key,
            &data,
        )
        .await
        .map_err(map_error)
    }
}

/// Board flash storage
pub type FlashStorage<'d> = Rp2040FlashStorage<'d>;
