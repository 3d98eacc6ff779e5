//! Settings persistence task
//!
//! Writes the RAM store to flash after it changes. Saves are delayed a
//! little so a burst of calibration writes ends up as one flash record.
//! The store stays dirty until its snapshot is on flash; a failed write
//! is retried after a back-off.

use defmt::*;
use embassy_time::Timer;

use heptaclock_core::config::SettingsRecord;
use heptaclock_hal_rp2040::flash::FlashStorage;

use crate::channels::{SETTINGS_SAVE, STORE};
use crate::config::save_settings;

/// Quiet period before a save (ms)
const SAVE_DELAY_MS: u64 = 500;

/// Wait before retrying a failed save (ms)
const RETRY_DELAY_MS: u64 = 5_000;

/// Settings task - persists the store on change
#[embassy_executor::task]
pub async fn settings_task(mut storage: FlashStorage<'static>) {
    info!("Settings task started");

    loop {
        SETTINGS_SAVE.wait().await;
        Timer::after_millis(SAVE_DELAY_MS).await;
        SETTINGS_SAVE.reset();

        let record = {
            let store = STORE.lock().await;
            if !store.is_dirty() {
                continue;
            }
            SettingsRecord::from_store(&store)
        };

        match save_settings(&mut storage, &record).await {
            Ok(()) => {
                if !STORE.lock().await.mark_saved(&record.entries) {
                    debug!("Settings changed while saving");
                    SETTINGS_SAVE.signal(());
                }
            }
            Err(e) => {
                error!("Failed to save settings: {:?}, retrying", e);
                Timer::after_millis(RETRY_DELAY_MS).await;
                SETTINGS_SAVE.signal(());
            }
        }
    }
}
