//! Command task
//!
//! Applies inbound commands to the controller in arrival order. Commands
//! that change a persisted setting write through to the RAM store and
//! wake the settings task.

use defmt::*;
use embassy_time::{with_timeout, Instant};
use portable_atomic::Ordering;

use heptaclock_core::CommandError;

use crate::channels::{
    publish_status, ControllerMutex, COMMAND_CHANNEL, DRIVER_AVAILABLE, LOCK_TIMEOUT,
    SETTINGS_SAVE, STORE,
};

/// Command task - receives commands and applies them
#[embassy_executor::task]
pub async fn command_task(controller: &'static ControllerMutex) {
    info!("Command task started");

    loop {
        let command = COMMAND_CHANNEL.receive().await;
        debug!("Command: {:?}", command);

        // A timed-out lock is retried; commands are never dropped
        let mut clock = loop {
            match with_timeout(LOCK_TIMEOUT, controller.lock()).await {
                Ok(guard) => break guard,
                Err(_) => warn!("Controller busy, retrying command"),
            }
        };
        let mut store = loop {
            match with_timeout(LOCK_TIMEOUT, STORE.lock()).await {
                Ok(guard) => break guard,
                Err(_) => warn!("Settings store busy, retrying command"),
            }
        };

        match clock.apply(command, Instant::now().as_millis(), &mut *store) {
            Ok(()) => {}
            Err(CommandError::Store(e)) => warn!("Setting not stored: {:?}", e),
            Err(e) => warn!("Command rejected: {:?}", e),
        }

        publish_status(clock.status(DRIVER_AVAILABLE.load(Ordering::Relaxed)));

        if command.is_persisted() && store.is_dirty() {
            SETTINGS_SAVE.signal(());
        }
    }
}
