//! Tick task
//!
//! Drives the clock once per second. The signal only holds the latest
//! tick, so ticks that arrive while motion is still running collapse
//! into one instead of queueing up.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Signal to notify the clock task of a tick (uptime in ms)
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u64> = Signal::new();

/// Tick task - sends periodic tick signals with timestamp
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(Instant::now().as_millis());
    }
}
