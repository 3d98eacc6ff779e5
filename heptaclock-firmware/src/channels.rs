//! Inter-task communication channels
//!
//! Defines the static channels and shared state used between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use portable_atomic::AtomicBool;

use heptaclock_core::config::MemoryStore;
use heptaclock_core::scheduler::Scheduler;
use heptaclock_core::state::Command;
use heptaclock_core::{ClockController, ClockStatus};

/// Channel capacity for inbound commands
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Bounded wait for the controller, scheduler and store locks
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Clock state, guarded for the span of a tick's resolve and enqueue
pub type ControllerMutex = Mutex<CriticalSectionRawMutex, ClockController>;

/// Motion queue, locked per scheduler advance
pub type SchedulerMutex = Mutex<CriticalSectionRawMutex, Scheduler>;

/// Commands from the button and the configuration surface
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Settings changed and should be written to flash
pub static SETTINGS_SAVE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// In-RAM settings, loaded from flash at boot
pub static STORE: Mutex<CriticalSectionRawMutex, MemoryStore> = Mutex::new(MemoryStore::new());

/// Whether both PWM chips came up
pub static DRIVER_AVAILABLE: AtomicBool = AtomicBool::new(false);

/// Latest diagnostics snapshot, updated after every tick and command
pub static STATUS: BlockingMutex<CriticalSectionRawMutex, Cell<Option<ClockStatus>>> =
    BlockingMutex::new(Cell::new(None));

/// Publish a status snapshot
pub fn publish_status(status: ClockStatus) {
    STATUS.lock(|cell| cell.set(Some(status)));
}

/// Read the last published snapshot
pub fn latest_status() -> Option<ClockStatus> {
    STATUS.lock(|cell| cell.get())
}
