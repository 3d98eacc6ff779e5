//! Configuration types
//!
//! Calibration tables, the typed settings view, and the in-RAM store that
//! is persisted to flash as a postcard record.

pub mod calibration;
pub mod record;
pub mod settings;
pub mod store;

pub use calibration::{
    clamp_position, Calibration, ServoOffsets, ServoVariant, SERVO_MAX, SERVO_MIN,
};
pub use record::{SettingsRecord, SETTINGS_MAGIC, SETTINGS_VERSION};
pub use settings::{ClockSettings, SleepWindow};
pub use store::{MemoryStore, StoredEntry, StoredValue};
