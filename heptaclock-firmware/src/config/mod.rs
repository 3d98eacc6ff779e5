//! Configuration persistence
//!
//! The settings store lives in RAM and is written to flash as a single
//! postcard record whenever a persisted setting changes.

pub mod settings;

pub use settings::{load_settings, save_settings, SettingsError};
