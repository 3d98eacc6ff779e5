//! Heptaclock Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that chip-specific HALs
//! implement, so the clock application does not depend on one MCU family.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Application (heptaclock-firmware)       │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  heptaclock-hal (this crate - traits)    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//!         ┌───────────────────────┐
//!         │ heptaclock-hal-rp2040 │
//!         └───────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::FlashStorage`] - Persistent key/value storage
//! - [`i2c::I2cConfig`] - Bus speed presets for the servo bus

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod i2c;

// Re-export key items at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use i2c::I2cConfig;
