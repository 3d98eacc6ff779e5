//! RP2040-specific HAL for the servo clock firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `heptaclock-hal` traits, plus board bring-up helpers:
//!
//! - Flash storage driver (implements `heptaclock_hal::FlashStorage`)
//! - Hardware variant strap detection

#![no_std]

pub mod flash;
pub mod strap;

// Re-export shared traits from heptaclock-hal for convenience
pub use heptaclock_hal::{FlashStorage as FlashStorageTrait, StorageKey};
