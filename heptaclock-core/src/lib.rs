//! Board-agnostic core logic for the servo seven-segment clock
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Digit/segment addressing and glyph tables
//! - Calibration profiles and per-channel offsets
//! - Target resolution and collision-avoiding choreography
//! - The motion task scheduler
//! - The clock mode state machine
//! - Wall clock and persisted settings
//! - Hardware abstraction traits (servo output, settings store)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod glyph;
pub mod layout;
pub mod motion;
pub mod scheduler;
pub mod state;
pub mod time;
pub mod traits;

pub use controller::{ClockController, ClockStatus, CommandError, TickReport};
