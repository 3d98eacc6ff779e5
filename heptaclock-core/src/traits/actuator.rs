//! Servo output stage trait
//!
//! Abstracts the PWM chips that hold the 28 pointer servos. Implementations
//! own bus retries; callers treat every write as fire-and-forget.

use crate::layout::Channel;

/// Errors from a servo write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// Bus transfer failed after all retries
    Bus,
    /// Output stage never came up
    Unavailable,
}

/// Trait for the servo PWM output stage
pub trait ServoOutput {
    /// Whether initialization succeeded
    ///
    /// When this is false every write is a no-op.
    fn is_available(&self) -> bool;

    /// Program one channel's PWM on/off counts
    ///
    /// Returns `Ok(())` without touching the bus when the stage is
    /// unavailable or motion is disabled.
    fn set_pwm(
        &mut self,
        channel: Channel,
        on: u16,
        off: u16,
    ) -> impl core::future::Future<Output = Result<(), ServoError>>;

    /// Move a channel's pointer to a raw position
    fn set_position(
        &mut self,
        channel: Channel,
        position: u16,
    ) -> impl core::future::Future<Output = Result<(), ServoError>> {
        self.set_pwm(channel, 0, position)
    }
}
