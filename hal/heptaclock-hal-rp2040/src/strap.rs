//! Hardware variant strap
//!
//! Boards with the revised servo mounting tie the strap pin to ground.
//! The pin is read once at boot with the internal pull-up enabled.

use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::Peri;
use embassy_time::Timer;

use heptaclock_core::config::ServoVariant;

/// Time for the pull-up to settle before sampling
const SETTLE_US: u64 = 50;

/// Read the strap pin and release it
///
/// Low selects variant B, high (or floating) variant A.
pub async fn detect_variant(pin: Peri<'_, impl Pin>) -> ServoVariant {
    let input = Input::new(pin, Pull::Up);
    Timer::after_micros(SETTLE_US).await;
    let variant = ServoVariant::from_strap(input.is_high());

    #[cfg(feature = "defmt")]
    defmt::info!("Servo variant {} (strap {})", variant, input.is_high());

    variant
}
