//! Front-panel button task
//!
//! Polls the button (active low) and turns presses into commands:
//! - click: toggle between off and 8888
//! - long press: back to the clock

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use heptaclock_core::state::Command;

use crate::channels::COMMAND_CHANNEL;

/// Button timing
#[derive(Debug, Clone, Copy)]
pub struct ButtonConfig {
    /// Polling interval in ms
    pub poll_interval_ms: u64,
    /// Shortest press counted as a click (ms)
    pub click_min_ms: u64,
    /// Shortest press counted as a long press (ms)
    pub long_press_ms: u64,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            click_min_ms: 20,
            long_press_ms: 1000,
        }
    }
}

/// Classified press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Press {
    Click,
    Long,
}

impl ButtonConfig {
    /// Classify a released press by how long it was held
    fn classify(&self, held_ms: u64) -> Option<Press> {
        if held_ms >= self.long_press_ms {
            Some(Press::Long)
        } else if held_ms > self.click_min_ms {
            Some(Press::Click)
        } else {
            None
        }
    }
}

/// Button task
#[embassy_executor::task]
pub async fn button_task(button: Input<'static>, config: ButtonConfig) {
    info!(
        "Button task started (click > {}ms, long >= {}ms)",
        config.click_min_ms, config.long_press_ms
    );

    let mut ticker = Ticker::every(Duration::from_millis(config.poll_interval_ms));
    let mut held_ms: u64 = 0;
    let mut display_off = false;

    loop {
        ticker.next().await;

        if button.is_low() {
            held_ms = held_ms.saturating_add(config.poll_interval_ms);
            continue;
        }

        let press = config.classify(held_ms);
        held_ms = 0;

        let command = match press {
            Some(Press::Click) => {
                display_off = !display_off;
                if display_off {
                    Command::Shutdown
                } else {
                    Command::SetNumber([8; 4])
                }
            }
            Some(Press::Long) => {
                display_off = false;
                Command::ShowTime
            }
            None => continue,
        };

        debug!("Button {:?} -> {:?}", press, command);
        COMMAND_CHANNEL.send(command).await;
    }
}
