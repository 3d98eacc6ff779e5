//! Clock operating modes

/// Active display mode
///
/// Exactly one mode is active. Display priority is implied: a shut-down
/// clock renders blank regardless of any other state it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Wall clock
    #[default]
    Normal,
    /// Fixed digits
    Manual([u8; 4]),
    /// Counting down; negative once 00:00 has been shown
    Countdown { remaining: i32 },
    /// Stopwatch running
    Timer,
    /// Sleeping, middle pointers only
    Idle,
    /// All pointers off
    Shutdown,
    /// Self-test, `lit` is the frame shown on the next tick
    Test { lit: bool },
}

impl Mode {
    /// Check if this mode renders the wall clock
    pub fn is_clock(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    /// Short name for logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Manual(_) => "manual",
            Mode::Countdown { .. } => "countdown",
            Mode::Timer => "timer",
            Mode::Idle => "idle",
            Mode::Shutdown => "shutdown",
            Mode::Test { .. } => "test",
        }
    }
}

