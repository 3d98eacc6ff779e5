//! Commands accepted by the clock

use crate::config::ServoOffsets;
use crate::time::HourMinute;

/// Stopwatch operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerOp {
    /// Clear elapsed time and show 00:00
    Reset,
    /// Start or resume counting
    Start,
    /// Freeze the elapsed time on the display
    Stop,
}

/// Inbound commands from the configuration surface, the button and the
/// time-sync collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    // Display modes
    /// Show four fixed digits (0-9 each)
    SetNumber([u8; 4]),
    /// Count down from this many seconds
    SetCountdown(u32),
    /// Stopwatch control
    SetTimer(TimerOp),
    /// All pointers off
    Shutdown,
    /// Sleep glyph
    Idle,
    /// Back to the wall clock
    ShowTime,
    /// Alternate 8888 and blank every tick
    SelfTest,

    // Preferences
    /// Smooth-step motion for clock updates (persisted)
    SetServoSilent(bool),
    /// 12-hour display
    Set12Hour(bool),
    /// Nightly sleep window (persisted)
    SetSleepWindow {
        enabled: bool,
        start: HourMinute,
        end: HourMinute,
    },
    /// Timezone in hours plus extra minutes (persisted)
    SetTimezone { hours: i8, minutes: i16 },
    /// Arm or clear the one-shot alarm
    SetAlarm(Option<HourMinute>),

    // Collaborators
    /// Wall clock sync; also raises "time is ready"
    SyncTime { unix_secs: u64 },
    /// Replace all calibration offsets (persisted)
    SetOffsets(ServoOffsets),
    /// Replace one calibration offset (persisted)
    SetOffset { channel: u8, value: i16 },
}

impl Command {
    /// Whether this command changes persisted settings
    pub fn is_persisted(&self) -> bool {
        matches!(
            self,
            Command::SetServoSilent(_)
                | Command::SetSleepWindow { .. }
                | Command::SetTimezone { .. }
                | Command::SetOffsets(_)
                | Command::SetOffset { .. }
        )
    }
}
