//! Wall clock time
//!
//! The clock has no RTC. A time-sync collaborator hands over Unix seconds
//! once; from then on local time is derived from the monotonic uptime.

const SECONDS_PER_DAY: i64 = 86_400;

/// A minute of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HourMinute {
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
}

impl HourMinute {
    /// Create a minute of the day, rejecting out-of-range fields
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Create a minute of the day, clamping each field into range
    pub fn new_clamped(hour: i32, minute: i32) -> Self {
        Self {
            hour: hour.clamp(0, 23) as u8,
            minute: minute.clamp(0, 59) as u8,
        }
    }

    /// Minutes since midnight
    pub const fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

/// Local time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Time of day from seconds since local midnight
    pub const fn from_seconds(seconds: u32) -> Self {
        let seconds = seconds % SECONDS_PER_DAY as u32;
        Self {
            hour: (seconds / 3600) as u8,
            minute: ((seconds / 60) % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Hour and minute, dropping seconds
    pub const fn hour_minute(self) -> HourMinute {
        HourMinute {
            hour: self.hour,
            minute: self.minute,
        }
    }
}

/// Timezone as whole hours plus extra minutes, east positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimezoneOffset {
    pub hours: i8,
    pub minutes: i16,
}

impl Default for TimezoneOffset {
    fn default() -> Self {
        Self {
            hours: 8,
            minutes: 0,
        }
    }
}

impl TimezoneOffset {
    /// Create an offset, clamping hours to -12..=14 and minutes to -59..=59
    pub fn new_clamped(hours: i32, minutes: i32) -> Self {
        Self {
            hours: hours.clamp(-12, 14) as i8,
            minutes: minutes.clamp(-59, 59) as i16,
        }
    }

    /// Offset from UTC in seconds
    pub const fn as_seconds(self) -> i64 {
        self.hours as i64 * 3600 + self.minutes as i64 * 60
    }
}

/// Local wall clock derived from one sync point and the uptime counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallClock {
    /// (Unix seconds, uptime in ms) at the last sync
    anchor: Option<(u64, u64)>,
    timezone: TimezoneOffset,
}

impl WallClock {
    /// Unsynchronized clock in `timezone`
    pub const fn new(timezone: TimezoneOffset) -> Self {
        Self {
            anchor: None,
            timezone,
        }
    }

    /// Record that it is `unix_secs` UTC at `uptime_ms`
    pub fn sync(&mut self, unix_secs: u64, uptime_ms: u64) {
        self.anchor = Some((unix_secs, uptime_ms));
    }

    /// Whether a sync has happened ("server time is ready")
    pub const fn is_ready(&self) -> bool {
        self.anchor.is_some()
    }

    /// Active timezone
    pub const fn timezone(&self) -> TimezoneOffset {
        self.timezone
    }

    /// Change the timezone; takes effect on the next read
    pub fn set_timezone(&mut self, timezone: TimezoneOffset) {
        self.timezone = timezone;
    }

    /// Local time at `uptime_ms`, `None` before the first sync
    pub fn now(&self, uptime_ms: u64) -> Option<TimeOfDay> {
        let (unix_secs, anchor_ms) = self.anchor?;
        let elapsed = uptime_ms.saturating_sub(anchor_ms) / 1000;
        let utc = unix_secs.saturating_add(elapsed) as i64;
        let local = (utc + self.timezone.as_seconds()).rem_euclid(SECONDS_PER_DAY);
        Some(TimeOfDay::from_seconds(local as u32))
    }
}
