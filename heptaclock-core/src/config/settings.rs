//! Typed view of the persisted clock settings

use crate::config::calibration::ServoOffsets;
use crate::time::{HourMinute, TimezoneOffset};
use crate::traits::{SettingsStore, StoreError};

/// Store key: silent (smooth-step) motion flag
pub const KEY_SERVO_MUTE: &str = "servo_mute_en";
/// Store key: sleep window enabled
pub const KEY_SLEEP_ENABLED: &str = "sleep_clock_en";
/// Store key: sleep start hour
pub const KEY_SLEEP_START_HOUR: &str = "sleep_s_hour";
/// Store key: sleep start minute
pub const KEY_SLEEP_START_MINUTE: &str = "sleep_s_minute";
/// Store key: sleep end hour
pub const KEY_SLEEP_END_HOUR: &str = "sleep_e_hour";
/// Store key: sleep end minute
pub const KEY_SLEEP_END_MINUTE: &str = "sleep_e_minute";
/// Store key: timezone hours
pub const KEY_TIMEZONE_HOURS: &str = "tz";
/// Store key: timezone extra minutes
pub const KEY_TIMEZONE_MINUTES: &str = "mtz";
/// Store key: calibration offsets, `|`-separated
pub const KEY_OFFSETS: &str = "adjust_data";

/// Nightly sleep window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepWindow {
    /// Whether the window is checked at all
    pub enabled: bool,
    /// Minute at which the clock goes idle
    pub start: HourMinute,
    /// Minute at which the clock wakes
    pub end: HourMinute,
}

impl Default for SleepWindow {
    fn default() -> Self {
        Self {
            enabled: false,
            start: HourMinute::new_clamped(22, 0),
            end: HourMinute::new_clamped(7, 0),
        }
    }
}

/// Everything the clock persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSettings {
    /// Smooth-step motion for clock updates
    pub servo_silent: bool,
    /// Sleep window
    pub sleep: SleepWindow,
    /// Local timezone
    pub timezone: TimezoneOffset,
    /// Per-channel calibration trim
    pub offsets: ServoOffsets,
}

impl ClockSettings {
    /// Read settings from a store, using defaults for absent keys
    pub fn load(store: &impl SettingsStore) -> Self {
        let defaults = Self::default();
        let sleep = SleepWindow {
            enabled: store.get_int(KEY_SLEEP_ENABLED, 0) != 0,
            start: HourMinute::new_clamped(
                store.get_int(KEY_SLEEP_START_HOUR, defaults.sleep.start.hour as i32),
                store.get_int(KEY_SLEEP_START_MINUTE, defaults.sleep.start.minute as i32),
            ),
            end: HourMinute::new_clamped(
                store.get_int(KEY_SLEEP_END_HOUR, defaults.sleep.end.hour as i32),
                store.get_int(KEY_SLEEP_END_MINUTE, defaults.sleep.end.minute as i32),
            ),
        };
        let timezone = TimezoneOffset::new_clamped(
            store.get_int(KEY_TIMEZONE_HOURS, defaults.timezone.hours as i32),
            store.get_int(KEY_TIMEZONE_MINUTES, defaults.timezone.minutes as i32),
        );
        let offsets = store
            .get_string(KEY_OFFSETS)
            .map(ServoOffsets::parse)
            .unwrap_or_default();

        Self {
            servo_silent: store.get_int(KEY_SERVO_MUTE, 0) != 0,
            sleep,
            timezone,
            offsets,
        }
    }

    /// Write every setting back to a store
    pub fn save(&self, store: &mut impl SettingsStore) -> Result<(), StoreError> {
        save_servo_silent(store, self.servo_silent)?;
        save_sleep_window(store, &self.sleep)?;
        save_timezone(store, self.timezone)?;
        save_offsets(store, &self.offsets)
    }
}

/// Persist the silent-motion flag
pub fn save_servo_silent(store: &mut impl SettingsStore, silent: bool) -> Result<(), StoreError> {
    store.set_int(KEY_SERVO_MUTE, silent as i32)
}

/// Persist the sleep window
pub fn save_sleep_window(
    store: &mut impl SettingsStore,
    window: &SleepWindow,
) -> Result<(), StoreError> {
    store.set_int(KEY_SLEEP_ENABLED, window.enabled as i32)?;
    store.set_int(KEY_SLEEP_START_HOUR, window.start.hour as i32)?;
    store.set_int(KEY_SLEEP_START_MINUTE, window.start.minute as i32)?;
    store.set_int(KEY_SLEEP_END_HOUR, window.end.hour as i32)?;
    store.set_int(KEY_SLEEP_END_MINUTE, window.end.minute as i32)
}

/// Persist the timezone
pub fn save_timezone(
    store: &mut impl SettingsStore,
    timezone: TimezoneOffset,
) -> Result<(), StoreError> {
    store.set_int(KEY_TIMEZONE_HOURS, timezone.hours as i32)?;
    store.set_int(KEY_TIMEZONE_MINUTES, timezone.minutes as i32)
}

/// Persist the calibration offsets
pub fn save_offsets(
    store: &mut impl SettingsStore,
    offsets: &ServoOffsets,
) -> Result<(), StoreError> {
    store.set_string(KEY_OFFSETS, &offsets.to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::MemoryStore;

    #[test]
    fn test_defaults_from_empty_store() {
        let settings = ClockSettings::load(&MemoryStore::new());
        assert!(!settings.servo_silent);
        assert!(!settings.sleep.enabled);
        assert_eq!(settings.sleep.start, HourMinute::new_clamped(22, 0));
        assert_eq!(settings.sleep.end, HourMinute::new_clamped(7, 0));
        assert_eq!(settings.timezone.hours, 8);
        assert_eq!(settings.timezone.minutes, 0);
        assert_eq!(settings.offsets, ServoOffsets::zero());
    }

    #[test]
    fn test_save_then_load() {
        let mut settings = ClockSettings::default();
        settings.servo_silent = true;
        settings.sleep.enabled = true;
        settings.sleep.start = HourMinute::new_clamped(23, 30);
        settings.timezone = TimezoneOffset::new_clamped(-3, 30);
        settings.offsets.0[5] = -7;

        let mut store = MemoryStore::new();
        settings.save(&mut store).unwrap();
        assert_eq!(store.get_int(KEY_SERVO_MUTE, 0), 1);
        assert_eq!(ClockSettings::load(&store), settings);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut store = MemoryStore::new();
        store.set_int(KEY_SLEEP_START_HOUR, 99).unwrap();
        store.set_int(KEY_SLEEP_END_MINUTE, -4).unwrap();
        let settings = ClockSettings::load(&store);
        assert_eq!(settings.sleep.start.hour, 23);
        assert_eq!(settings.sleep.end.minute, 0);
    }
}
