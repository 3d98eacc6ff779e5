//! Clock controller
//!
//! The single owner of clock state: mode machine, calibration and wall
//! clock. The firmware constructs one at boot and hands it to the tasks
//! that need it; every inbound command and every tick goes through it.
//!
//! The controller never touches hardware. A tick resolves the frame to
//! target positions, plans the moves and enqueues them on the
//! [`Scheduler`], which the caller then drains against the servo output.

use crate::config::settings::{save_offsets, save_servo_silent, save_sleep_window, save_timezone};
use crate::config::{Calibration, ClockSettings, ServoOffsets, ServoVariant, SleepWindow};
use crate::glyph::{digits_frame, Frame};
use crate::layout::{Channel, ChannelMap};
use crate::motion::{choreograph, resolve, TaskError};
use crate::scheduler::Scheduler;
use crate::state::{Command, Mode, ModeMachine};
use crate::time::{HourMinute, TimezoneOffset, WallClock};
use crate::traits::{SettingsStore, StoreError};

/// Frame shown at boot and while calibrating
pub const FULL_FRAME: Frame = digits_frame([8; 4]);

/// Errors from [`ClockController::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// A digit outside 0-9
    InvalidDigit,
    /// An hour or minute out of range
    InvalidTime,
    /// A channel outside 0-27
    InvalidChannel,
    /// The settings store rejected the write
    Store(StoreError),
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        CommandError::Store(e)
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Motion from an earlier tick was still queued; nothing was evaluated
    pub skipped: bool,
    /// Tasks added to the scheduler
    pub enqueued: usize,
    /// The alarm went off this tick
    pub alarm_fired: bool,
    /// Mode entered through the sleep window
    pub transition: Option<Mode>,
}

/// Diagnostics snapshot for the configuration surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockStatus {
    pub mode: Mode,
    pub driver_available: bool,
    pub time_ready: bool,
    pub silent: bool,
    pub variant: ServoVariant,
    pub offsets: ServoOffsets,
}

/// Owned clock state
#[derive(Debug, Clone)]
pub struct ClockController {
    machine: ModeMachine,
    calibration: Calibration,
    wall_clock: WallClock,
}

impl ClockController {
    /// Build the controller from the strapped variant and loaded settings
    pub fn new(variant: ServoVariant, settings: &ClockSettings) -> Self {
        Self {
            machine: ModeMachine::new(settings.servo_silent, settings.sleep),
            calibration: Calibration::new(variant, settings.offsets),
            wall_clock: WallClock::new(settings.timezone),
        }
    }

    /// Active mode
    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    /// Active calibration
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Current calibration offsets
    pub fn offsets(&self) -> ServoOffsets {
        *self.calibration.offsets()
    }

    /// Whether the wall clock has been synchronized
    pub fn is_time_ready(&self) -> bool {
        self.wall_clock.is_ready()
    }

    /// Where the pointers rest at power-on
    pub fn initial_positions(&self) -> ChannelMap<u16> {
        self.calibration.initial_positions()
    }

    /// Queue the boot frame (8888, coarse steps)
    pub fn boot(&self, scheduler: &mut Scheduler) -> Result<usize, TaskError> {
        self.render(&FULL_FRAME, false, scheduler)
    }

    /// Plan the moves to `frame` and queue them
    pub fn render(
        &self,
        frame: &Frame,
        smooth: bool,
        scheduler: &mut Scheduler,
    ) -> Result<usize, TaskError> {
        let targets = resolve(frame, &self.calibration);
        let plan = choreograph(scheduler.positions(), &targets, &self.calibration, smooth);
        scheduler.enqueue_all(plan.iter())
    }

    /// Run one tick at `uptime_ms`
    ///
    /// Skipped entirely while the scheduler still holds motion, so ticks
    /// are delayed rather than stacked.
    pub fn tick(
        &mut self,
        uptime_ms: u64,
        scheduler: &mut Scheduler,
    ) -> Result<TickReport, TaskError> {
        if !scheduler.is_empty() {
            return Ok(TickReport {
                skipped: true,
                ..TickReport::default()
            });
        }

        let output = self.machine.tick(self.wall_clock.now(uptime_ms));
        let enqueued = match output.frame {
            Some(frame) => self.render(&frame, output.smooth, scheduler)?,
            None => 0,
        };

        Ok(TickReport {
            skipped: false,
            enqueued,
            alarm_fired: output.alarm_fired,
            transition: output.transition,
        })
    }

    /// Apply an inbound command
    ///
    /// Settings-bearing commands are written through to `store`; the
    /// in-memory change is kept even if the store write fails.
    pub fn apply(
        &mut self,
        command: Command,
        uptime_ms: u64,
        store: &mut impl SettingsStore,
    ) -> Result<(), CommandError> {
        match command {
            Command::SetNumber(digits) => {
                if digits.iter().any(|&d| d > 9) {
                    return Err(CommandError::InvalidDigit);
                }
                self.machine.set_number(digits);
            }
            Command::SetCountdown(seconds) => self.machine.set_countdown(seconds),
            Command::SetTimer(op) => self.machine.timer(op),
            Command::Shutdown => self.machine.shutdown(),
            Command::Idle => self.machine.idle(),
            Command::ShowTime => self.machine.show_time(),
            Command::SelfTest => self.machine.self_test(),
            Command::SetServoSilent(silent) => {
                self.machine.set_servo_silent(silent);
                save_servo_silent(store, silent)?;
            }
            Command::Set12Hour(enabled) => self.machine.set_12_hour(enabled),
            Command::SetSleepWindow {
                enabled,
                start,
                end,
            } => {
                let window = SleepWindow {
                    enabled,
                    start: validate_time(start)?,
                    end: validate_time(end)?,
                };
                self.machine.set_sleep_window(window);
                save_sleep_window(store, &window)?;
            }
            Command::SetTimezone { hours, minutes } => {
                let timezone = TimezoneOffset::new_clamped(hours as i32, minutes as i32);
                self.wall_clock.set_timezone(timezone);
                save_timezone(store, timezone)?;
            }
            Command::SetAlarm(alarm) => {
                let alarm = alarm.map(validate_time).transpose()?;
                self.machine.set_alarm(alarm);
            }
            Command::SyncTime { unix_secs } => self.wall_clock.sync(unix_secs, uptime_ms),
            Command::SetOffsets(offsets) => {
                self.calibration.set_offsets(offsets);
                self.machine.set_number([8; 4]);
                save_offsets(store, &offsets)?;
            }
            Command::SetOffset { channel, value } => {
                let channel = Channel::new(channel).ok_or(CommandError::InvalidChannel)?;
                self.calibration.set_offset(channel, value);
                self.machine.set_number([8; 4]);
                save_offsets(store, self.calibration.offsets())?;
            }
        }
        Ok(())
    }

    /// Snapshot for diagnostics
    pub fn status(&self, driver_available: bool) -> ClockStatus {
        ClockStatus {
            mode: self.machine.mode(),
            driver_available,
            time_ready: self.wall_clock.is_ready(),
            silent: self.machine.is_silent(),
            variant: self.calibration.variant(),
            offsets: *self.calibration.offsets(),
        }
    }
}

fn validate_time(time: HourMinute) -> Result<HourMinute, CommandError> {
    HourMinute::new(time.hour, time.minute).ok_or(CommandError::InvalidTime)
}
