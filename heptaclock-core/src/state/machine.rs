//! Mode state machine
//!
//! Runs once per tick. Applies the sleep window and the alarm, then decides
//! which four glyphs the display should show. Commands switch modes
//! directly; the sleep window is the only automatic transition.

use super::events::TimerOp;
use super::mode::Mode;
use crate::config::SleepWindow;
use crate::glyph::{
    blank_frame, clock_digits, digits_frame, idle_frame, mmss_digits, Frame,
};
use crate::time::{HourMinute, TimeOfDay};

/// What a tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutput {
    /// Frame to show, `None` when the display should not change
    pub frame: Option<Frame>,
    /// Use smooth steps for this frame
    pub smooth: bool,
    /// The alarm minute was reached this tick
    pub alarm_fired: bool,
    /// Mode entered through the sleep window this tick
    pub transition: Option<Mode>,
}

/// Clock mode state machine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeMachine {
    mode: Mode,
    /// Stopwatch seconds, kept across stop/start
    timer_elapsed: u32,
    twelve_hour: bool,
    silent: bool,
    sleep: SleepWindow,
    alarm: Option<HourMinute>,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new(false, SleepWindow::default())
    }
}

impl ModeMachine {
    /// Create a machine in wall-clock mode
    pub fn new(silent: bool, sleep: SleepWindow) -> Self {
        Self {
            mode: Mode::Normal,
            timer_elapsed: 0,
            twelve_hour: false,
            silent,
            sleep,
            alarm: None,
        }
    }

    /// Active mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Smooth-step preference for clock updates
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Current sleep window
    pub fn sleep_window(&self) -> SleepWindow {
        self.sleep
    }

    /// Armed alarm, if any
    pub fn alarm(&self) -> Option<HourMinute> {
        self.alarm
    }

    /// Show fixed digits
    pub fn set_number(&mut self, digits: [u8; 4]) {
        self.mode = Mode::Manual(digits);
    }

    /// Count down from `seconds`
    pub fn set_countdown(&mut self, seconds: u32) {
        self.mode = Mode::Countdown {
            remaining: seconds.min(i32::MAX as u32) as i32,
        };
    }

    /// Stopwatch control
    pub fn timer(&mut self, op: TimerOp) {
        match op {
            TimerOp::Reset => {
                self.timer_elapsed = 0;
                self.mode = Mode::Manual([0; 4]);
            }
            TimerOp::Start => self.mode = Mode::Timer,
            TimerOp::Stop => self.mode = Mode::Manual(mmss_digits(self.timer_elapsed)),
        }
    }

    /// All pointers off
    pub fn shutdown(&mut self) {
        self.mode = Mode::Shutdown;
    }

    /// Sleep glyph
    pub fn idle(&mut self) {
        self.mode = Mode::Idle;
    }

    /// Back to the wall clock
    pub fn show_time(&mut self) {
        self.mode = Mode::Normal;
    }

    /// Alternate 8888 and blank
    pub fn self_test(&mut self) {
        self.mode = Mode::Test { lit: true };
    }

    pub fn set_servo_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn set_12_hour(&mut self, enabled: bool) {
        self.twelve_hour = enabled;
    }

    pub fn set_sleep_window(&mut self, window: SleepWindow) {
        self.sleep = window;
    }

    pub fn set_alarm(&mut self, alarm: Option<HourMinute>) {
        self.alarm = alarm;
    }

    /// Run one tick
    ///
    /// `now` is the local time, or `None` while the wall clock has not been
    /// synchronized; the sleep window and alarm are skipped in that case
    /// and wall-clock mode produces no frame.
    pub fn tick(&mut self, now: Option<TimeOfDay>) -> TickOutput {
        let mut output = TickOutput::default();

        if let Some(now) = now {
            let minute = now.hour_minute();
            if let Some(next) = self.sleep_transition(minute) {
                self.mode = next;
                output.transition = Some(next);
            }
            if self.alarm == Some(minute) {
                self.alarm = None;
                output.alarm_fired = true;
            }
        }

        output.frame = self.next_frame(now);
        output.smooth = self.mode.is_clock() && self.silent;
        output
    }

    fn sleep_transition(&self, minute: HourMinute) -> Option<Mode> {
        if !self.sleep.enabled {
            return None;
        }
        if minute == self.sleep.start && self.mode != Mode::Idle {
            Some(Mode::Idle)
        } else if minute == self.sleep.end && self.mode == Mode::Idle {
            Some(Mode::Normal)
        } else {
            None
        }
    }

    fn next_frame(&mut self, now: Option<TimeOfDay>) -> Option<Frame> {
        match self.mode {
            Mode::Shutdown => Some(blank_frame()),
            Mode::Idle => Some(idle_frame()),
            Mode::Manual(digits) => Some(digits_frame(digits)),
            Mode::Countdown { remaining } => {
                if remaining < 0 {
                    return None;
                }
                self.mode = Mode::Countdown {
                    remaining: remaining - 1,
                };
                Some(digits_frame(mmss_digits(remaining as u32)))
            }
            Mode::Timer => {
                self.timer_elapsed = self.timer_elapsed.saturating_add(1);
                Some(digits_frame(mmss_digits(self.timer_elapsed)))
            }
            Mode::Normal => now.map(|t| {
                let hour = display_hour(t.hour, self.twelve_hour);
                digits_frame(clock_digits(hour, t.minute))
            }),
            Mode::Test { lit } => {
                self.mode = Mode::Test { lit: !lit };
                Some(if lit {
                    digits_frame([8; 4])
                } else {
                    blank_frame()
                })
            }
        }
    }
}

/// Hour as shown, converting 0-23 to 1-12 when requested
pub const fn display_hour(hour: u8, twelve_hour: bool) -> u8 {
    if !twelve_hour {
        hour
    } else if hour > 12 {
        hour - 12
    } else if hour == 0 {
        12
    } else {
        hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8) -> Option<TimeOfDay> {
        Some(TimeOfDay {
            hour,
            minute,
            second: 0,
        })
    }

    fn sleepy() -> ModeMachine {
        ModeMachine::new(
            false,
            SleepWindow {
                enabled: true,
                start: HourMinute::new_clamped(22, 0),
                end: HourMinute::new_clamped(7, 0),
            },
        )
    }

    #[test]
    fn test_initial_mode_is_normal() {
        assert_eq!(ModeMachine::default().mode(), Mode::Normal);
    }

    #[test]
    fn test_normal_waits_for_time() {
        let mut m = ModeMachine::default();
        assert_eq!(m.tick(None).frame, None);
        assert_eq!(m.tick(at(9, 41)).frame, Some(digits_frame([0, 9, 4, 1])));
    }

    #[test]
    fn test_twelve_hour_display() {
        let mut m = ModeMachine::default();
        m.set_12_hour(true);
        assert_eq!(m.tick(at(0, 5)).frame, Some(digits_frame([1, 2, 0, 5])));
        assert_eq!(m.tick(at(13, 0)).frame, Some(digits_frame([0, 1, 0, 0])));
        assert_eq!(m.tick(at(12, 30)).frame, Some(digits_frame([1, 2, 3, 0])));
    }

    #[test]
    fn test_smooth_only_for_silent_clock() {
        let mut m = ModeMachine::new(true, SleepWindow::default());
        assert!(m.tick(at(1, 0)).smooth);
        m.set_number([1, 2, 3, 4]);
        assert!(!m.tick(at(1, 0)).smooth);
    }

    #[test]
    fn test_countdown_freezes_at_zero() {
        let mut m = ModeMachine::default();
        m.set_countdown(125);
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 2, 0, 5])));
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 2, 0, 4])));

        m.set_countdown(1);
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 0, 0, 1])));
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 0, 0, 0])));
        assert_eq!(m.tick(None).frame, None);
        assert_eq!(m.tick(None).frame, None);
    }

    #[test]
    fn test_timer_stop_start_reset() {
        let mut m = ModeMachine::default();
        m.timer(TimerOp::Start);
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 0, 0, 1])));
        m.tick(None);

        m.timer(TimerOp::Stop);
        assert_eq!(m.mode(), Mode::Manual([0, 0, 0, 2]));

        m.timer(TimerOp::Start);
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 0, 0, 3])));

        m.timer(TimerOp::Reset);
        assert_eq!(m.mode(), Mode::Manual([0; 4]));
        m.timer(TimerOp::Start);
        assert_eq!(m.tick(None).frame, Some(digits_frame([0, 0, 0, 1])));
    }

    #[test]
    fn test_shutdown_always_blank() {
        let mut m = ModeMachine::default();
        m.timer(TimerOp::Start);
        m.set_alarm(HourMinute::new(3, 0));
        m.shutdown();
        let out = m.tick(at(3, 0));
        assert_eq!(out.frame, Some(blank_frame()));
        assert!(out.alarm_fired);
    }

    #[test]
    fn test_sleep_window_transitions() {
        let mut m = sleepy();
        let out = m.tick(at(22, 0));
        assert_eq!(out.transition, Some(Mode::Idle));
        assert_eq!(out.frame, Some(idle_frame()));

        // Same minute again: already idle, nothing to do
        assert_eq!(m.tick(at(22, 0)).transition, None);
        assert_eq!(m.tick(at(3, 15)).transition, None);

        let out = m.tick(at(7, 0));
        assert_eq!(out.transition, Some(Mode::Normal));
        assert_eq!(out.frame, Some(digits_frame([0, 7, 0, 0])));
        assert_eq!(m.tick(at(7, 0)).transition, None);
    }

    #[test]
    fn test_sleep_end_ignored_when_awake() {
        let mut m = sleepy();
        m.set_number([4, 2, 4, 2]);
        assert_eq!(m.tick(at(7, 0)).transition, None);
        assert_eq!(m.mode(), Mode::Manual([4, 2, 4, 2]));
    }

    #[test]
    fn test_sleep_disabled() {
        let mut m = ModeMachine::default();
        assert_eq!(m.tick(at(22, 0)).transition, None);
        assert_eq!(m.mode(), Mode::Normal);
    }

    #[test]
    fn test_alarm_fires_once() {
        let mut m = ModeMachine::default();
        m.set_alarm(HourMinute::new(6, 30));
        assert!(!m.tick(at(6, 29)).alarm_fired);
        assert!(m.tick(at(6, 30)).alarm_fired);
        assert!(!m.tick(at(6, 30)).alarm_fired);
        assert_eq!(m.alarm(), None);
    }

    #[test]
    fn test_self_test_alternates() {
        let mut m = ModeMachine::default();
        m.self_test();
        assert_eq!(m.tick(None).frame, Some(digits_frame([8; 4])));
        assert_eq!(m.tick(None).frame, Some(blank_frame()));
        assert_eq!(m.tick(None).frame, Some(digits_frame([8; 4])));
    }
}
