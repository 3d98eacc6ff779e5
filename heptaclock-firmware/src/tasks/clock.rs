//! Clock task
//!
//! Owns the servo bank. On every tick it lets the controller plan the
//! next frame, then drains the motion queue one step at a time: the queue
//! lock is held only to pick the next step, never across the I2C write or
//! the settle delay.

use defmt::*;
use embassy_rp::i2c::{Async, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{with_timeout, Duration, Instant, Timer};
use portable_atomic::Ordering;

use heptaclock_core::scheduler::{Advance, DrainStats, SETTLE_DELAY_MS};
use heptaclock_core::traits::ServoOutput;
use heptaclock_drivers::servo::ServoBank;

use crate::channels::{
    publish_status, ControllerMutex, SchedulerMutex, DRIVER_AVAILABLE, LOCK_TIMEOUT,
};
use crate::tasks::tick::TICK_SIGNAL;

/// I2C bus type shared by both PWM chips
pub type ServoBus = I2c<'static, I2C0, Async>;

/// Minimum spacing of the "driver unavailable" warning
const UNAVAILABLE_WARN_INTERVAL: Duration = Duration::from_secs(20);

/// Clock task - tick handling and motion drain
#[embassy_executor::task]
pub async fn clock_task(
    controller: &'static ControllerMutex,
    scheduler: &'static SchedulerMutex,
    mut bank: ServoBank<ServoBus>,
) {
    info!("Clock task started");

    // The boot frame was queued before the task was spawned
    let stats = drain(scheduler, &mut bank).await;
    info!("Boot frame done: {} steps in {} rounds", stats.steps, stats.rounds);

    let mut last_unavailable_warning: Option<Instant> = None;

    loop {
        let now_ms = TICK_SIGNAL.wait().await;

        if !bank.is_available() {
            let due = last_unavailable_warning
                .map(|at| at.elapsed() >= UNAVAILABLE_WARN_INTERVAL)
                .unwrap_or(true);
            if due {
                warn!("Servo driver unavailable");
                last_unavailable_warning = Some(Instant::now());
            }
        }

        let Ok(mut clock) = with_timeout(LOCK_TIMEOUT, controller.lock()).await else {
            warn!("Controller busy, skipping tick");
            continue;
        };
        let Ok(mut queue) = with_timeout(LOCK_TIMEOUT, scheduler.lock()).await else {
            warn!("Motion queue busy, skipping tick");
            continue;
        };

        let result = clock.tick(now_ms, &mut queue);
        publish_status(clock.status(DRIVER_AVAILABLE.load(Ordering::Relaxed)));
        drop(queue);
        drop(clock);

        match result {
            Ok(report) if report.skipped => {
                debug!("Motion still queued, tick skipped");
                continue;
            }
            Ok(report) => {
                if let Some(mode) = report.transition {
                    info!("Sleep window: entered {}", mode.name());
                }
                if report.alarm_fired {
                    info!("Alarm");
                }
                if report.enqueued == 0 {
                    continue;
                }
                trace!("Tick queued {} tasks", report.enqueued);
            }
            Err(e) => {
                warn!("Failed to queue motion: {:?}", e);
            }
        }

        let stats = drain(scheduler, &mut bank).await;
        trace!("Drained {} steps in {} rounds", stats.steps, stats.rounds);
    }
}

/// Run the queue until it is empty
///
/// Write failures are absorbed by the bank; the scheduler has already
/// recorded the new position.
async fn drain(scheduler: &SchedulerMutex, bank: &mut ServoBank<ServoBus>) -> DrainStats {
    let mut stats = DrainStats::default();

    loop {
        let advance = match with_timeout(LOCK_TIMEOUT, scheduler.lock()).await {
            Ok(mut queue) => queue.advance(),
            Err(_) => {
                warn!("Motion queue busy, retrying");
                continue;
            }
        };

        match advance {
            Advance::Step(step) => {
                if let Err(e) = bank.set_position(step.channel, step.position).await {
                    debug!(
                        "Servo write on {} dropped: {:?} ({})",
                        step.channel.raw(),
                        e,
                        Debug2Format(&bank.last_error())
                    );
                }
                stats.steps += 1;
                Timer::after_millis(SETTLE_DELAY_MS).await;
            }
            Advance::RoundEnd { restarted } => {
                stats.rounds += 1;
                if !restarted {
                    Timer::after_millis(SETTLE_DELAY_MS).await;
                }
            }
            Advance::Drained => return stats,
        }
    }
}
