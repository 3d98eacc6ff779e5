//! Heptaclock - Servo Seven-Segment Clock Firmware
//!
//! Main firmware binary for the RP2040 board driving 28 pointer servos
//! through two PCA9685 PWM chips.
//!
//! Boot order: strap, settings, controller, servo bank, boot frame, tasks.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use heptaclock_core::config::ClockSettings;
use heptaclock_core::scheduler::Scheduler;
use heptaclock_core::ClockController;
use heptaclock_drivers::servo::{ServoBank, ServoBankConfig};
use heptaclock_hal::I2cConfig;
use heptaclock_hal_rp2040::flash::FlashStorage;
use heptaclock_hal_rp2040::strap::detect_variant;

use crate::channels::{ControllerMutex, SchedulerMutex, DRIVER_AVAILABLE, STORE};
use crate::config::load_settings;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// Shared state handed to tasks (must live forever)
static CONTROLLER: StaticCell<ControllerMutex> = StaticCell::new();
static SCHEDULER: StaticCell<SchedulerMutex> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Heptaclock firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Hardware variant strap (board-specific: GPIO22)
    let variant = detect_variant(p.PIN_22).await;

    // Settings come before the first frame
    let mut flash = FlashStorage::new(p.FLASH, p.DMA_CH0);
    let store = load_settings(&mut flash).await;
    let settings = ClockSettings::load(&store);
    *STORE.lock().await = store;
    info!(
        "Settings: silent={}, sleep={} {}:{}-{}:{}, tz={}h{}m",
        settings.servo_silent,
        settings.sleep.enabled,
        settings.sleep.start.hour,
        settings.sleep.start.minute,
        settings.sleep.end.hour,
        settings.sleep.end.minute,
        settings.timezone.hours,
        settings.timezone.minutes
    );

    let controller = ClockController::new(variant, &settings);
    let mut scheduler = Scheduler::new(controller.initial_positions());
    match controller.boot(&mut scheduler) {
        Ok(count) => info!("Boot frame queued: {} tasks", count),
        Err(e) => warn!("Failed to queue boot frame: {:?}", e),
    }

    // Servo bus (board-specific: SDA=GPIO4, SCL=GPIO5)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2cConfig::FAST.frequency;
    let bus = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);

    let mut bank = ServoBank::new(bus, ServoBankConfig::default());
    match bank.init(&mut Delay).await {
        Ok(()) => info!("Servo bank initialized"),
        Err(e) => error!(
            "Servo bank init failed: {:?} ({}), running without output",
            e,
            Debug2Format(&bank.last_error())
        ),
    }
    DRIVER_AVAILABLE.store(bank.is_available(), Ordering::Relaxed);

    // Front-panel button (board-specific: GPIO15, active low)
    let button = Input::new(p.PIN_15, Pull::Up);

    let controller = CONTROLLER.init(Mutex::new(controller));
    let scheduler = SCHEDULER.init(Mutex::new(scheduler));

    // Spawn tasks
    spawner.spawn(tasks::clock_task(controller, scheduler, bank)).unwrap();
    spawner.spawn(tasks::command_task(controller)).unwrap();
    spawner.spawn(tasks::settings_task(flash)).unwrap();
    spawner
        .spawn(tasks::button_task(button, tasks::button::ButtonConfig::default()))
        .unwrap();
    spawner.spawn(tasks::tick_task()).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        match channels::latest_status() {
            Some(status) => debug!("Status: {}", status),
            None => trace!("Main loop heartbeat"),
        }
    }
}
