//! Dual PCA9685 servo bank
//!
//! Two PCA9685 16-channel PWM chips share one I2C bus. Each drives 14 of
//! the 28 pointer servos: the hours chip serves channels 0-13, the minutes
//! chip 14-27. Within a chip the logical channel is remapped to a physical
//! pin through [`PIN_MAP`] to match the board wiring.
//!
//! # Register Protocol
//!
//! Every register write is a two-byte I2C write `[register, value]`. A PWM
//! update writes the four LEDn registers (ON low/high, OFF low/high) one at
//! a time, each retried up to [`WRITE_RETRIES`] times.
//!
//! # Degraded Mode
//!
//! If either chip fails to initialize after [`INIT_RETRIES`] attempts the
//! bank is marked unavailable and every later write is a silent no-op.

use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use heptaclock_core::layout::{Channel, Chip, CHANNELS_PER_CHIP};
use heptaclock_core::traits::{ServoError, ServoOutput};

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// Mode register 2
    pub const MODE2: u8 = 0x01;
    /// LED0 output, ON count low byte (LEDn = LED0 + 4 * n)
    pub const LED0_ON_L: u8 = 0x06;
    /// PWM frequency prescaler
    pub const PRESCALE: u8 = 0xFE;
}

/// MODE1/MODE2 bits
pub mod mode {
    /// MODE1: oscillator off, required to change the prescaler
    pub const SLEEP: u8 = 0x10;
    /// MODE1: restart PWM channels after sleep
    pub const RESTART: u8 = 0x80;
    /// MODE2: totem-pole outputs
    pub const OUTDRV: u8 = 0x04;
}

/// Default I2C address of the hours chip
pub const HOURS_ADDRESS: u8 = 0x47;

/// Default I2C address of the minutes chip
pub const MINUTES_ADDRESS: u8 = 0x41;

/// Internal oscillator frequency
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Servo PWM frequency
pub const SERVO_FREQUENCY_HZ: u32 = 50;

/// Attempts per register write
pub const WRITE_RETRIES: u8 = 3;

/// Attempts at bringing up both chips
pub const INIT_RETRIES: u8 = 3;

/// Logical channel (0-13) to physical pin
pub const PIN_MAP: [u8; CHANNELS_PER_CHIP as usize] =
    [8, 9, 10, 11, 12, 13, 0, 1, 2, 3, 4, 5, 6, 7];

/// Prescaler value for an output frequency
///
/// `osc / (4096 * freq) - 1`, truncating.
pub const fn prescale_for(frequency_hz: u32, oscillator_hz: u32) -> u8 {
    let value = oscillator_hz / (4096 * frequency_hz);
    let value = if value == 0 { 0 } else { value - 1 };
    if value > 0xFF {
        0xFF
    } else {
        value as u8
    }
}

/// First LEDn register for a physical pin
pub const fn led_base(pin: u8) -> u8 {
    reg::LED0_ON_L + 4 * pin
}

/// Servo bank configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoBankConfig {
    /// Address of the chip driving channels 0-13
    pub hours_address: u8,
    /// Address of the chip driving channels 14-27
    pub minutes_address: u8,
    /// PWM frequency in Hz
    pub frequency_hz: u32,
}

impl Default for ServoBankConfig {
    fn default() -> Self {
        Self {
            hours_address: HOURS_ADDRESS,
            minutes_address: MINUTES_ADDRESS,
            frequency_hz: SERVO_FREQUENCY_HZ,
        }
    }
}

/// Two PCA9685 chips on one bus
pub struct ServoBank<I2C> {
    i2c: I2C,
    config: ServoBankConfig,
    available: bool,
    motion_disabled: bool,
    /// Register writes abandoned after all retries
    failed_writes: u32,
    last_error: Option<ErrorKind>,
}

impl<I2C: I2c> ServoBank<I2C> {
    /// Create a bank; call [`init`](Self::init) before use
    pub fn new(i2c: I2C, config: ServoBankConfig) -> Self {
        Self {
            i2c,
            config,
            available: false,
            motion_disabled: false,
            failed_writes: 0,
            last_error: None,
        }
    }

    /// Bring up both chips
    ///
    /// Retried as a whole up to [`INIT_RETRIES`] times. On failure the bank
    /// stays unavailable and writes become no-ops.
    pub async fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), ServoError> {
        for _ in 0..INIT_RETRIES {
            let hours = self.init_chip(self.config.hours_address, delay).await;
            let minutes = self.init_chip(self.config.minutes_address, delay).await;
            if hours.is_ok() && minutes.is_ok() {
                self.available = true;
                return Ok(());
            }
            delay.delay_ms(10).await;
        }

        self.available = false;
        Err(ServoError::Unavailable)
    }

    async fn init_chip(
        &mut self,
        address: u8,
        delay: &mut impl DelayNs,
    ) -> Result<(), ServoError> {
        let prescale = prescale_for(self.config.frequency_hz, OSCILLATOR_HZ);
        self.write_register(address, reg::MODE1, 0x00).await?;
        self.write_register(address, reg::MODE2, mode::OUTDRV).await?;
        self.write_register(address, reg::MODE1, mode::SLEEP).await?;
        self.write_register(address, reg::PRESCALE, prescale).await?;
        delay.delay_us(500).await;
        // Clears SLEEP and restarts the outputs in one write
        self.write_register(address, reg::MODE1, mode::RESTART).await
    }

    /// Write one register with bounded retries
    async fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), ServoError> {
        for _ in 0..WRITE_RETRIES {
            match self.i2c.write(address, &[register, value]).await {
                Ok(()) => return Ok(()),
                Err(e) => self.last_error = Some(e.kind()),
            }
        }

        self.failed_writes = self.failed_writes.saturating_add(1);
        Err(ServoError::Bus)
    }

    /// Whether both chips came up
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Suppress all servo writes (debug aid)
    pub fn set_motion_disabled(&mut self, disabled: bool) {
        self.motion_disabled = disabled;
    }

    /// Whether servo writes are suppressed
    pub fn is_motion_disabled(&self) -> bool {
        self.motion_disabled
    }

    /// Register writes abandoned since boot
    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    /// Bus error from the most recent failed attempt
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Chip address and physical pin for a channel
    pub fn route(&self, channel: Channel) -> (u8, u8) {
        let address = match channel.chip() {
            Chip::Hours => self.config.hours_address,
            Chip::Minutes => self.config.minutes_address,
        };
        (address, PIN_MAP[channel.chip_channel() as usize])
    }

    /// Program one channel's ON/OFF counts
    pub async fn set_pwm(
        &mut self,
        channel: Channel,
        on: u16,
        off: u16,
    ) -> Result<(), ServoError> {
        if !self.available || self.motion_disabled {
            return Ok(());
        }

        let (address, pin) = self.route(channel);
        let base = led_base(pin);
        let bytes = [
            (on & 0xFF) as u8,
            (on >> 8) as u8,
            (off & 0xFF) as u8,
            (off >> 8) as u8,
        ];
        for (offset, value) in bytes.into_iter().enumerate() {
            self.write_register(address, base + offset as u8, value).await?;
        }
        Ok(())
    }
}

impl<I2C: I2c> ServoOutput for ServoBank<I2C> {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn set_pwm(&mut self, channel: Channel, on: u16, off: u16) -> Result<(), ServoError> {
        ServoBank::set_pwm(self, channel, on, off).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use heapless::Vec;

    #[derive(Debug)]
    struct MockError;

    impl embedded_hal::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        }
    }

    /// Records writes; fails the next `fail_next` transfers, or every
    /// transfer to `dead_address`
    #[derive(Default)]
    struct MockBus {
        writes: Vec<(u8, [u8; 2]), 128>,
        fail_next: u32,
        dead_address: Option<u8>,
        attempts: u32,
    }

    impl ErrorType for MockBus {
        type Error = MockError;
    }

    impl I2c for MockBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.attempts += 1;
            if self.dead_address == Some(address) {
                return Err(MockError);
            }
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(MockError);
            }
            for op in operations {
                if let Operation::Write(bytes) = op {
                    self.writes.push((address, [bytes[0], bytes[1]])).unwrap();
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn ready_bank() -> ServoBank<MockBus> {
        let mut bank = ServoBank::new(MockBus::default(), ServoBankConfig::default());
        block_on(bank.init(&mut NoDelay)).unwrap();
        bank.i2c.writes.clear();
        bank
    }

    fn ch(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[test]
    fn test_prescale_for_servo_rate() {
        assert_eq!(prescale_for(50, OSCILLATOR_HZ), 121);
        assert_eq!(prescale_for(1_000_000, OSCILLATOR_HZ), 0);
    }

    #[test]
    fn test_init_sequence() {
        let mut bank = ServoBank::new(MockBus::default(), ServoBankConfig::default());
        block_on(bank.init(&mut NoDelay)).unwrap();
        assert!(bank.is_available());

        let hours: Vec<[u8; 2], 8> = bank
            .i2c
            .writes
            .iter()
            .filter(|(a, _)| *a == HOURS_ADDRESS)
            .map(|(_, w)| *w)
            .collect();
        assert_eq!(
            &hours[..],
            &[
                [reg::MODE1, 0x00],
                [reg::MODE2, mode::OUTDRV],
                [reg::MODE1, mode::SLEEP],
                [reg::PRESCALE, 121],
                [reg::MODE1, mode::RESTART],
            ]
        );
        assert!(bank.i2c.writes.iter().any(|(a, _)| *a == MINUTES_ADDRESS));
    }

    #[test]
    fn test_routing_and_register_layout() {
        let mut bank = ready_bank();
        // Channel 16 is minutes chip local channel 2, wired to pin 10
        block_on(bank.set_pwm(ch(16), 0, 0x01F4)).unwrap();

        let expected_base = led_base(10);
        assert_eq!(expected_base, 0x2E);
        assert_eq!(
            &bank.i2c.writes[..],
            &[
                (MINUTES_ADDRESS, [expected_base, 0x00]),
                (MINUTES_ADDRESS, [expected_base + 1, 0x00]),
                (MINUTES_ADDRESS, [expected_base + 2, 0xF4]),
                (MINUTES_ADDRESS, [expected_base + 3, 0x01]),
            ]
        );
        assert_eq!(bank.route(ch(6)), (HOURS_ADDRESS, 0));
    }

    #[test]
    fn test_write_retries_then_succeeds() {
        let mut bank = ready_bank();
        bank.i2c.fail_next = WRITE_RETRIES as u32 - 1;
        block_on(bank.set_pwm(ch(0), 0, 300)).unwrap();
        assert_eq!(bank.i2c.writes.len(), 4);
        assert_eq!(bank.failed_writes(), 0);
        assert!(bank.last_error().is_some());
    }

    #[test]
    fn test_write_gives_up_after_retries() {
        let mut bank = ready_bank();
        bank.i2c.fail_next = WRITE_RETRIES as u32;
        let result = block_on(bank.set_pwm(ch(0), 0, 300));
        assert_eq!(result, Err(ServoError::Bus));
        assert_eq!(bank.failed_writes(), 1);
        assert_eq!(
            bank.last_error(),
            Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
    }

    #[test]
    fn test_dead_chip_marks_bank_unavailable() {
        let bus = MockBus {
            dead_address: Some(MINUTES_ADDRESS),
            ..MockBus::default()
        };
        let mut bank = ServoBank::new(bus, ServoBankConfig::default());
        assert_eq!(block_on(bank.init(&mut NoDelay)), Err(ServoError::Unavailable));
        assert!(!bank.is_available());

        // Writes are silently dropped
        let attempts = bank.i2c.attempts;
        block_on(bank.set_pwm(ch(0), 0, 300)).unwrap();
        assert_eq!(bank.i2c.attempts, attempts);
    }

    #[test]
    fn test_motion_disabled_skips_bus() {
        let mut bank = ready_bank();
        bank.set_motion_disabled(true);
        block_on(ServoOutput::set_position(&mut bank, ch(3), 250)).unwrap();
        assert!(bank.i2c.writes.is_empty());

        bank.set_motion_disabled(false);
        block_on(ServoOutput::set_position(&mut bank, ch(3), 250)).unwrap();
        assert_eq!(bank.i2c.writes.len(), 4);
    }
}
