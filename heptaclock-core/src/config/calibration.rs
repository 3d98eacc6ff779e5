//! Servo calibration: base position tables and per-channel offsets
//!
//! Two hardware revisions exist with differently mounted servos. The
//! revision is read from a strap pin at boot and fixes the base tables for
//! the lifetime of the device. Offsets are trimmed per unit through the
//! configuration surface and persisted as a `|`-separated string.

use core::fmt::Write;

use heapless::String;

use crate::layout::{Channel, ChannelMap, Segment, CHANNEL_COUNT, SEGMENT_COUNT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lowest raw position the pointers may be driven to
pub const SERVO_MIN: u16 = 100;

/// Highest raw position the pointers may be driven to
pub const SERVO_MAX: u16 = 550;

/// Capacity of the serialized offset string (28 values of up to 6 chars plus separators)
pub const OFFSETS_TEXT_LEN: usize = 256;

/// Clamp any intermediate position into the safe travel range
pub const fn clamp_position(raw: i32) -> u16 {
    if raw < SERVO_MIN as i32 {
        SERVO_MIN
    } else if raw > SERVO_MAX as i32 {
        SERVO_MAX
    } else {
        raw as u16
    }
}

/// Hardware revision selecting the base position tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ServoVariant {
    /// Original mounting (strap pin high)
    #[default]
    A,
    /// Revised mounting (strap pin pulled low)
    B,
}

const VARIANT_A_ENGAGED: [u16; SEGMENT_COUNT] = [110, 110, 120, 330, 330, 310, 110];
const VARIANT_A_DISENGAGED: [u16; SEGMENT_COUNT] = [300, 300, 310, 140, 140, 120, 300];
const VARIANT_B_ENGAGED: [u16; SEGMENT_COUNT] = [325; SEGMENT_COUNT];
const VARIANT_B_DISENGAGED: [u16; SEGMENT_COUNT] = [525, 525, 525, 125, 125, 125, 525];

impl ServoVariant {
    /// Select the variant from the strap pin level
    pub const fn from_strap(pin_high: bool) -> Self {
        if pin_high {
            ServoVariant::A
        } else {
            ServoVariant::B
        }
    }

    /// Base position with the segment engaged, before offsets
    pub const fn engaged_base(self, segment: Segment) -> u16 {
        match self {
            ServoVariant::A => VARIANT_A_ENGAGED[segment.index()],
            ServoVariant::B => VARIANT_B_ENGAGED[segment.index()],
        }
    }

    /// Base position with the segment disengaged, before offsets
    pub const fn disengaged_base(self, segment: Segment) -> u16 {
        match self {
            ServoVariant::A => VARIANT_A_DISENGAGED[segment.index()],
            ServoVariant::B => VARIANT_B_DISENGAGED[segment.index()],
        }
    }

    /// Distance a vertical pointer backs off while the middle pointer sweeps
    pub const fn avoidance_clearance(self) -> u16 {
        match self {
            ServoVariant::A => 120,
            ServoVariant::B => 50,
        }
    }
}

/// Per-channel signed trim added to both base tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoOffsets(pub [i16; CHANNEL_COUNT]);

impl ServoOffsets {
    /// All offsets zero
    pub const fn zero() -> Self {
        Self([0; CHANNEL_COUNT])
    }

    /// Offset for one channel
    pub fn get(&self, channel: Channel) -> i16 {
        self.0[channel.index()]
    }

    /// Replace the offset for one channel
    pub fn set(&mut self, channel: Channel, value: i16) {
        self.0[channel.index()] = value;
    }

    /// Parse the persisted `a|b|c|...` form
    ///
    /// Missing trailing entries stay zero; malformed entries are skipped
    /// and leave their slot at zero. Entries past the 28th are ignored.
    pub fn parse(text: &str) -> Self {
        let mut offsets = Self::zero();
        for (slot, field) in offsets.0.iter_mut().zip(text.split('|')) {
            if let Ok(value) = field.trim().parse::<i16>() {
                *slot = value;
            }
        }
        offsets
    }

    /// Serialize to the persisted `a|b|c|...` form
    pub fn to_text(&self) -> String<OFFSETS_TEXT_LEN> {
        let mut text = String::new();
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                let _ = text.push('|');
            }
            // 28 * "-32768|" fits in the buffer
            let _ = write!(text, "{}", value);
        }
        text
    }
}

/// Active calibration: the strapped variant plus the current offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    variant: ServoVariant,
    offsets: ServoOffsets,
}

impl Calibration {
    /// Create a calibration for `variant` with the given offsets
    pub const fn new(variant: ServoVariant, offsets: ServoOffsets) -> Self {
        Self { variant, offsets }
    }

    /// Strapped hardware variant
    pub const fn variant(&self) -> ServoVariant {
        self.variant
    }

    /// Current offsets
    pub const fn offsets(&self) -> &ServoOffsets {
        &self.offsets
    }

    /// Replace all offsets
    pub fn set_offsets(&mut self, offsets: ServoOffsets) {
        self.offsets = offsets;
    }

    /// Replace one offset
    pub fn set_offset(&mut self, channel: Channel, value: i16) {
        self.offsets.set(channel, value);
    }

    /// Engaged position for `channel`, offset and clamped
    pub fn engaged(&self, channel: Channel) -> u16 {
        self.trimmed(channel, self.variant.engaged_base(channel.segment()))
    }

    /// Disengaged position for `channel`, offset and clamped
    pub fn disengaged(&self, channel: Channel) -> u16 {
        self.trimmed(channel, self.variant.disengaged_base(channel.segment()))
    }

    /// Position for `channel` given whether its segment is lit
    pub fn position_for(&self, channel: Channel, lit: bool) -> u16 {
        if lit {
            self.engaged(channel)
        } else {
            self.disengaged(channel)
        }
    }

    /// Parking position for a vertical neighbour of the middle pointer
    ///
    /// Segment B backs off upward from engaged, segment F downward. Other
    /// segments never need to avoid and return their engaged position.
    pub fn avoidance(&self, channel: Channel) -> u16 {
        let engaged = self.engaged(channel) as i32;
        let clearance = self.variant.avoidance_clearance() as i32;
        match channel.segment() {
            Segment::B => clamp_position(engaged + clearance),
            Segment::F => clamp_position(engaged - clearance),
            _ => engaged as u16,
        }
    }

    /// Power-on position of every channel: each pointer disengaged
    pub fn initial_positions(&self) -> ChannelMap<u16> {
        ChannelMap::from_fn(|channel| self.disengaged(channel))
    }

    fn trimmed(&self, channel: Channel, base: u16) -> u16 {
        clamp_position(base as i32 + self.offsets.get(channel) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DigitPos;

    #[test]
    fn test_clamp_position() {
        assert_eq!(clamp_position(-5), SERVO_MIN);
        assert_eq!(clamp_position(99), SERVO_MIN);
        assert_eq!(clamp_position(300), 300);
        assert_eq!(clamp_position(551), SERVO_MAX);
        assert_eq!(clamp_position(i32::MAX), SERVO_MAX);
    }

    #[test]
    fn test_variant_from_strap() {
        assert_eq!(ServoVariant::from_strap(true), ServoVariant::A);
        assert_eq!(ServoVariant::from_strap(false), ServoVariant::B);
    }

    #[test]
    fn test_tables_repeat_per_digit() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        for digit in DigitPos::ALL {
            assert_eq!(cal.engaged(Channel::at(digit, Segment::D)), 330);
            assert_eq!(cal.disengaged(Channel::at(digit, Segment::G)), 300);
        }
    }

    #[test]
    fn test_offsets_apply_and_clamp() {
        let mut cal = Calibration::new(ServoVariant::B, ServoOffsets::zero());
        let ch = Channel::at(DigitPos::HourUnits, Segment::A);
        cal.set_offset(ch, 10);
        assert_eq!(cal.engaged(ch), 335);
        assert_eq!(cal.disengaged(ch), 535);

        cal.set_offset(ch, 26);
        assert_eq!(cal.disengaged(ch), SERVO_MAX);
        cal.set_offset(ch, 10_000);
        assert_eq!(cal.disengaged(ch), SERVO_MAX);
        assert_eq!(cal.engaged(ch), SERVO_MAX);

        cal.set_offset(ch, -1000);
        assert_eq!(cal.engaged(ch), SERVO_MIN);
        assert_eq!(cal.disengaged(ch), SERVO_MIN);
    }

    #[test]
    fn test_avoidance_direction() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        let b = Channel::at(DigitPos::HourTens, Segment::B);
        let f = Channel::at(DigitPos::HourTens, Segment::F);
        assert_eq!(cal.avoidance(b), 110 + 120);
        assert_eq!(cal.avoidance(f), 310 - 120);

        let cal = Calibration::new(ServoVariant::B, ServoOffsets::zero());
        assert_eq!(cal.avoidance(b), 375);
        assert_eq!(cal.avoidance(f), 275);
    }

    #[test]
    fn test_offsets_text_round_trip() {
        let mut offsets = ServoOffsets::zero();
        offsets.0[0] = -12;
        offsets.0[27] = 40;
        let text = offsets.to_text();
        assert!(text.starts_with("-12|0|"));
        assert!(text.ends_with("|40"));
        assert_eq!(ServoOffsets::parse(&text), offsets);
    }

    #[test]
    fn test_offsets_parse_tolerates_short_and_malformed() {
        let offsets = ServoOffsets::parse("5|x|-3");
        assert_eq!(offsets.0[0], 5);
        assert_eq!(offsets.0[1], 0);
        assert_eq!(offsets.0[2], -3);
        assert!(offsets.0[3..].iter().all(|&v| v == 0));

        assert_eq!(ServoOffsets::parse(""), ServoOffsets::zero());
    }

    #[test]
    fn test_initial_positions_are_disengaged() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        let positions = cal.initial_positions();
        for channel in Channel::all() {
            assert_eq!(positions[channel], cal.disengaged(channel));
        }
    }
}
