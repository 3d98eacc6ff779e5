//! Glyph frame to target positions

use crate::config::Calibration;
use crate::glyph::Frame;
use crate::layout::{Channel, ChannelMap};

/// Target raw position per channel
pub type Targets = ChannelMap<u16>;

/// Resolve a frame to the 28 target positions
///
/// Each pointer goes to its engaged or disengaged position depending on
/// whether its segment is lit in the digit's glyph. Results are always
/// inside the safe travel range whatever the offsets are.
pub fn resolve(frame: &Frame, calibration: &Calibration) -> Targets {
    ChannelMap::from_fn(|channel: Channel| {
        let glyph = frame[channel.digit().index()].glyph();
        calibration.position_for(channel, glyph.is_lit(channel.segment()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServoOffsets, ServoVariant, SERVO_MAX, SERVO_MIN};
    use crate::glyph::{blank_frame, digits_frame, idle_frame, GlyphSelect};
    use crate::layout::{DigitPos, Segment, CHANNEL_COUNT};
    use proptest::prelude::*;

    #[test]
    fn test_all_eights_are_engaged() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        let targets = resolve(&digits_frame([8, 8, 8, 8]), &cal);
        for channel in Channel::all() {
            assert_eq!(targets[channel], cal.engaged(channel));
        }
    }

    #[test]
    fn test_blank_frame_matches_initial_positions() {
        let cal = Calibration::new(ServoVariant::B, ServoOffsets::zero());
        assert_eq!(resolve(&blank_frame(), &cal), cal.initial_positions());
    }

    #[test]
    fn test_idle_frame_only_middle_engaged() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        let targets = resolve(&idle_frame(), &cal);
        for channel in Channel::all() {
            let lit = channel.segment() == Segment::MIDDLE;
            assert_eq!(targets[channel], cal.position_for(channel, lit));
        }
    }

    #[test]
    fn test_digits_map_to_their_positions() {
        let cal = Calibration::new(ServoVariant::A, ServoOffsets::zero());
        let frame = [
            GlyphSelect::Digit(1),
            GlyphSelect::Blank,
            GlyphSelect::Digit(7),
            GlyphSelect::Idle,
        ];
        let targets = resolve(&frame, &cal);
        let one_b = Channel::at(DigitPos::HourTens, Segment::B);
        let one_a = Channel::at(DigitPos::HourTens, Segment::A);
        assert_eq!(targets[one_b], cal.engaged(one_b));
        assert_eq!(targets[one_a], cal.disengaged(one_a));
    }

    fn any_select() -> impl Strategy<Value = GlyphSelect> {
        prop_oneof![
            (0u8..=12).prop_map(GlyphSelect::Digit),
            Just(GlyphSelect::Blank),
            Just(GlyphSelect::Idle),
        ]
    }

    fn any_calibration() -> impl Strategy<Value = Calibration> {
        (
            any::<bool>(),
            proptest::array::uniform28(prop_oneof![
                Just(10_000i16),
                Just(-10_000i16),
                any::<i16>(),
            ]),
        )
            .prop_map(|(strap, offsets)| {
                Calibration::new(ServoVariant::from_strap(strap), ServoOffsets(offsets))
            })
    }

    proptest! {
        #[test]
        fn test_targets_always_in_range(
            frame in proptest::array::uniform4(any_select()),
            cal in any_calibration(),
        ) {
            let targets = resolve(&frame, &cal);
            prop_assert_eq!(targets.as_array().len(), CHANNEL_COUNT);
            for &t in targets.as_array() {
                prop_assert!((SERVO_MIN..=SERVO_MAX).contains(&t));
            }
        }

        #[test]
        fn test_resolve_is_pure(
            frame in proptest::array::uniform4(any_select()),
            cal in any_calibration(),
        ) {
            prop_assert_eq!(resolve(&frame, &cal), resolve(&frame, &cal));
        }
    }
}
