//! Segment patterns for the characters a digit can show
//!
//! Besides 0-9 there are two synthetic glyphs: blank (every pointer
//! disengaged, used for shutdown) and idle (only the middle pointer
//! engaged, used while sleeping).

use crate::layout::{Segment, DIGIT_COUNT, SEGMENT_COUNT};

/// Seven-segment pattern, indexed by [`Segment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Glyph([bool; SEGMENT_COUNT]);

const fn pattern(bits: [u8; SEGMENT_COUNT]) -> Glyph {
    let mut segments = [false; SEGMENT_COUNT];
    let mut i = 0;
    while i < SEGMENT_COUNT {
        segments[i] = bits[i] != 0;
        i += 1;
    }
    Glyph(segments)
}

/// Patterns for 0-9 in A..G order
const DIGIT_GLYPHS: [Glyph; 10] = [
    pattern([1, 1, 1, 1, 1, 1, 0]),
    pattern([0, 1, 1, 0, 0, 0, 0]),
    pattern([1, 1, 0, 1, 1, 0, 1]),
    pattern([1, 1, 1, 1, 0, 0, 1]),
    pattern([0, 1, 1, 0, 0, 1, 1]),
    pattern([1, 0, 1, 1, 0, 1, 1]),
    pattern([1, 0, 1, 1, 1, 1, 1]),
    pattern([1, 1, 1, 0, 0, 0, 0]),
    pattern([1, 1, 1, 1, 1, 1, 1]),
    pattern([1, 1, 1, 1, 0, 1, 1]),
];

impl Glyph {
    /// Every pointer disengaged
    pub const BLANK: Glyph = pattern([0, 0, 0, 0, 0, 0, 0]);

    /// Only the middle pointer engaged
    pub const IDLE: Glyph = pattern([0, 0, 0, 0, 0, 0, 1]);

    /// Pattern for a decimal digit, `None` above 9
    pub const fn digit(value: u8) -> Option<Glyph> {
        if value < 10 {
            Some(DIGIT_GLYPHS[value as usize])
        } else {
            None
        }
    }

    /// Whether `segment` is engaged in this glyph
    pub const fn is_lit(&self, segment: Segment) -> bool {
        self.0[segment.index()]
    }
}

/// What one digit position should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GlyphSelect {
    /// Decimal digit 0-9 (values above 9 render blank)
    Digit(u8),
    /// All pointers off
    Blank,
    /// Middle pointer only
    Idle,
}

impl GlyphSelect {
    /// Resolve the selector to its segment pattern
    pub const fn glyph(self) -> Glyph {
        match self {
            GlyphSelect::Digit(value) => match Glyph::digit(value) {
                Some(glyph) => glyph,
                None => Glyph::BLANK,
            },
            GlyphSelect::Blank => Glyph::BLANK,
            GlyphSelect::Idle => Glyph::IDLE,
        }
    }
}

/// Four glyph selectors, one per digit position
pub type Frame = [GlyphSelect; DIGIT_COUNT];

/// Frame showing four explicit digits
pub const fn digits_frame(digits: [u8; DIGIT_COUNT]) -> Frame {
    [
        GlyphSelect::Digit(digits[0]),
        GlyphSelect::Digit(digits[1]),
        GlyphSelect::Digit(digits[2]),
        GlyphSelect::Digit(digits[3]),
    ]
}

/// Frame with every position blank
pub const fn blank_frame() -> Frame {
    [GlyphSelect::Blank; DIGIT_COUNT]
}

/// Frame with every position idle
pub const fn idle_frame() -> Frame {
    [GlyphSelect::Idle; DIGIT_COUNT]
}

/// `HH:MM` digits for a clock reading
pub const fn clock_digits(hour: u8, minute: u8) -> [u8; DIGIT_COUNT] {
    [(hour / 10) % 10, hour % 10, (minute / 10) % 10, minute % 10]
}

/// `MM:SS` digits for a duration in seconds
///
/// Minutes above 99 wrap in the tens position.
pub const fn mmss_digits(total_seconds: u32) -> [u8; DIGIT_COUNT] {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    [
        ((minutes / 10) % 10) as u8,
        (minutes % 10) as u8,
        (seconds / 10) as u8,
        (seconds % 10) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_lights_everything() {
        let eight = Glyph::digit(8).unwrap();
        for segment in Segment::ALL {
            assert!(eight.is_lit(segment));
        }
    }

    #[test]
    fn test_synthetic_glyphs() {
        for segment in Segment::ALL {
            assert!(!Glyph::BLANK.is_lit(segment));
            assert_eq!(Glyph::IDLE.is_lit(segment), segment == Segment::MIDDLE);
        }
    }

    #[test]
    fn test_one_and_seven_share_middle_off() {
        let one = Glyph::digit(1).unwrap();
        let seven = Glyph::digit(7).unwrap();
        assert!(!one.is_lit(Segment::G));
        assert!(!seven.is_lit(Segment::G));
        assert!(seven.is_lit(Segment::A));
        assert!(!one.is_lit(Segment::A));
    }

    #[test]
    fn test_out_of_range_digit_renders_blank() {
        assert_eq!(Glyph::digit(10), None);
        assert_eq!(GlyphSelect::Digit(12).glyph(), Glyph::BLANK);
    }

    #[test]
    fn test_mmss_digits() {
        assert_eq!(mmss_digits(125), [0, 2, 0, 5]);
        assert_eq!(mmss_digits(0), [0, 0, 0, 0]);
        assert_eq!(mmss_digits(59 * 60 + 59), [5, 9, 5, 9]);
    }

    #[test]
    fn test_clock_digits() {
        assert_eq!(clock_digits(7, 5), [0, 7, 0, 5]);
        assert_eq!(clock_digits(23, 59), [2, 3, 5, 9]);
    }
}
