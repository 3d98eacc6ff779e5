//! Digit and segment addressing
//!
//! The clock has four digit positions of seven pointers each. Every pointer
//! is driven by one servo channel; channels are numbered digit-major, so
//! digit `d` segment `s` lives on channel `d * 7 + s`. All code above the
//! actuator driver addresses pointers as (digit, segment) and translates
//! through [`Channel::at`] exactly once.

use core::ops::{Index, IndexMut};

/// Number of digit positions on the face
pub const DIGIT_COUNT: usize = 4;

/// Pointers per digit
pub const SEGMENT_COUNT: usize = 7;

/// Total servo channels
pub const CHANNEL_COUNT: usize = DIGIT_COUNT * SEGMENT_COUNT;

/// Channels served by each PWM chip
pub const CHANNELS_PER_CHIP: u8 = 14;

/// Digit position on the face, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitPos {
    /// Tens of hours
    HourTens,
    /// Units of hours
    HourUnits,
    /// Tens of minutes
    MinuteTens,
    /// Units of minutes
    MinuteUnits,
}

impl DigitPos {
    /// All positions in channel order
    pub const ALL: [DigitPos; DIGIT_COUNT] = [
        DigitPos::HourTens,
        DigitPos::HourUnits,
        DigitPos::MinuteTens,
        DigitPos::MinuteUnits,
    ];

    /// Zero-based position index
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Segment within a digit
///
/// Standard seven-segment lettering: `A` top, `B` upper right, `C` lower
/// right, `D` bottom, `E` lower left, `F` upper left, `G` middle. The middle
/// pointer sweeps through the space of `B` and `F` and can hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Segment {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Segment {
    /// All segments in channel order
    pub const ALL: [Segment; SEGMENT_COUNT] = [
        Segment::A,
        Segment::B,
        Segment::C,
        Segment::D,
        Segment::E,
        Segment::F,
        Segment::G,
    ];

    /// The middle pointer
    pub const MIDDLE: Segment = Segment::G;

    /// Vertical neighbours the middle pointer can collide with
    pub const MIDDLE_NEIGHBOURS: [Segment; 2] = [Segment::B, Segment::F];

    /// Zero-based index within the digit
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// PWM chip serving a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chip {
    /// Channels 0-13
    Hours,
    /// Channels 14-27
    Minutes,
}

/// Logical servo channel (0-27)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Create a channel, rejecting indices outside 0-27
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Translate a digit/segment address to its channel
    pub const fn at(digit: DigitPos, segment: Segment) -> Self {
        Self((digit.index() * SEGMENT_COUNT + segment.index()) as u8)
    }

    /// Raw channel number
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Channel as an array index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Chip that drives this channel
    pub const fn chip(self) -> Chip {
        if self.0 < CHANNELS_PER_CHIP {
            Chip::Hours
        } else {
            Chip::Minutes
        }
    }

    /// Channel number local to its chip (0-13)
    pub const fn chip_channel(self) -> u8 {
        self.0 % CHANNELS_PER_CHIP
    }

    /// Digit position this channel belongs to
    pub const fn digit(self) -> DigitPos {
        DigitPos::ALL[self.index() / SEGMENT_COUNT]
    }

    /// Segment this channel drives
    pub const fn segment(self) -> Segment {
        Segment::ALL[self.index() % SEGMENT_COUNT]
    }

    /// Iterate over all 28 channels in order
    pub fn all() -> impl Iterator<Item = Channel> {
        (0..CHANNEL_COUNT as u8).map(Channel)
    }
}

/// A value per servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap<T>(pub [T; CHANNEL_COUNT]);

impl<T: Copy> ChannelMap<T> {
    /// Map with every channel set to `value`
    pub const fn splat(value: T) -> Self {
        Self([value; CHANNEL_COUNT])
    }

    /// Build a map by evaluating `f` for each channel
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        let mut values = [f(Channel(0)); CHANNEL_COUNT];
        for channel in Channel::all().skip(1) {
            values[channel.index()] = f(channel);
        }
        Self(values)
    }

    /// Values as a plain array
    pub fn as_array(&self) -> &[T; CHANNEL_COUNT] {
        &self.0
    }
}

impl<T> Index<Channel> for ChannelMap<T> {
    type Output = T;

    fn index(&self, channel: Channel) -> &T {
        &self.0[channel.index()]
    }
}

impl<T> IndexMut<Channel> for ChannelMap<T> {
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.index()]
    }
}
