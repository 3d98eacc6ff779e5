//! Collision-avoiding choreography
//!
//! The middle pointer of each digit sweeps through the space occupied by
//! the engaged B and F pointers. When the middle pointer has a long way to
//! travel, any engaged neighbour is first parked clear of it, the middle
//! pointer moves once that is done, and the neighbour returns afterwards:
//!
//! ```text
//! evacuate B/F  ->  sweep G  ->  restore B/F
//! ```
//!
//! Everything else in the digit moves independently in the same pass.

use heapless::Vec;

use super::resolver::Targets;
use super::task::MotionRequest;
use crate::config::Calibration;
use crate::layout::{Channel, ChannelMap, DigitPos, Segment, CHANNEL_COUNT, DIGIT_COUNT};

/// Middle pointer travel above which neighbours must make way
pub const LARGE_SWEEP_THRESHOLD: u16 = 100;

/// Upper bound on requests per frame: every channel plus two parking moves per digit
pub const MAX_REQUESTS: usize = CHANNEL_COUNT + 2 * DIGIT_COUNT;

/// Requests for one frame, in enqueue order
pub type Plan = Vec<MotionRequest, MAX_REQUESTS>;

/// Plan the moves from `current` to `targets`
///
/// Only one predecessor is tracked for the middle pointer: when both
/// neighbours are parked it waits on the last one evaluated (F).
pub fn choreograph(
    current: &ChannelMap<u16>,
    targets: &Targets,
    calibration: &Calibration,
    smooth: bool,
) -> Plan {
    let mut plan = Plan::new();
    for digit in DigitPos::ALL {
        plan_digit(&mut plan, digit, current, targets, calibration, smooth);
    }
    plan
}

fn plan_digit(
    plan: &mut Plan,
    digit: DigitPos,
    current: &ChannelMap<u16>,
    targets: &Targets,
    calibration: &Calibration,
    smooth: bool,
) {
    let middle = Channel::at(digit, Segment::MIDDLE);
    let large_sweep = current[middle].abs_diff(targets[middle]) > LARGE_SWEEP_THRESHOLD;

    let mut parked = [false; Segment::MIDDLE_NEIGHBOURS.len()];
    let mut middle_after = None;
    for (slot, segment) in parked.iter_mut().zip(Segment::MIDDLE_NEIGHBOURS) {
        let neighbour = Channel::at(digit, segment);
        if large_sweep && current[neighbour] == calibration.engaged(neighbour) {
            push(
                plan,
                MotionRequest::for_channel(
                    neighbour,
                    current[neighbour],
                    calibration.avoidance(neighbour),
                )
                .smooth(smooth),
            );
            *slot = true;
            middle_after = Some(neighbour);
        }
    }

    if current[middle] != targets[middle] {
        push(
            plan,
            MotionRequest::for_channel(middle, current[middle], targets[middle])
                .after(middle_after)
                .smooth(smooth),
        );
    }

    for segment in Segment::ALL {
        if segment == Segment::MIDDLE {
            continue;
        }
        let channel = Channel::at(digit, segment);
        let was_parked = Segment::MIDDLE_NEIGHBOURS
            .iter()
            .position(|&s| s == segment)
            .is_some_and(|i| parked[i]);

        if was_parked {
            push(
                plan,
                MotionRequest::for_channel(
                    channel,
                    calibration.avoidance(channel),
                    targets[channel],
                )
                .after(Some(middle))
                .smooth(smooth),
            );
        } else if current[channel] != targets[channel] {
            push(
                plan,
                MotionRequest::for_channel(channel, current[channel], targets[channel])
                    .smooth(smooth),
            );
        }
    }
}

fn push(plan: &mut Plan, request: MotionRequest) {
    // MAX_REQUESTS covers the worst case for four digits
    let _ = plan.push(request);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServoOffsets, ServoVariant};
    use crate::glyph::{blank_frame, digits_frame};
    use crate::motion::resolver::resolve;

    fn cal(variant: ServoVariant) -> Calibration {
        Calibration::new(variant, ServoOffsets::zero())
    }

    #[test]
    fn test_eights_from_blank_need_no_avoidance() {
        let cal = cal(ServoVariant::A);
        let current = cal.initial_positions();
        let targets = resolve(&digits_frame([8, 8, 8, 8]), &cal);
        let plan = choreograph(&current, &targets, &cal, false);

        assert_eq!(plan.len(), 28);
        assert!(plan.iter().all(|r| r.after.is_none()));
        assert!(plan.iter().all(|r| r.to == cal.engaged(r.channel)));
    }

    #[test]
    fn test_one_to_seven_moves_only_changed_segments() {
        let cal = cal(ServoVariant::A);
        let current = resolve(&digits_frame([0, 1, 0, 0]), &cal);
        let targets = resolve(&digits_frame([0, 7, 0, 0]), &cal);
        let plan = choreograph(&current, &targets, &cal, false);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].channel, Channel::at(DigitPos::HourUnits, Segment::A));
        assert_eq!(plan[0].after, None);
    }

    #[test]
    fn test_eight_to_zero_evacuates_and_restores() {
        let cal = cal(ServoVariant::A);
        let current = resolve(&digits_frame([0, 0, 0, 8]), &cal);
        let targets = resolve(&digits_frame([0, 0, 0, 0]), &cal);
        let plan = choreograph(&current, &targets, &cal, true);

        let b = Channel::at(DigitPos::MinuteUnits, Segment::B);
        let f = Channel::at(DigitPos::MinuteUnits, Segment::F);
        let g = Channel::at(DigitPos::MinuteUnits, Segment::G);

        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].channel, b);
        assert_eq!(plan[0].to, cal.avoidance(b));
        assert_eq!(plan[1].channel, f);
        assert_eq!(plan[1].to, cal.avoidance(f));
        // Middle waits on the last parked neighbour only
        assert_eq!(plan[2].channel, g);
        assert_eq!(plan[2].after, Some(f));
        assert_eq!(plan[3].channel, b);
        assert_eq!(plan[3].from, cal.avoidance(b));
        assert_eq!(plan[3].to, cal.engaged(b));
        assert_eq!(plan[3].after, Some(g));
        assert_eq!(plan[4].channel, f);
        assert_eq!(plan[4].after, Some(g));
        assert!(plan.iter().all(|r| r.smooth));
    }

    #[test]
    fn test_single_engaged_neighbour_parks_alone() {
        // Digit 2 has B lit and F dark; going to blank sweeps the middle
        let cal = cal(ServoVariant::B);
        let current = resolve(&digits_frame([2, 0, 0, 0]), &cal);
        let mut frame = digits_frame([0, 0, 0, 0]);
        frame[0] = blank_frame()[0];
        let targets = resolve(&frame, &cal);
        let plan = choreograph(&current, &targets, &cal, false);

        let b = Channel::at(DigitPos::HourTens, Segment::B);
        let g = Channel::at(DigitPos::HourTens, Segment::G);
        let middle = plan.iter().find(|r| r.channel == g).unwrap();
        assert_eq!(middle.after, Some(b));
        assert!(plan
            .iter()
            .any(|r| r.channel == b && r.after == Some(g) && r.to == cal.disengaged(b)));
    }

    #[test]
    fn test_short_middle_move_skips_avoidance() {
        let cal = cal(ServoVariant::A);
        let mut current = resolve(&digits_frame([8, 8, 8, 8]), &cal);
        let targets = current;
        let g = Channel::at(DigitPos::HourTens, Segment::G);
        current[g] += LARGE_SWEEP_THRESHOLD;
        let plan = choreograph(&current, &targets, &cal, false);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].channel, g);
        assert_eq!(plan[0].after, None);
    }

    #[test]
    fn test_no_change_no_plan() {
        let cal = cal(ServoVariant::A);
        let current = resolve(&digits_frame([1, 2, 3, 4]), &cal);
        assert!(choreograph(&current, &current, &cal, false).is_empty());
    }
}
