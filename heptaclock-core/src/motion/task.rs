//! Servo motion tasks
//!
//! A task moves one pointer from its current position to a target in fixed
//! steps. Tasks are requested by the choreographer as [`MotionRequest`]s and
//! become [`ServoTask`]s once the scheduler accepts them.

use crate::config::calibration::clamp_position;
use crate::layout::Channel;

/// Step per advance for smooth (silent) motion
pub const SMOOTH_STEP: u16 = 5;

/// Step per advance for normal motion
pub const COARSE_STEP: u16 = 50;

/// Errors creating or enqueueing a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskError {
    /// Channel outside 0-27
    InvalidChannel,
    /// Scheduler queue has no free slot
    QueueFull,
}

/// Task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Not yet stepped
    Pending,
    /// Stepped at least once, not at target
    Running,
    /// At target, waiting to be removed on the next scan
    Done,
}

/// Scheduler-assigned task identity, increasing in enqueue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u32);

/// A move the choreographer wants performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionRequest {
    pub channel: Channel,
    pub from: u16,
    pub to: u16,
    /// Channel whose most recent task must finish first
    pub after: Option<Channel>,
    pub smooth: bool,
}

impl MotionRequest {
    /// Request from raw inputs
    ///
    /// Channels outside 0-27 are rejected; positions are clamped into the
    /// safe travel range.
    pub fn new(channel: u8, from: i32, to: i32) -> Result<Self, TaskError> {
        let channel = Channel::new(channel).ok_or(TaskError::InvalidChannel)?;
        Ok(Self::for_channel(
            channel,
            clamp_position(from),
            clamp_position(to),
        ))
    }

    /// Independent coarse move for an already validated channel
    pub const fn for_channel(channel: Channel, from: u16, to: u16) -> Self {
        Self {
            channel,
            from,
            to,
            after: None,
            smooth: false,
        }
    }

    /// Wait for `channel`'s task before starting
    pub const fn after(mut self, channel: Option<Channel>) -> Self {
        self.after = channel;
        self
    }

    /// Use smooth steps
    pub const fn smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}

/// A task owned by the scheduler queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoTask {
    pub id: TaskId,
    pub channel: Channel,
    pub position: u16,
    pub target: u16,
    /// Predecessor resolved at enqueue time
    pub after: Option<TaskId>,
    pub state: TaskState,
    pub smooth: bool,
}

impl ServoTask {
    /// Accept a request under `id`
    pub fn from_request(id: TaskId, request: &MotionRequest, after: Option<TaskId>) -> Self {
        let state = if request.from == request.to {
            TaskState::Done
        } else {
            TaskState::Pending
        };
        Self {
            id,
            channel: request.channel,
            position: request.from,
            target: request.to,
            after,
            state,
            smooth: request.smooth,
        }
    }

    /// Step magnitude for this task
    pub const fn step_size(&self) -> u16 {
        if self.smooth {
            SMOOTH_STEP
        } else {
            COARSE_STEP
        }
    }

    /// Whether the task has reached its target
    pub fn is_done(&self) -> bool {
        self.state == TaskState::Done
    }

    /// Move one step toward the target and return the new position
    ///
    /// The last step lands exactly on the target.
    pub fn step(&mut self) -> u16 {
        let step = self.step_size();
        let distance = self.position.abs_diff(self.target);
        if distance <= step {
            self.position = self.target;
        } else if self.position < self.target {
            self.position += step;
        } else {
            self.position -= step;
        }

        self.state = if self.position == self.target {
            TaskState::Done
        } else {
            TaskState::Running
        };
        self.position
    }

    /// Steps left until the target is reached
    pub fn remaining_steps(&self) -> u32 {
        let step = self.step_size() as u32;
        (self.position.abs_diff(self.target) as u32).div_ceil(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_bad_channel() {
        assert_eq!(
            MotionRequest::new(28, 200, 300),
            Err(TaskError::InvalidChannel)
        );
    }

    #[test]
    fn test_request_clamps_positions() {
        let req = MotionRequest::new(3, -40, 9_999).unwrap();
        assert_eq!(req.from, 100);
        assert_eq!(req.to, 550);
        assert_eq!(req.after, None);
        assert!(!req.smooth);
    }

    #[test]
    fn test_coarse_steps_clamp_to_target() {
        let req = MotionRequest::new(0, 100, 220).unwrap();
        let mut task = ServoTask::from_request(TaskId(0), &req, None);
        assert_eq!(task.state, TaskState::Pending);
        assert_eq!(task.remaining_steps(), 3);

        assert_eq!(task.step(), 150);
        assert_eq!(task.state, TaskState::Running);
        assert_eq!(task.step(), 200);
        assert_eq!(task.step(), 220);
        assert!(task.is_done());
    }

    #[test]
    fn test_smooth_steps_downward() {
        let req = MotionRequest::new(0, 300, 288).unwrap().smooth(true);
        let mut task = ServoTask::from_request(TaskId(0), &req, None);
        assert_eq!(task.step(), 295);
        assert_eq!(task.step(), 290);
        assert_eq!(task.step(), 288);
        assert!(task.is_done());
    }

    #[test]
    fn test_zero_distance_task_is_done() {
        let req = MotionRequest::new(1, 200, 200).unwrap();
        let task = ServoTask::from_request(TaskId(0), &req, None);
        assert!(task.is_done());
        assert_eq!(task.remaining_steps(), 0);
    }
}
