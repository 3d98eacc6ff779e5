//! Motion planning
//!
//! Turns a glyph frame into target positions, and target positions into a
//! collision-free set of servo moves for the scheduler.

pub mod choreographer;
pub mod resolver;
pub mod task;

pub use choreographer::{choreograph, Plan, LARGE_SWEEP_THRESHOLD};
pub use resolver::{resolve, Targets};
pub use task::{
    MotionRequest, ServoTask, TaskError, TaskId, TaskState, COARSE_STEP, SMOOTH_STEP,
};
