//! Clock mode state machine
//!
//! Decides, once per tick, what the four digits should show.

pub mod events;
pub mod machine;
pub mod mode;

pub use events::{Command, TimerOp};
pub use machine::{display_hour, ModeMachine, TickOutput};
pub use mode::Mode;
