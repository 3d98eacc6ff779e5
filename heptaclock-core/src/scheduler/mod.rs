//! Motion task scheduler
//!
//! Executes the choreographer's requests in dependency order, one servo
//! step at a time.

pub mod executor;
pub mod graph;

pub use executor::{
    Advance, DrainStats, Scheduler, ServoStep, MAX_QUEUE, MAX_ROUND_ADVANCES, SETTLE_DELAY_MS,
};
pub use graph::DependencyIndex;
