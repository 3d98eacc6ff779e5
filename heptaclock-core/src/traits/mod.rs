//! Hardware abstraction traits
//!
//! These traits define the interface between the clock logic and the
//! board: the servo output stage and the persisted settings store.

pub mod actuator;
pub mod store;

pub use actuator::{ServoError, ServoOutput};
pub use store::{SettingsStore, StoreError};
