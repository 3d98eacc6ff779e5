//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod clock;
pub mod command;
pub mod settings;
pub mod tick;

pub use button::button_task;
pub use clock::clock_task;
pub use command::command_task;
pub use settings::settings_task;
pub use tick::tick_task;
