//! External command execution.

pub mod command;
pub mod platform;

pub use command::{describe, execute, execute_check, CommandOptions, CommandResult};
pub use platform::is_ci;
