//! Terminal output.
//!
//! - [`TerminalUI`] styles output with `console` and animates spinners with `indicatif`
//! - [`NonInteractiveUI`] prints plain lines for pipes and CI logs
//! - [`MockUI`] records everything for assertions in tests
//!
//! # Example
//!
//! ```
//! use nbenv::ui::{create_ui, OutputMode};
//!
//! // Use non-interactive mode for testability
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("Notebooks");
//! ui.success("Sync complete!");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, SpinnerStatus};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, NbenvTheme};

/// Where progress and results are reported.
///
/// Implemented by the terminal, non-interactive and mock front ends so the
/// sync pipeline never writes to stdout directly.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    fn set_output_mode(&mut self, mode: OutputMode);

    /// Plain informational line.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    /// Shown unless silent; goes to stderr on real terminals.
    fn warning(&mut self, msg: &str);

    /// Always shown, whatever the output mode.
    fn error(&mut self, msg: &str);

    /// Begin a long-running step such as resolving the merged environment.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn show_header(&mut self, title: &str);

    /// Position within a batch, e.g. `[3/7]`.
    fn show_progress(&mut self, current: usize, total: usize);

    fn is_interactive(&self) -> bool;
}

/// A running spinner. Exactly one `finish_*` call ends it.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);

    fn finish_skipped(&mut self, msg: &str);
}
