//! Colors and status icons.

use console::Style;

/// Styles used for terminal output.
#[derive(Debug, Clone)]
pub struct NbenvTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub dim: Style,
    pub highlight: Style,
    pub header: Style,
    /// Package names in listings.
    pub package: Style,
}

impl Default for NbenvTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl NbenvTheme {
    /// Colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().magenta().bold(),
            package: Style::new().cyan(),
        }
    }

    /// Theme without any styling, for pipes and `--no-color`.
    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            success: none.clone(),
            warning: none.clone(),
            error: none.clone(),
            dim: none.clone(),
            highlight: none.clone(),
            header: none.clone(),
            package: none,
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        tagged(&self.success, "✓", msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        tagged(&self.warning, "⚠", msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        tagged(&self.error, "✗", msg)
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        tagged(&self.dim, "○", msg)
    }

    pub fn format_header(&self, title: &str) -> String {
        tagged(&self.header, "▸", title)
    }
}

fn tagged(style: &Style, icon: &str, msg: &str) -> String {
    style.apply_to(format!("{} {}", icon, msg)).to_string()
}

/// Whether stdout should get colors (honors `NO_COLOR`).
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term()
}
