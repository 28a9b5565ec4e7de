//! Styling of the run summary and fatal errors on stderr.

use console::Style;
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::sync::LazyLock;

pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Styles for the lines printed after the report
#[derive(Debug, Clone)]
pub struct Theme {
    /// Recovery suggestions under an error
    pub hint: Style,
    /// Source and header paths
    pub path: Style,
    /// Call site and file counts
    pub count: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            hint: Style::new().dim(),
            path: Style::new().magenta(),
            count: Style::new().cyan().bold(),
        }
    }
}

fn plain() -> bool {
    use is_terminal::IsTerminal;
    std::env::var_os("NO_COLOR").is_some() || !std::io::stderr().is_terminal()
}

impl Theme {
    /// `✓ text`, for a clean run or a written annotation set.
    pub fn success_with_icon(&self, text: &str) -> String {
        if plain() {
            format!("✓ {text}")
        } else {
            format!("{} {text}", "✓".green().bold())
        }
    }

    /// `✗ text`, for fatal errors and runs with failed files.
    pub fn error_with_icon(&self, text: &str) -> String {
        if plain() {
            format!("✗ {text}")
        } else {
            format!("{} {}", "✗".red().bold(), text.red())
        }
    }

    /// `⚠ text`, for one file that failed.
    pub fn warning_with_icon(&self, text: &str) -> String {
        if plain() {
            format!("⚠ {text}")
        } else {
            format!("{} {text}", "⚠".yellow().bold())
        }
    }

    pub fn apply<T: Display>(&self, style: &Style, value: T) -> String {
        if plain() {
            value.to_string()
        } else {
            style.apply_to(value).to_string()
        }
    }
}
