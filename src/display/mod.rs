//! Styled terminal output for the run summary.

pub mod theme;

pub use theme::{THEME, Theme};
