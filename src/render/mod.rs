//! Report formatting
//!
//! All renderers take a [`Styles`] value by reference; nothing reads
//! colour state from globals. `auto` defers the tty/`NO_COLOR` decision to
//! the `colored` crate, `plain` never emits escape codes and is what the
//! tests compare against.

use colored::Colorize;

pub mod closure;

pub use closure::render_closure;

/// Colour roles of the report layout
#[derive(Debug, Clone, Copy)]
pub struct Styles {
    coloured: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Styles::auto()
    }
}

impl Styles {
    pub fn auto() -> Self {
        Styles { coloured: true }
    }

    pub fn plain() -> Self {
        Styles { coloured: false }
    }

    /// Section heading, column zero
    pub fn section(&self, text: &str) -> String {
        if self.coloured {
            text.bright_yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Top-level label with its separator space
    pub fn label(&self, text: &str) -> String {
        if self.coloured {
            format!("{} ", text.yellow())
        } else {
            format!("{} ", text)
        }
    }

    /// Label of the address header line
    pub fn address_label(&self, text: &str) -> String {
        if self.coloured {
            format!("{} ", text.bright_blue())
        } else {
            format!("{} ", text)
        }
    }

    /// Indented label: four spaces, then the label and its separator space
    pub fn sub_label(&self, text: &str) -> String {
        if self.coloured {
            format!("    {} ", text.yellow())
        } else {
            format!("    {} ", text)
        }
    }

    pub fn value(&self, text: &str) -> String {
        if self.coloured {
            text.bright_white().to_string()
        } else {
            text.to_string()
        }
    }
}
