//! Status lines on stderr, one symbol per kind.

use owo_colors::{AnsiColors, OwoColorize};

use super::colors_enabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Info,
    Warning,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Info => "ℹ",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }

    fn color(self) -> AnsiColors {
        match self {
            Self::Success => AnsiColors::Green,
            Self::Info => AnsiColors::Blue,
            Self::Warning => AnsiColors::Yellow,
            Self::Error => AnsiColors::Red,
        }
    }

    /// Problems color the whole line, progress only the symbol.
    fn colors_message(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

fn render(status: Status, message: &str, colored: bool) -> String {
    if !colored {
        return format!("{} {message}", status.symbol());
    }

    let symbol = status.symbol().color(status.color()).bold().to_string();
    if status.colors_message() {
        format!("{symbol} {}", message.color(status.color()))
    } else {
        format!("{symbol} {message}")
    }
}

fn print(status: Status, message: &str) {
    eprintln!("{}", render(status, message, colors_enabled()));
}

pub fn success(message: &str) {
    print(Status::Success, message);
}

pub fn info(message: &str) {
    print(Status::Info, message);
}

pub fn warning(message: &str) {
    print(Status::Warning, message);
}

pub fn error(message: &str) {
    print(Status::Error, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_carry_the_symbol() {
        assert_eq!(render(Status::Success, "Reloaded cogs.admin", false), "✓ Reloaded cogs.admin");
        assert_eq!(render(Status::Error, "  cogs.broken", false), "✗   cogs.broken");
    }

    #[test]
    fn colored_warnings_color_the_message() {
        let line = render(Status::Warning, "Failed to load cogs.ping", true);
        let message = line.split_once(' ').map(|(_, rest)| rest).unwrap();
        assert!(message.starts_with('\u{1b}'));

        let line = render(Status::Info, "Loading 2 extensions...", true);
        assert!(line.ends_with(" Loading 2 extensions..."));
    }
}
