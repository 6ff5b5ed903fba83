//! CLI styling utilities - Graphite-inspired color scheme
//!
//! Provides semantic styling via the [`Stylize`] trait with automatic
//! terminal color support detection (delegated to `owo-colors`).
//!
//! | Method       | Color  | Semantic Use                     |
//! |--------------|--------|----------------------------------|
//! | `.accent()`  | Cyan   | Branches, PR numbers, commands   |
//! | `.success()` | Green  | Merged, pushed, done             |
//! | `.error()`   | Red    | Failures                         |
//! | `.warn()`    | Yellow | Soft degradations                |
//! | `.muted()`   | Dim    | Retry lines, hints               |
//! | `.emphasis()`| Bold   | Phase headers                    |
//!
//! Everything but the JSON results goes to stderr, so color support is
//! detected on stderr.

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::{self, Display};
use std::sync::OnceLock;

const ACCENT: Style = Style::new().cyan();
const SUCCESS: Style = Style::new().green();
const ERROR: Style = Style::new().red();
const WARN: Style = Style::new().yellow();
const MUTED: Style = Style::new().dimmed();
const EMPHASIS: Style = Style::new().bold();

/// A value with semantic styling applied.
///
/// Implements [`Display`] to render with ANSI codes when supported.
/// `owo-colors` handles `NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE` and TTY
/// detection.
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    style: Style,
}

impl<T> Styled<T> {
    const fn new(value: T, style: Style) -> Self {
        Self { value, style }
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.value
                .if_supports_color(Stream::Stderr, |v| v.style(self.style))
        )
    }
}

/// Extension trait for semantic terminal styling.
///
/// Implemented for all [`Display`] types.
pub trait Stylize: Display {
    /// Cyan, for branches and PR numbers
    fn accent(&self) -> Styled<&Self> {
        Styled::new(self, ACCENT)
    }

    /// Green, for completed steps
    fn success(&self) -> Styled<&Self> {
        Styled::new(self, SUCCESS)
    }

    /// Red, for failures
    fn error(&self) -> Styled<&Self> {
        Styled::new(self, ERROR)
    }

    /// Yellow, for warnings
    fn warn(&self) -> Styled<&Self> {
        Styled::new(self, WARN)
    }

    /// Dim, for secondary information
    fn muted(&self) -> Styled<&Self> {
        Styled::new(self, MUTED)
    }

    /// Bold, for headers
    fn emphasis(&self) -> Styled<&Self> {
        Styled::new(self, EMPHASIS)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Success checkmark
pub const CHECK: &str = "✓";

/// Error/failure cross
pub const CROSS: &str = "✗";

/// Arrow for steps/actions
pub const ARROW: &str = "→";

/// Bullet point for list items
pub const BULLET: &str = "○";

/// Green checkmark
#[inline]
pub const fn check() -> Styled<&'static str> {
    Styled::new(CHECK, SUCCESS)
}

/// Red cross
#[inline]
pub const fn cross() -> Styled<&'static str> {
    Styled::new(CROSS, ERROR)
}

/// Cyan arrow
#[inline]
pub const fn arrow() -> Styled<&'static str> {
    Styled::new(ARROW, ACCENT)
}

/// Dimmed bullet
#[inline]
pub const fn bullet() -> Styled<&'static str> {
    Styled::new(BULLET, MUTED)
}

/// Clickable OSC 8 hyperlink on stderr, plain URL where unsupported
pub fn hyperlink_url(url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stderr) {
        terminal_link::Link::new(url, url).to_string()
    } else {
        url.to_string()
    }
}

/// Default spinner style - cyan dots
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}
