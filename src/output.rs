//! Terminal output: color policy and diagnostic rendering.
//!
//! Color is decided once per command from the `--color` flag. In `auto` mode
//! the usual conventions are honoured, in this order: `NO_COLOR` (any value)
//! and `CLICOLOR=0` turn color off, a non-empty `CLICOLOR_FORCE` other than
//! `0` turns it on, `TERM=dumb` turns it off, and otherwise stdout decides.
//! Emojis follow the color setting.

use std::env;
use std::fmt::Write as _;

use console::style;

use crate::merge::Node;
use crate::schema::ValidationDiagnostic;

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Always,
    Never,
    Auto,
}

impl ColorChoice {
    /// Unknown values fall back to `Auto`.
    pub fn parse(flag: &str) -> Self {
        match flag.to_ascii_lowercase().as_str() {
            "always" => ColorChoice::Always,
            "never" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

/// Whether output may use colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match ColorChoice::parse(color_flag) {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => env_color_preference(|name| {
                env::var_os(name).map(|v| v.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| console::Term::stdout().features().colors_supported()),
        };
        Self { use_color }
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The color decision the environment forces, if any.
fn env_color_preference(lookup: impl Fn(&str) -> Option<String>) -> Option<bool> {
    if lookup("NO_COLOR").is_some() || lookup("CLICOLOR").as_deref() == Some("0") {
        return Some(false);
    }
    if lookup("CLICOLOR_FORCE").is_some_and(|v| !v.is_empty() && v != "0") {
        return Some(true);
    }
    if lookup("TERM").as_deref() == Some("dumb") {
        return Some(false);
    }
    None
}

/// Picks `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Compact single-line rendering of a document value.
pub fn format_value(value: &Node) -> String {
    serde_json::to_string(&value.to_json()).unwrap_or_else(|_| format!("{:?}", value))
}

/// Renders diagnostics for `config_file`, one block per diagnostic: the file,
/// the pointer and the offending value, then the validator message.
pub fn render_diagnostics(config: &OutputConfig, config_file: &str, diagnostics: &[ValidationDiagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        let pointer = diagnostic.pointer.to_string();
        let value = format_value(&diagnostic.value);
        if config.use_color {
            let _ = writeln!(
                out,
                "{} {}: {} = {}",
                emoji(config, "❌", "[ERROR]"),
                style(config_file).bold(),
                style(&pointer).yellow(),
                style(&value).cyan()
            );
            let _ = writeln!(out, "   {}", style(&diagnostic.message).red());
        } else {
            let _ = writeln!(out, "[ERROR] {}: {} = {}", config_file, pointer, value);
            let _ = writeln!(out, "   {}", diagnostic.message);
        }
    }
    out
}
