//! Small shared helpers: colored message prefixes and section headers.

use owo_colors::OwoColorize;

pub const HEADER_SIZE: usize = 80;
const HEADER_START: usize = 3;
const HEADER_SPACING: usize = 1;

pub fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Three-line banner: a rule, `--- name ----...`, a rule.
pub fn header(name: &str, fill: char) -> String {
    let title = format!(
        "{pad}{name}{pad}",
        pad = " ".repeat(HEADER_SPACING)
    );
    let start = fill.to_string().repeat(HEADER_START);
    let used = title.chars().count() + HEADER_START;
    let rest = HEADER_SIZE.saturating_sub(used);
    let right = if rest > 1 {
        fill.to_string().repeat(rest)
    } else {
        String::new()
    };
    let rule = fill.to_string().repeat(HEADER_SIZE);
    format!("{rule}\n{start}{title}{right}\n{rule}")
}
