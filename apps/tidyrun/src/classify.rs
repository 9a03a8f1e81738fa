//! Classification of raw analyzer output.
//!
//! A line is a diagnostic iff it contains `warning: `. Diagnostics credit the
//! file once and every tag of their bracketed class list once each, e.g.
//! `[cppcoreguidelines-avoid-magic-numbers,readability-magic-numbers]`.
//! Analyzer boilerplate (warning totals, the header-filter hint, NOLINT
//! suppression notes) is dropped unless the line is itself a diagnostic.

use crate::models::Counter;
use regex::Regex;
use std::sync::OnceLock;

pub const WARNING_MARKER: &str = "warning: ";

fn class_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let tag = r"\w[\w.]*(?:-[\w.]+)+";
        Regex::new(&format!(r"\[({tag}(?:,{tag})*)\]")).expect("class list regex")
    })
}

/// Class tags of the last bracketed rule list on `line`.
///
/// The analyzer appends the check list, so brackets in the message text
/// (`arr[i-1]`) never win.
pub fn class_tags(line: &str) -> Vec<&str> {
    class_list()
        .captures_iter(line)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split(',').collect())
        .unwrap_or_default()
}

/// Analyzer chatter that never carries a finding.
pub fn is_boilerplate(line: &str) -> bool {
    line.contains("warnings generated")
        || line.contains("-header-filter")
        || (line.contains("Suppressed")
            && (line.contains("NOLINT") || line.contains("non-user code")))
}

#[derive(Debug, Default, Clone, PartialEq)]
/// Classification of one file's output.
pub struct Classified {
    /// file -> diagnostics counted
    pub warnings: Counter,
    /// class tag -> diagnostics counted
    pub classes: Counter,
    /// Lines to print, blank runs collapsed.
    pub lines: Vec<String>,
}

impl Classified {
    pub fn warning_count(&self) -> usize {
        self.warnings.total()
    }
}

/// Appends lines while collapsing blank runs and dropping leading blanks.
#[derive(Default)]
struct BlankCollapser {
    lines: Vec<String>,
}

impl BlankCollapser {
    fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            match self.lines.last() {
                Some(prev) if !prev.is_empty() => self.lines.push(String::new()),
                _ => {}
            }
        } else {
            self.lines.push(line.to_string());
        }
    }

    fn finish(mut self) -> Vec<String> {
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Classify `output` produced for `file`.
///
/// With a non-empty `only` allow-list, a diagnostic is counted and printed
/// only when its tags intersect the list, and every other line is hidden.
pub fn classify(file: &str, output: &str, only: &[String]) -> Classified {
    let mut warnings = Counter::new();
    let mut classes = Counter::new();
    let mut printer = BlankCollapser::default();
    let filtering = !only.is_empty();

    for line in output.lines() {
        if !line.contains(WARNING_MARKER) {
            if is_boilerplate(line) || filtering {
                continue;
            }
            printer.push(line);
            continue;
        }
        let tags = class_tags(line);
        if filtering && !tags.iter().any(|t| only.iter().any(|o| o == t)) {
            continue;
        }
        warnings.incr(file);
        for tag in tags {
            classes.incr(tag);
        }
        printer.push(line);
    }

    Classified {
        warnings,
        classes,
        lines: printer.finish(),
    }
}
