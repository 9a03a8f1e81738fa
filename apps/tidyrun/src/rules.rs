//! Compiler for the line-oriented rule list into `.clang-tidy`.
//!
//! Source format:
//! - blank lines and `#` comments are ignored;
//! - every other line before `END_CHECKS` is one check identifier;
//! - `END_CHECKS` emits `Checks: "<ids joined by ,>"` and switches to
//!   pass-through, copying all following lines verbatim.
//!
//! The checks line is always the first line of the compiled output.

use crate::error::{Result, TidyError};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const COMPILED_CONFIG_NAME: &str = ".clang-tidy";
pub const SENTINEL: &str = "END_CHECKS";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub checks: Vec<String>,
    pub trailer: Vec<String>,
    /// False when the source never switched to pass-through.
    pub terminated: bool,
}

impl RuleConfig {
    pub fn checks_line(&self) -> String {
        format!("Checks: \"{}\"", self.checks.join(","))
    }

    /// Lines of the compiled config, checks line first.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.trailer.len() + 1);
        out.push(self.checks_line());
        out.extend(self.trailer.iter().cloned());
        out
    }

    pub fn render(&self) -> String {
        let mut s = String::new();
        for line in self.lines() {
            s.push_str(&line);
            s.push('\n');
        }
        s
    }
}

/// Parse rule-list source text.
pub fn parse(source: &str) -> RuleConfig {
    let mut cfg = RuleConfig::default();
    for line in source.lines() {
        if cfg.terminated {
            cfg.trailer.push(line.trim_end().to_string());
            continue;
        }
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if stripped == SENTINEL {
            cfg.terminated = true;
        } else {
            cfg.checks.push(stripped.to_string());
        }
    }
    cfg
}

/// Read and parse the rule file at `dsl`.
pub fn load(dsl: &Path) -> Result<RuleConfig> {
    if !dsl.is_file() {
        return Err(TidyError::RuleFileNotFound(dsl.to_path_buf()));
    }
    let source = fs::read_to_string(dsl).map_err(|e| TidyError::io(dsl, e))?;
    let cfg = parse(&source);
    if !cfg.terminated {
        log::warn!(
            "{} has no {} line; emitting checks without trailer",
            dsl.display(),
            SENTINEL
        );
    }
    Ok(cfg)
}

/// Compile `dsl` into `target`, overwriting it.
pub fn compile(dsl: &Path, target: &Path) -> Result<RuleConfig> {
    let cfg = load(dsl)?;
    let rendered = cfg.render();
    // Leave the file (and its mtime) alone when nothing changed so cached
    // results stay valid across runs.
    if fs::read_to_string(target).ok().as_deref() == Some(rendered.as_str()) {
        log::debug!("{} is up to date", target.display());
        return Ok(cfg);
    }
    fs::write(target, rendered).map_err(|e| TidyError::io(target, e))?;
    log::debug!(
        "wrote {} with {} checks",
        target.display(),
        cfg.checks.len()
    );
    Ok(cfg)
}

/// Print the compiled config without touching disk.
pub fn print(dsl: &Path, out: &mut dyn Write) -> Result<()> {
    let cfg = load(dsl)?;
    out.write_all(cfg.render().as_bytes())
        .map_err(|e| TidyError::io("<stdout>", e))
}
