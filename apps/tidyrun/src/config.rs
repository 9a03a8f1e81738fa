//! Configuration discovery and effective settings resolution.
//!
//! tidyrun reads `tidyrun.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `dsl`: `clang-tidy` (compiled to `.clang-tidy`)
//! - `output`: `human`
//! - `catalog.build_dirs`: `build`, `build/debug-clang`
//! - `catalog.reserved`: `external`, `build`
//! - `analyzer.program`: `clang-tidy`, no timeout
//! - `format.program`: `clang-format`
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_NAMES: [&str; 3] = ["tidyrun.toml", "tidyrun.yaml", "tidyrun.yml"];

const DEFAULT_EXTENSIONS: [&str; 8] = ["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"];
const DEFAULT_HEADER_EXTENSIONS: [&str; 4] = ["h", "hh", "hpp", "hxx"];
const DEFAULT_RESERVED: [&str; 2] = ["external", "build"];
const DEFAULT_BUILD_DIRS: [&str; 2] = ["build", "build/debug-clang"];
pub const DEFAULT_IGNORE_MARKER: &str = "// clang-tidy: ignore";

#[derive(Debug, Default, Deserialize, Clone)]
/// File discovery section under `[catalog]`.
pub struct CatalogCfg {
    pub extensions: Option<Vec<String>>,
    pub header_extensions: Option<Vec<String>>,
    pub reserved: Option<Vec<String>>,
    /// Glob patterns matched against root-relative paths.
    pub exclude: Option<Vec<String>>,
    pub ignore_marker: Option<String>,
    pub build_dirs: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Orchestration defaults under `[tidy]`.
pub struct TidyCfg {
    /// Path substrings to skip; CLI filters are appended.
    pub exclude: Option<Vec<String>>,
    pub only: Option<Vec<String>>,
    pub short: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct AnalyzerCfg {
    pub program: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FormatCfg {
    pub program: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `tidyrun.toml|yaml`.
pub struct TidyrunConfig {
    pub dsl: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub catalog: Option<CatalogCfg>,
    #[serde(default)]
    pub tidy: Option<TidyCfg>,
    #[serde(default)]
    pub analyzer: Option<AnalyzerCfg>,
    #[serde(default)]
    pub format: Option<FormatCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub dsl: PathBuf,
    pub output: String,
    pub extensions: Vec<String>,
    pub header_extensions: Vec<String>,
    pub reserved: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub ignore_marker: String,
    pub build_dirs: Vec<String>,
    pub exclude: Vec<String>,
    pub only: Vec<String>,
    pub short: bool,
    pub analyzer: String,
    pub timeout_secs: Option<u64>,
    pub formatter: String,
}

#[derive(Debug, Default, Clone)]
/// CLI-side overrides; `None`/empty means "not given on the command line".
pub struct Overrides {
    pub root: Option<String>,
    pub output: Option<String>,
    pub exclude: Vec<String>,
    pub only: Vec<String>,
    pub short: Option<bool>,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `tidyrun.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `TidyrunConfig` from `tidyrun.toml` or `tidyrun.yaml|yml` if present.
///
/// A file that exists but does not parse is logged and ignored.
pub fn load_config(root: &Path) -> Option<TidyrunConfig> {
    let toml_path = root.join("tidyrun.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                log::warn!("ignoring {}: {}", toml_path.display(), e);
                None
            }
        };
    }
    for yml in ["tidyrun.yaml", "tidyrun.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    log::warn!("ignoring {}: {}", p.display(), e);
                    None
                }
            };
        }
    }
    None
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Effective {
    let root = match cli.root.as_deref() {
        Some(r) => PathBuf::from(r),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            detect_root(&cwd)
        }
    };
    // Absolute and resolved, so it compares with paths from the build database.
    let root = fs::canonicalize(&root).unwrap_or(root);
    let cfg = load_config(&root).unwrap_or_default();
    let catalog = cfg.catalog.unwrap_or_default();
    let tidy = cfg.tidy.unwrap_or_default();
    let analyzer = cfg.analyzer.unwrap_or_default();

    let dsl = root.join(cfg.dsl.as_deref().unwrap_or("clang-tidy"));
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    // Substring filters accumulate; the allow-list is replaced by the CLI.
    let mut exclude = tidy.exclude.unwrap_or_default();
    exclude.extend(cli.exclude.iter().cloned());
    let only = if cli.only.is_empty() {
        tidy.only.unwrap_or_default()
    } else {
        cli.only.clone()
    };
    let short = cli.short.or(tidy.short).unwrap_or(false);

    Effective {
        dsl,
        output,
        extensions: catalog
            .extensions
            .unwrap_or_else(|| owned(&DEFAULT_EXTENSIONS)),
        header_extensions: catalog
            .header_extensions
            .unwrap_or_else(|| owned(&DEFAULT_HEADER_EXTENSIONS)),
        reserved: catalog.reserved.unwrap_or_else(|| owned(&DEFAULT_RESERVED)),
        exclude_globs: catalog.exclude.unwrap_or_default(),
        ignore_marker: catalog
            .ignore_marker
            .unwrap_or_else(|| DEFAULT_IGNORE_MARKER.to_string()),
        build_dirs: catalog
            .build_dirs
            .unwrap_or_else(|| owned(&DEFAULT_BUILD_DIRS)),
        exclude,
        only,
        short,
        analyzer: analyzer
            .program
            .unwrap_or_else(|| "clang-tidy".to_string()),
        timeout_secs: analyzer.timeout_secs,
        formatter: cfg
            .format
            .and_then(|f| f.program)
            .unwrap_or_else(|| "clang-format".to_string()),
        root,
    }
}

impl Effective {
    /// Path of the compiled analyzer config next to the DSL source.
    pub fn compiled_config(&self) -> PathBuf {
        self.root.join(crate::rules::COMPILED_CONFIG_NAME)
    }

    /// Extensions accepted by the catalog; headers removed when requested.
    pub fn accepted_extensions(&self, no_headers: bool) -> Vec<String> {
        self.extensions
            .iter()
            .filter(|e| !(no_headers && self.header_extensions.contains(e)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            root: root.to_str().map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let eff = resolve_effective(&at(dir.path()));
        assert_eq!(eff.dsl, dir.path().canonicalize().unwrap().join("clang-tidy"));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.build_dirs, vec!["build", "build/debug-clang"]);
        assert_eq!(eff.reserved, vec!["external", "build"]);
        assert_eq!(eff.analyzer, "clang-tidy");
        assert_eq!(eff.timeout_secs, None);
        assert!(!eff.short);
        assert_eq!(eff.compiled_config(), dir.path().canonicalize().unwrap().join(".clang-tidy"));
    }

    #[test]
    fn test_load_toml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("tidyrun.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
dsl = "tools/tidy-rules"
output = "json"
[catalog]
extensions = ["cc", "h"]
header_extensions = ["h"]
[tidy]
exclude = ["tests/"]
only = ["readability-magic-numbers"]
short = true
[analyzer]
program = "clang-tidy-17"
timeout_secs = 30
            "#
        )
        .unwrap();

        let mut cli = at(root);
        cli.exclude = vec!["gen".into()];
        cli.only = vec!["bugprone-use-after-move".into()];
        cli.short = Some(false);
        let eff = resolve_effective(&cli);
        assert_eq!(eff.dsl, root.canonicalize().unwrap().join("tools/tidy-rules"));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.exclude, vec!["tests/", "gen"]);
        assert_eq!(eff.only, vec!["bugprone-use-after-move"]);
        assert!(!eff.short);
        assert_eq!(eff.analyzer, "clang-tidy-17");
        assert_eq!(eff.timeout_secs, Some(30));
        assert_eq!(eff.accepted_extensions(true), vec!["cc"]);
        assert_eq!(eff.accepted_extensions(false), vec!["cc", "h"]);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tidyrun.yaml"),
            "catalog:\n  build_dirs: [out]\n  ignore_marker: '// skip'\nformat:\n  program: clang-format-17\n",
        )
        .unwrap();
        let eff = resolve_effective(&at(root));
        assert_eq!(eff.build_dirs, vec!["out"]);
        assert_eq!(eff.ignore_marker, "// skip");
        assert_eq!(eff.formatter, "clang-format-17");
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tidyrun.toml"), "output = [").unwrap();
        assert!(load_config(dir.path()).is_none());
        let eff = resolve_effective(&at(dir.path()));
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let dir = tempdir().unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = pathdiff::diff_paths(dir.path(), &cwd).unwrap();
        let eff = resolve_effective(&Overrides {
            root: relative.to_str().map(String::from),
            ..Default::default()
        });
        assert!(eff.root.is_absolute());
        assert_eq!(eff.root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_detect_root_walks_up_to_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("tidyrun.toml"), "").unwrap();
        let nested = root.join("libs/core/src");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_root(&nested), root.to_path_buf());
    }
}
