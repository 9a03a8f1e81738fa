//! Source file discovery.
//!
//! Walks the project root, keeps files with accepted extensions, prunes
//! reserved subtrees (vendored code, build output), drops files that opt out
//! through their first line, and groups the rest by parent directory.
//!
//! Within a category files are ordered by stem ascending, then extension
//! descending, so `foo.cpp` sits right before `foo.h`.

use crate::error::{Result, TidyError};
use crate::models::SourceEntry;
use glob::Pattern;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const COMPILE_COMMANDS: &str = "compile_commands.json";

/// Files grouped by category, both levels in deterministic order.
pub type Catalog = BTreeMap<String, Vec<SourceEntry>>;

/// Decides whether a candidate file asked to be left out of analysis.
pub trait ExclusionCheck {
    fn is_excluded(&self, path: &Path) -> Result<bool>;
}

/// Excludes files whose first line, trimmed, equals the marker.
pub struct FirstLineMarker {
    marker: String,
}

impl FirstLineMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl ExclusionCheck for FirstLineMarker {
    fn is_excluded(&self, path: &Path) -> Result<bool> {
        let file = File::open(path).map_err(|e| TidyError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut first = Vec::new();
        reader
            .read_until(b'\n', &mut first)
            .map_err(|e| TidyError::io(path, e))?;
        Ok(String::from_utf8_lossy(&first).trim() == self.marker)
    }
}

/// Never excludes anything.
pub struct NoExclusion;

impl ExclusionCheck for NoExclusion {
    fn is_excluded(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Default, Clone)]
/// What the walk keeps.
pub struct Filter {
    /// Accepted extensions without the dot; `None` accepts every file.
    pub extensions: Option<Vec<String>>,
    /// Root-relative prefixes whose subtrees are skipped.
    pub reserved: Vec<String>,
    /// Glob patterns on root-relative paths.
    pub exclude: Vec<Pattern>,
}

impl Filter {
    /// Compile glob strings, dropping (and logging) invalid ones.
    pub fn with_globs(mut self, globs: &[String]) -> Self {
        for g in globs {
            match Pattern::new(g) {
                Ok(p) => self.exclude.push(p),
                Err(e) => log::warn!("ignoring exclude pattern {:?}: {}", g, e),
            }
        }
        self
    }

    fn is_reserved(&self, rel: &Path) -> bool {
        self.reserved.iter().any(|r| rel.starts_with(r))
    }

    fn accepts_extension(&self, ext: &str) -> bool {
        match &self.extensions {
            Some(list) => list.iter().any(|e| e == ext),
            None => true,
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Root-relative path with `/` separators.
pub fn rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn to_entry(root: &Path, path: &Path) -> SourceEntry {
    let rel_path = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let rel = rel_string(&rel_path);
    let category = rel_path
        .parent()
        .map(rel_string)
        .unwrap_or_default();
    let extension = rel_path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    SourceEntry {
        path: path.to_path_buf(),
        rel,
        category,
        extension,
    }
}

/// Sort by stem ascending, then extension descending.
pub fn sort_entries(entries: &mut [SourceEntry]) {
    entries.sort_by(|a, b| {
        a.stem()
            .cmp(b.stem())
            .then_with(|| b.extension.cmp(&a.extension))
    });
}

fn group(entries: Vec<SourceEntry>) -> Catalog {
    let mut out: Catalog = BTreeMap::new();
    for e in entries {
        out.entry(e.category.clone()).or_default().push(e);
    }
    for files in out.values_mut() {
        sort_entries(files);
    }
    out
}

/// Walk `root` and build the catalog.
///
/// An unreadable file during the exclusion check aborts the walk.
pub fn discover(root: &Path, filter: &Filter, exclusion: &dyn ExclusionCheck) -> Result<Catalog> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    let pruned = walker.filter_entry(|e| {
        let rel = e.path().strip_prefix(root).unwrap_or(e.path());
        rel.as_os_str().is_empty() || !filter.is_reserved(rel)
    });
    for item in pruned {
        let dent = item.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            TidyError::io(path, io)
        })?;
        if !dent.file_type().is_file() {
            continue;
        }
        let entry = to_entry(root, dent.path());
        if !filter.accepts_extension(&entry.extension) {
            continue;
        }
        if filter.exclude.iter().any(|p| p.matches(&entry.rel)) {
            log::debug!("excluded by pattern: {}", entry.rel);
            continue;
        }
        if exclusion.is_excluded(dent.path())? {
            log::debug!("excluded by marker: {}", entry.rel);
            continue;
        }
        entries.push(entry);
    }
    Ok(group(entries))
}

/// Locate the build folder holding `compile_commands.json`.
pub fn find_build_root(root: &Path, candidates: &[String]) -> Result<PathBuf> {
    for rel in candidates {
        let build = root.join(rel);
        if build.join(COMPILE_COMMANDS).is_file() {
            log::debug!("using build folder {}", build.display());
            return Ok(build);
        }
    }
    Err(TidyError::BuildFolderNotFound {
        searched: candidates.to_vec(),
    })
}

#[derive(serde::Deserialize)]
struct CompileCommand {
    directory: Option<String>,
    file: String,
}

/// Catalog the translation units listed in `compile_commands.json`.
///
/// Relative `file` entries are resolved against their `directory`. The same
/// reserved prefixes and exclusion check as [`discover`] apply; files outside
/// `root` are skipped.
pub fn from_compile_commands(
    root: &Path,
    build: &Path,
    filter: &Filter,
    exclusion: &dyn ExclusionCheck,
) -> Result<Catalog> {
    let path = build.join(COMPILE_COMMANDS);
    let text = std::fs::read_to_string(&path).map_err(|e| TidyError::io(&path, e))?;
    let commands: Vec<CompileCommand> =
        serde_json::from_str(&text).map_err(|source| TidyError::CompileCommands {
            path: path.clone(),
            source,
        })?;
    // Database paths are absolute and resolved; compare against the same form.
    let canonical_root = canonical(root);
    let root = canonical_root.as_path();
    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();
    let mut outside = 0usize;
    for cmd in commands {
        let file = PathBuf::from(&cmd.file);
        let abs = match (&cmd.directory, file.is_absolute()) {
            (Some(dir), false) => Path::new(dir).join(file),
            _ => file,
        };
        let abs = canonical(&abs);
        let Ok(rel) = abs.strip_prefix(root) else {
            log::debug!("outside root: {}", abs.display());
            outside += 1;
            continue;
        };
        if filter.is_reserved(rel) || !seen.insert(abs.clone()) {
            continue;
        }
        let entry = to_entry(root, &abs);
        if !filter.accepts_extension(&entry.extension)
            || filter.exclude.iter().any(|p| p.matches(&entry.rel))
        {
            continue;
        }
        if exclusion.is_excluded(&abs)? {
            continue;
        }
        entries.push(entry);
    }
    if entries.is_empty() && outside > 0 {
        log::warn!(
            "all {} entries of {} lie outside {}",
            outside,
            path.display(),
            root.display()
        );
    }
    Ok(group(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    fn cpp_filter() -> Filter {
        Filter {
            extensions: Some(vec!["cpp".into(), "h".into(), "cc".into()]),
            reserved: vec!["external".into(), "build".into()],
            exclude: vec![],
        }
    }

    fn names(cat: &Catalog, key: &str) -> Vec<String> {
        cat[key].iter().map(|e| e.rel.clone()).collect()
    }

    #[test]
    fn test_orders_by_stem_then_extension_descending() {
        let dir = tempdir().unwrap();
        for f in ["core/foo.h", "core/foo.cpp", "core/bar.cpp"] {
            touch(dir.path(), f, "int x;\n");
        }
        let cat = discover(dir.path(), &cpp_filter(), &NoExclusion).unwrap();
        assert_eq!(
            names(&cat, "core"),
            vec!["core/bar.cpp", "core/foo.cpp", "core/foo.h"]
        );
    }

    #[test]
    fn test_groups_by_parent_directory() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "main.cc", "");
        touch(dir.path(), "libs/core/src/a.cc", "");
        touch(dir.path(), "libs/render/src/b.cc", "");
        let cat = discover(dir.path(), &cpp_filter(), &NoExclusion).unwrap();
        let cats: Vec<&str> = cat.keys().map(String::as_str).collect();
        assert_eq!(cats, vec!["", "libs/core/src", "libs/render/src"]);
        let e = &cat["libs/core/src"][0];
        assert_eq!(e.extension, "cc");
        assert_eq!(e.path, dir.path().join("libs/core/src/a.cc"));
    }

    #[test]
    fn test_reserved_prefixes_and_extensions_are_filtered() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "external/lib/x.cc", "");
        touch(dir.path(), "build/gen/y.cc", "");
        touch(dir.path(), "builder/z.cc", "");
        touch(dir.path(), "core/readme.md", "");
        touch(dir.path(), "core/a.cc", "");
        let cat = discover(dir.path(), &cpp_filter(), &NoExclusion).unwrap();
        let all: Vec<String> = cat.values().flatten().map(|e| e.rel.clone()).collect();
        assert_eq!(all, vec!["builder/z.cc", "core/a.cc"]);
    }

    #[test]
    fn test_no_extension_filter_accepts_everything() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "core/readme.md", "");
        touch(dir.path(), "core/a.cc", "");
        let filter = Filter {
            extensions: None,
            ..cpp_filter()
        };
        let cat = discover(dir.path(), &filter, &NoExclusion).unwrap();
        assert_eq!(names(&cat, "core"), vec!["core/a.cc", "core/readme.md"]);
    }

    #[test]
    fn test_glob_excludes_match_relative_paths() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "core/gen/a.cc", "");
        touch(dir.path(), "core/b.cc", "");
        let filter = cpp_filter().with_globs(&["core/gen/*".to_string(), "[".to_string()]);
        let cat = discover(dir.path(), &filter, &NoExclusion).unwrap();
        assert!(!cat.contains_key("core/gen"));
        assert_eq!(names(&cat, "core"), vec!["core/b.cc"]);
    }

    #[test]
    fn test_first_line_marker_excludes_file() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "core/a.cc", "  // clang-tidy: ignore  \nint x;\n");
        touch(dir.path(), "core/b.cc", "int y;\n// clang-tidy: ignore\n");
        let marker = FirstLineMarker::new("// clang-tidy: ignore");
        let cat = discover(dir.path(), &cpp_filter(), &marker).unwrap();
        assert_eq!(names(&cat, "core"), vec!["core/b.cc"]);
    }

    #[test]
    fn test_marker_check_tolerates_non_utf8() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a.cc");
        fs::write(&p, [0xff, 0xfe, b'\n']).unwrap();
        assert!(!FirstLineMarker::new("x").is_excluded(&p).unwrap());
    }

    #[test]
    fn test_marker_check_on_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = FirstLineMarker::new("x")
            .is_excluded(&dir.path().join("gone.cc"))
            .unwrap_err();
        assert!(matches!(err, TidyError::Io { .. }));
    }

    #[test]
    fn test_find_build_root_prefers_first_candidate() {
        let dir = tempdir().unwrap();
        let candidates = vec!["build".to_string(), "build/debug-clang".to_string()];
        assert!(matches!(
            find_build_root(dir.path(), &candidates),
            Err(TidyError::BuildFolderNotFound { .. })
        ));
        touch(dir.path(), "build/debug-clang/compile_commands.json", "[]");
        assert_eq!(
            find_build_root(dir.path(), &candidates).unwrap(),
            dir.path().join("build/debug-clang")
        );
        touch(dir.path(), "build/compile_commands.json", "[]");
        assert_eq!(
            find_build_root(dir.path(), &candidates).unwrap(),
            dir.path().join("build")
        );
    }

    #[test]
    fn test_from_compile_commands_resolves_and_dedups() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "core/a.cc", "");
        touch(root, "core/a.h", "");
        touch(root, "external/x.cc", "");
        let abs_a = root.join("core/a.cc");
        let db = serde_json::json!([
            {"directory": root.join("build").to_string_lossy(), "file": abs_a.to_string_lossy()},
            {"directory": root.to_string_lossy(), "file": "core/a.cc"},
            {"directory": root.to_string_lossy(), "file": "external/x.cc"},
            {"directory": "/elsewhere", "file": "/elsewhere/y.cc"},
        ]);
        touch(root, "build/compile_commands.json", &db.to_string());
        let cat = from_compile_commands(root, &root.join("build"), &cpp_filter(), &NoExclusion)
            .unwrap();
        assert_eq!(cat.len(), 1);
        assert_eq!(names(&cat, "core"), vec!["core/a.cc"]);
    }

    #[test]
    fn test_from_compile_commands_with_relative_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "core/a.cc", "");
        let abs_a = root.canonicalize().unwrap().join("core/a.cc");
        let db = serde_json::json!([
            {"directory": root.to_string_lossy(), "file": abs_a.to_string_lossy()},
        ]);
        touch(root, "build/compile_commands.json", &db.to_string());
        let cwd = std::env::current_dir().unwrap();
        let relative = pathdiff::diff_paths(root, &cwd).unwrap();
        assert!(relative.is_relative());
        let cat = from_compile_commands(
            &relative,
            &relative.join("build"),
            &cpp_filter(),
            &NoExclusion,
        )
        .unwrap();
        assert_eq!(names(&cat, "core"), vec!["core/a.cc"]);
    }

    #[test]
    fn test_from_compile_commands_rejects_garbage() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "build/compile_commands.json", "{");
        let err = from_compile_commands(
            dir.path(),
            &dir.path().join("build"),
            &cpp_filter(),
            &NoExclusion,
        )
        .unwrap_err();
        assert!(matches!(err, TidyError::CompileCommands { .. }));
    }
}
