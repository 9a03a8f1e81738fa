//! Shared data models for catalog entries, counters, and tidy reports.

pub mod timing;

pub use timing::TimingStats;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A discovered source file.
///
/// `rel` is the root-relative path with `/` separators and doubles as the
/// cache key and the printable name; `category` is its parent directory.
pub struct SourceEntry {
    #[serde(skip)]
    pub path: PathBuf,
    pub rel: String,
    pub category: String,
    pub extension: String,
}

impl SourceEntry {
    /// Path with the extension stripped, used as the primary sort key.
    pub fn stem(&self) -> &str {
        if self.extension.is_empty() {
            return &self.rel;
        }
        &self.rel[..self.rel.len() - self.extension.len() - 1]
    }

    pub fn file_name(&self) -> &str {
        self.rel.rsplit('/').next().unwrap_or(&self.rel)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
/// Multiset of string keys; a key is present only once it has been counted.
pub struct Counter(BTreeMap<String, usize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &str, n: usize) {
        if n == 0 {
            return;
        }
        *self.0.entry(key.to_string()).or_insert(0) += n;
    }

    pub fn merge(&mut self, other: &Counter) {
        for (k, v) in other.iter() {
            self.add(k, v);
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Highest counts first; ties broken by key for stable output.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut items: Vec<(&str, usize)> = self.iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        items.truncate(n);
        items
    }
}

#[derive(Debug, Default, Clone, Serialize)]
/// Warnings collected for one category.
pub struct ProjectReport {
    pub name: String,
    /// file -> warning count
    pub warnings: Counter,
    /// class tag -> warning count within this category
    pub classes: Counter,
    /// Files analyzed (cache hits included).
    pub files: usize,
    /// Files dropped by the substring filters.
    pub filtered: usize,
    /// Set when short-circuit mode abandoned the rest of the project.
    pub short_circuited: bool,
}

#[derive(Debug, Default, Clone, Serialize)]
/// Aggregated result of one `tidy` run.
pub struct TidyReport {
    pub projects: Vec<ProjectReport>,
    /// file -> warning count across all projects
    pub total: Counter,
    /// class tag -> warning count
    pub classes: Counter,
    /// class tag -> files that produced it
    pub class_files: BTreeMap<String, BTreeSet<String>>,
    pub timing: TimingStats,
    pub cache_hits: usize,
    pub interrupted: bool,
}

impl TidyReport {
    /// CI exit status: non-zero iff any warning was counted.
    pub fn exit_code(&self) -> i32 {
        if self.total.is_empty() {
            0
        } else {
            1
        }
    }

    pub fn credit_classes(&mut self, file: &str, classes: &Counter) {
        self.classes.merge(classes);
        for (class, _) in classes.iter() {
            self.class_files
                .entry(class.to_string())
                .or_default()
                .insert(file.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rel: &str, ext: &str) -> SourceEntry {
        SourceEntry {
            path: PathBuf::from(rel),
            rel: rel.into(),
            category: "core".into(),
            extension: ext.into(),
        }
    }

    #[test]
    fn stem_strips_extension_only() {
        assert_eq!(entry("core/foo.cpp", "cpp").stem(), "core/foo");
        assert_eq!(entry("core/Makefile", "").stem(), "core/Makefile");
        assert_eq!(entry("core/foo.cpp", "cpp").file_name(), "foo.cpp");
    }

    #[test]
    fn counter_most_common_orders_by_count_then_key() {
        let mut c = Counter::new();
        c.add("b", 2);
        c.add("a", 2);
        c.incr("z");
        c.add("zero", 0);
        assert_eq!(c.most_common(2), vec![("a", 2), ("b", 2)]);
        assert_eq!(c.total(), 5);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get("zero"), 0);
    }

    #[test]
    fn exit_code_tracks_total_counter() {
        let mut report = TidyReport::default();
        assert_eq!(report.exit_code(), 0);
        report.total.incr("core/a.cc");
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn credit_classes_builds_reverse_index() {
        let mut report = TidyReport::default();
        let mut classes = Counter::new();
        classes.incr("readability-magic-numbers");
        classes.incr("cppcoreguidelines-avoid-magic-numbers");
        report.credit_classes("core/a.cc", &classes);
        report.credit_classes("core/b.cc", &classes);
        assert_eq!(report.classes.get("readability-magic-numbers"), 2);
        let files = &report.class_files["readability-magic-numbers"];
        assert_eq!(
            files.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["core/a.cc", "core/b.cc"]
        );
    }
}
