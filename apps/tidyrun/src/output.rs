//! Output rendering for tidy runs and file listings.
//!
//! Supports `human` (default, incremental) and `json` (single document at
//! the end) outputs.

use crate::catalog::Catalog;
use crate::classify::Classified;
use crate::invoke::AnalyzerRun;
use crate::models::{Counter, ProjectReport, SourceEntry, TidyReport};
use crate::tidy::Reporter;
use crate::utils::header;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::io::Write;

const MOST_COMMON: usize = 10;

pub fn use_colors(output: &str) -> bool {
    output != "json" && crate::utils::colors_enabled()
}

fn project_title(name: &str) -> &str {
    if name.is_empty() {
        "."
    } else {
        name
    }
}

/// Lines for `N warnings in <name>.` followed by the top entries.
pub fn counter_lines(counter: &Counter, name: &str) -> Vec<String> {
    let mut lines = vec![format!("{} warnings in {}.", counter.total(), name)];
    for (key, count) in counter.most_common(MOST_COMMON) {
        lines.push(format!("{} at {}", key, count));
    }
    lines
}

/// Incremental human-readable printer.
pub struct HumanReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> HumanReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Terminal output is best effort; a closed pipe must not abort a run.
    fn line(&mut self, s: &str) {
        let _ = writeln!(self.out, "{}", s);
    }

    fn counter(&mut self, counter: &Counter, name: &str) {
        let lines = counter_lines(counter, name);
        for (i, l) in lines.iter().enumerate() {
            if i == 0 && self.color && counter.total() > 0 {
                self.line(&l.yellow().bold().to_string());
            } else {
                self.line(l);
            }
        }
    }

    fn banner(&mut self, name: &str) {
        let h = header(name, '-');
        if self.color {
            self.line(&h.bold().to_string());
        } else {
            self.line(&h);
        }
    }

    /// Final report: totals, classes, class index, timing.
    pub fn summary(&mut self, report: &TidyReport) {
        self.banner("TIDY REPORT");
        self.counter(&report.total, "total");
        self.line("");
        self.counter(&report.classes, "classes");
        if !report.class_files.is_empty() {
            self.line("");
            for (class, files) in &report.class_files {
                let title = format!("{} ({}):", class, files.len());
                if self.color {
                    self.line(&title.bold().to_string());
                } else {
                    self.line(&title);
                }
                for f in files {
                    self.line(&format!("    {}", f));
                }
            }
        }
        self.line("");
        for l in timing_lines(report) {
            self.line(&l);
        }
        if report.interrupted {
            let note = "interrupted: report covers the files analyzed so far";
            if self.color {
                self.line(&note.yellow().to_string());
            } else {
                self.line(note);
            }
        }
        let _ = self.out.flush();
    }
}

/// Timing summary lines; empty runs get a single line.
pub fn timing_lines(report: &TidyReport) -> Vec<String> {
    let t = &report.timing;
    let (Some(mean), Some((min_f, min_s)), Some((max_f, max_s))) = (t.mean(), t.min(), t.max())
    else {
        return vec!["0 files analyzed.".to_string()];
    };
    vec![
        format!(
            "{} files analyzed ({} from cache).",
            t.len(),
            report.cache_hits
        ),
        format!("mean {:.2}s", mean),
        format!("min  {:.2}s {}", min_s, min_f),
        format!("max  {:.2}s {}", max_s, max_f),
    ]
}

impl<W: Write> Reporter for HumanReporter<W> {
    fn project_start(&mut self, name: &str) {
        self.banner(project_title(name));
    }

    fn file_start(&mut self, entry: &SourceEntry) {
        if self.color {
            let name = entry.rel.bold().to_string();
            self.line(&name);
        } else {
            self.line(&entry.rel);
        }
        let _ = self.out.flush();
    }

    fn file_done(&mut self, entry: &SourceEntry, run: &AnalyzerRun, result: &Classified) {
        for l in &result.lines {
            self.line(l);
        }
        if run.cached {
            self.line("    (cached)");
        } else {
            self.line(&format!("    {:.2}s", run.duration));
        }
        self.counter(&result.classes, &entry.rel);
        self.line("");
    }

    fn project_done(&mut self, project: &ProjectReport) {
        let title = project_title(&project.name);
        self.counter(&project.warnings, title);
        if !project.classes.is_empty() {
            self.line("");
            self.counter(&project.classes, &format!("{} classes", title));
        }
        if project.short_circuited {
            self.line("(stopped at first file with warnings)");
        }
        self.line("");
        self.line("");
    }
}

/// Compose the tidy JSON document (pure) for testing/snapshot purposes.
pub fn compose_tidy_json(report: &TidyReport) -> JsonVal {
    json!({
        "projects": report.projects,
        "total": report.total,
        "classes": report.classes,
        "class_files": report.class_files,
        "timing": report.timing,
        "summary": {
            "warnings": report.total.total(),
            "files_with_warnings": report.total.len(),
            "files": report.timing.len(),
            "cache_hits": report.cache_hits,
            "interrupted": report.interrupted,
        }
    })
}

pub fn print_tidy_json(report: &TidyReport) {
    match serde_json::to_string_pretty(&compose_tidy_json(report)) {
        Ok(s) => println!("{}", s),
        Err(e) => log::error!("cannot render report: {}", e),
    }
}

/// Lines for `ls`: flat relative paths, or grouped under category banners.
pub fn list_lines(catalog: &Catalog, grouped: bool) -> Vec<String> {
    let mut out = Vec::new();
    for (category, files) in catalog {
        if grouped {
            out.push(format!("{}:", project_title(category)));
            for f in files {
                out.push(format!("    {}", f.file_name()));
            }
        } else {
            out.extend(files.iter().map(|f| f.rel.clone()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn entry(rel: &str) -> SourceEntry {
        SourceEntry {
            path: PathBuf::from(rel),
            rel: rel.into(),
            category: "core".into(),
            extension: "cc".into(),
        }
    }

    fn sample_report() -> TidyReport {
        let mut r = TidyReport::default();
        let c = classify("core/a.cc", "a.cc:1:1: warning: x [a-b,c-d]\n", &[]);
        r.total.merge(&c.warnings);
        r.credit_classes("core/a.cc", &c.classes);
        r.timing.record("core/a.cc", 1.5);
        r.timing.record("core/b.cc", 0.5);
        r.cache_hits = 1;
        r.projects.push(ProjectReport {
            name: "core".into(),
            warnings: c.warnings.clone(),
            classes: c.classes.clone(),
            files: 2,
            ..Default::default()
        });
        r
    }

    #[test]
    fn test_counter_lines_match_classic_format() {
        let mut c = Counter::new();
        c.add("core/a.cc", 3);
        c.incr("core/b.cc");
        assert_eq!(
            counter_lines(&c, "core"),
            vec!["4 warnings in core.", "core/a.cc at 3", "core/b.cc at 1"]
        );
    }

    #[test]
    fn test_human_reporter_file_block() {
        let mut rep = HumanReporter::new(Vec::new(), false);
        let e = entry("core/a.cc");
        let result = classify("core/a.cc", "a.cc:1:1: warning: x [a-b]\n", &[]);
        let run = AnalyzerRun {
            output: String::new(),
            duration: 0.25,
            cached: false,
        };
        rep.file_start(&e);
        rep.file_done(&e, &run, &result);
        let text = String::from_utf8(rep.into_inner()).unwrap();
        assert_eq!(
            text,
            "core/a.cc\na.cc:1:1: warning: x [a-b]\n    0.25s\n1 warnings in core/a.cc.\na-b at 1\n\n"
        );
    }

    #[test]
    fn test_project_block_lists_files_then_classes() {
        let mut rep = HumanReporter::new(Vec::new(), false);
        rep.project_done(&sample_report().projects[0]);
        let text = String::from_utf8(rep.into_inner()).unwrap();
        assert_eq!(
            text,
            "1 warnings in core.\ncore/a.cc at 1\n\n2 warnings in core classes.\na-b at 1\nc-d at 1\n\n\n"
        );
    }

    #[test]
    fn test_summary_lists_reverse_index_and_timing() {
        let mut rep = HumanReporter::new(Vec::new(), false);
        rep.summary(&sample_report());
        let text = String::from_utf8(rep.into_inner()).unwrap();
        assert!(text.contains("TIDY REPORT"));
        assert!(text.contains("1 warnings in total.\ncore/a.cc at 1\n"));
        assert!(text.contains("a-b (1):\n    core/a.cc\n"));
        assert!(text.contains("2 files analyzed (1 from cache)."));
        assert!(text.contains("mean 1.00s"));
        assert!(text.contains("max  1.50s core/a.cc"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn test_summary_flags_interrupted_runs() {
        let mut report = TidyReport::default();
        report.interrupted = true;
        let mut rep = HumanReporter::new(Vec::new(), false);
        rep.summary(&report);
        let text = String::from_utf8(rep.into_inner()).unwrap();
        assert!(text.contains("0 files analyzed."));
        assert!(text.contains("interrupted"));
    }

    #[test]
    fn test_compose_tidy_json_shape() {
        let out = compose_tidy_json(&sample_report());
        assert_eq!(out["summary"]["warnings"], 1);
        assert_eq!(out["summary"]["files"], 2);
        assert_eq!(out["classes"]["c-d"], 1);
        assert_eq!(out["class_files"]["a-b"][0], "core/a.cc");
        assert_eq!(out["projects"][0]["name"], "core");
        assert_eq!(out["projects"][0]["warnings"]["core/a.cc"], 1);
        assert_eq!(out["projects"][0]["classes"]["a-b"], 1);
        assert_eq!(out["timing"]["mean"], 1.0);
    }

    #[test]
    fn test_list_lines_flat_and_grouped() {
        let mut cat = Catalog::new();
        cat.insert("core".into(), vec![entry("core/a.cc"), entry("core/a.h")]);
        assert_eq!(list_lines(&cat, false), vec!["core/a.cc", "core/a.h"]);
        assert_eq!(
            list_lines(&cat, true),
            vec!["core:", "    a.cc", "    a.h"]
        );
    }
}
