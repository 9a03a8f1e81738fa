//! Tidy runner: drives the analyzer over the catalog and aggregates results.
//!
//! Projects (catalog categories) and their files are visited in catalog
//! order. Per file: substring filters, cached-or-fresh analysis,
//! classification, aggregation, timing. Short-circuit mode leaves a project
//! after its first file with warnings. Cancellation is checked between files
//! and yields the partial report instead of an error.

use crate::cancel::CancellationToken;
use crate::catalog::Catalog;
use crate::classify::{classify, Classified};
use crate::error::{Result, TidyError};
use crate::invoke::{Analyzer, AnalyzerRun, Engine};
use crate::models::{ProjectReport, SourceEntry, TidyReport};

#[derive(Debug, Default, Clone)]
pub struct TidyOptions {
    /// Files whose relative path contains any of these are skipped.
    pub exclude: Vec<String>,
    /// Class allow-list; empty counts everything.
    pub only: Vec<String>,
    pub short: bool,
    /// List files without analyzing them.
    pub dry_run: bool,
}

impl TidyOptions {
    fn is_filtered(&self, entry: &SourceEntry) -> bool {
        self.exclude.iter().any(|x| entry.rel.contains(x.as_str()))
    }
}

/// Progress callbacks for incremental output.
pub trait Reporter {
    fn project_start(&mut self, _name: &str) {}
    fn file_start(&mut self, _entry: &SourceEntry) {}
    fn file_done(&mut self, _entry: &SourceEntry, _run: &AnalyzerRun, _result: &Classified) {}
    fn project_done(&mut self, _project: &ProjectReport) {}
}

/// Reporter that prints nothing.
pub struct Silent;

impl Reporter for Silent {}

/// Run the analyzer over `catalog`.
///
/// Analyzer failures abort with the error unless `cancel` was triggered, in
/// which case the failure is taken as the interrupt reaching the analyzer.
pub fn run_tidy<A: Analyzer>(
    catalog: &Catalog,
    engine: &mut Engine<'_, A>,
    opts: &TidyOptions,
    cancel: &CancellationToken,
    reporter: &mut dyn Reporter,
) -> Result<TidyReport> {
    let mut report = TidyReport::default();

    'projects: for (name, files) in catalog {
        if cancel.is_cancelled() {
            report.interrupted = true;
            break;
        }
        reporter.project_start(name);
        let mut project = ProjectReport {
            name: name.clone(),
            ..Default::default()
        };

        for entry in files {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }
            if opts.is_filtered(entry) {
                project.filtered += 1;
                continue;
            }
            reporter.file_start(entry);
            if opts.dry_run {
                continue;
            }
            let run = match engine.run(entry) {
                Ok(run) => run,
                Err(TidyError::Interrupted { file }) => {
                    log::debug!("analyzer interrupted on {}", file);
                    report.interrupted = true;
                    break;
                }
                Err(e) if cancel.is_cancelled() => {
                    log::debug!("analyzer stopped by interrupt: {}", e);
                    report.interrupted = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            let result = classify(&entry.rel, &run.output, &opts.only);

            project.files += 1;
            if run.cached {
                report.cache_hits += 1;
            }
            project.warnings.merge(&result.warnings);
            project.classes.merge(&result.classes);
            report.credit_classes(&entry.rel, &result.classes);
            report.timing.record(&entry.rel, run.duration);
            reporter.file_done(entry, &run, &result);

            if opts.short && result.warning_count() > 0 {
                project.short_circuited = true;
                break;
            }
        }

        report.total.merge(&project.warnings);
        reporter.project_done(&project);
        report.projects.push(project);
        if report.interrupted {
            break 'projects;
        }
    }
    Ok(report)
}
