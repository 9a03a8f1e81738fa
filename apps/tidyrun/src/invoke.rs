//! Analyzer invocation behind the result cache.
//!
//! `Engine::run` answers from the cache when the stored result is still
//! valid; otherwise it launches the analyzer once, times it, and caches the
//! output if the analyzer exited with status 0. A non-zero status is returned
//! as `TidyError::AnalyzerFailed` and ends the run.

use crate::cache::AnalysisCache;
use crate::error::{Result, TidyError};
use crate::models::SourceEntry;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

#[derive(Debug, Clone, PartialEq)]
/// Raw result of one analyzer process.
pub struct ToolOutput {
    /// Exit code; `None` when the process died from a signal.
    pub code: Option<i32>,
    /// Standard output and standard error, interleaved.
    pub output: String,
}

/// Something that analyzes one source file.
pub trait Analyzer {
    fn analyze(&mut self, source: &Path) -> Result<ToolOutput>;
}

impl<A: Analyzer + ?Sized> Analyzer for &mut A {
    fn analyze(&mut self, source: &Path) -> Result<ToolOutput> {
        (**self).analyze(source)
    }
}

/// `clang-tidy -p <build> [--fix] <source>` as a subprocess.
pub struct ClangTidy {
    pub program: String,
    pub build_dir: PathBuf,
    pub fix: bool,
    pub timeout: Option<Duration>,
}

impl ClangTidy {
    pub fn new(program: impl Into<String>, build_dir: &Path) -> Self {
        Self {
            program: program.into(),
            build_dir: build_dir.to_path_buf(),
            fix: false,
            timeout: None,
        }
    }

    pub fn args(&self, source: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec!["-p".into(), self.build_dir.clone().into()];
        if self.fix {
            args.push("--fix".into());
        }
        args.push(source.into());
        args
    }

    fn spawn_err(&self, source: io::Error) -> TidyError {
        TidyError::AnalyzerSpawn {
            program: self.program.clone(),
            source,
        }
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    match child.wait_timeout(limit)? {
        Some(status) => Ok(Some(status)),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: &ExitStatus) -> bool {
    false
}

impl Analyzer for ClangTidy {
    fn analyze(&mut self, source: &Path) -> Result<ToolOutput> {
        let (mut reader, writer) = io::pipe().map_err(|e| self.spawn_err(e))?;
        let writer_err = writer.try_clone().map_err(|e| self.spawn_err(e))?;
        log::debug!("running {} on {}", self.program, source.display());
        // The Command owns the parent's copies of the write end; it must be
        // dropped before reading or EOF never arrives.
        let mut child = {
            let mut cmd = Command::new(&self.program);
            cmd.args(self.args(source))
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(writer_err);
            cmd.spawn().map_err(|e| self.spawn_err(e))?
        };
        let collector = thread::spawn(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map(|_| buf)
        });

        let status = match self.timeout {
            None => Some(child.wait().map_err(|e| self.spawn_err(e))?),
            Some(limit) => wait_with_deadline(&mut child, limit).map_err(|e| self.spawn_err(e))?,
        };
        let Some(status) = status else {
            return Err(TidyError::AnalyzerTimeout {
                file: source.display().to_string(),
                secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            });
        };
        // Ctrl-C reaches the analyzer and us together; the handler thread may
        // not have run yet, so the child's own signal decides.
        if killed_by_interrupt(&status) {
            return Err(TidyError::Interrupted {
                file: source.display().to_string(),
            });
        }
        let bytes = match collector.join() {
            Ok(res) => res.map_err(|e| self.spawn_err(e))?,
            Err(_) => Vec::new(),
        };
        Ok(ToolOutput {
            code: status.code(),
            output: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Analyzer output for one file, fresh or cached.
pub struct AnalyzerRun {
    pub output: String,
    pub duration: f64,
    pub cached: bool,
}

/// Cache-aware front of an [`Analyzer`].
pub struct Engine<'c, A: Analyzer> {
    analyzer: A,
    cache: &'c mut AnalysisCache,
}

impl<'c, A: Analyzer> Engine<'c, A> {
    pub fn new(analyzer: A, cache: &'c mut AnalysisCache) -> Self {
        Self { analyzer, cache }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn run(&mut self, entry: &SourceEntry) -> Result<AnalyzerRun> {
        if let Some(hit) = self.cache.lookup(&entry.rel, &entry.path) {
            return Ok(AnalyzerRun {
                output: hit.output,
                duration: hit.duration,
                cached: true,
            });
        }

        // Sampled before launch so edits made during analysis invalidate it.
        let inputs_at = self.cache.input_time(&entry.path);
        let start = Instant::now();
        let tool = self.analyzer.analyze(&entry.path)?;
        let duration = start.elapsed().as_secs_f64();

        if tool.code != Some(0) {
            return Err(TidyError::AnalyzerFailed {
                file: entry.rel.clone(),
                code: tool.code.unwrap_or(1),
                output: tool.output,
            });
        }
        match inputs_at {
            Some(time) => {
                if let Err(e) = self.cache.store(&entry.rel, time, &tool.output, duration) {
                    log::warn!("could not cache {}: {}", entry.rel, e);
                }
            }
            None => log::debug!("not caching {}: inputs missing", entry.rel),
        }
        Ok(AnalyzerRun {
            output: tool.output,
            duration,
            cached: false,
        })
    }
}
