//! Error taxonomy shared by the catalog, cache, and invocation layers.
//!
//! Warnings found by the analyzer are not errors; they are counted by the
//! classifier. Everything here is fatal to the command that hit it.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TidyError>;

#[derive(Debug, Error)]
pub enum TidyError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to find build folder (looked for compile_commands.json under: {})", .searched.join(", "))]
    BuildFolderNotFound { searched: Vec<String> },

    #[error("rule file not found: {}", .0.display())]
    RuleFileNotFound(PathBuf),

    #[error("failed to launch `{program}`: {source}")]
    AnalyzerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analyzer exited with status {code} on {file}")]
    AnalyzerFailed {
        file: String,
        code: i32,
        output: String,
    },

    #[error("analyzer interrupted on {file}")]
    Interrupted { file: String },

    #[error("analyzer exceeded {secs}s on {file}")]
    AnalyzerTimeout { file: String, secs: u64 },

    #[error("invalid compile_commands.json at {}: {source}", .path.display())]
    CompileCommands {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TidyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TidyError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    ///
    /// Analyzer failures propagate the analyzer's own status; environment
    /// problems use 2, timeouts use 124 like coreutils `timeout` and an
    /// interrupted analyzer maps to 130.
    pub fn exit_code(&self) -> i32 {
        match self {
            TidyError::AnalyzerFailed { code, .. } => *code,
            TidyError::AnalyzerTimeout { .. } => 124,
            TidyError::Interrupted { .. } => 130,
            _ => 2,
        }
    }
}
