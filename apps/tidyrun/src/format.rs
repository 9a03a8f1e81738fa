//! In-place source formatting with an external formatter.
//!
//! Every cataloged file is handed to `<formatter> -i <file>`. Files within a
//! project are formatted in parallel; results keep catalog order so the
//! printed listing is deterministic.

use crate::catalog::Catalog;
use rayon::prelude::*;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    pub file: String,
    /// False when the formatter failed or could not be launched.
    pub ok: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFormat {
    pub name: String,
    pub results: Vec<FormatResult>,
}

fn format_one(program: &str, path: &std::path::Path, rel: &str) -> FormatResult {
    let out = Command::new(program)
        .arg("-i")
        .arg(path)
        .stdin(Stdio::null())
        .output();
    match out {
        Ok(o) if o.status.success() => FormatResult {
            file: rel.to_string(),
            ok: true,
            message: None,
        },
        Ok(o) => {
            let mut msg = String::from_utf8_lossy(&o.stderr).trim().to_string();
            if msg.is_empty() {
                msg = format!("{} exited with {}", program, o.status);
            }
            FormatResult {
                file: rel.to_string(),
                ok: false,
                message: Some(msg),
            }
        }
        Err(e) => FormatResult {
            file: rel.to_string(),
            ok: false,
            message: Some(format!("failed to launch {}: {}", program, e)),
        },
    }
}

/// Format all files in `catalog`. With `write == false` nothing is run and
/// every file is reported as ok.
pub fn run_format(catalog: &Catalog, program: &str, write: bool) -> Vec<ProjectFormat> {
    catalog
        .iter()
        .map(|(name, files)| {
            let results = if write {
                files
                    .par_iter()
                    .map(|f| format_one(program, &f.path, &f.rel))
                    .collect()
            } else {
                files
                    .iter()
                    .map(|f| FormatResult {
                        file: f.rel.clone(),
                        ok: true,
                        message: None,
                    })
                    .collect()
            };
            ProjectFormat {
                name: name.clone(),
                results,
            }
        })
        .collect()
}

pub fn failures(projects: &[ProjectFormat]) -> usize {
    projects
        .iter()
        .flat_map(|p| p.results.iter())
        .filter(|r| !r.ok)
        .count()
}
