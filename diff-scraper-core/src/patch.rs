//! Patch file rendering.
//!
//! One file per project, one block per commit:
//!
//! ```text
//! commit <id>
//! Author: <name> <<email>>
//! Date:   <Www Mmm DD HH:MM:SS YYYY> +<ffff>
//!
//!     <title>
//!
//! +++ a/<new_path>
//! --- b/<old_path>
//! <diff>
//! ```
//!
//! The `+<ffff>` suffix is not a timezone. It is the first four digits of the
//! fractional seconds, kept for compatibility with existing consumers of these
//! files. The real offset of the timestamp is discarded.

use chrono::{DateTime, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::contract::{CommitRecord, DiffEntry};

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("commit {commit} has an unparseable date {value:?}: {source}")]
    InvalidDate {
        commit: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A commit together with the per-file diffs fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedCommit {
    pub commit: CommitRecord,
    pub diffs: Vec<DiffEntry>,
}

/// `/` becomes `_` and spaces are removed.
pub fn sanitize_file_stem(project_name: &str) -> String {
    project_name.replace('/', "_").replace(' ', "")
}

pub fn patch_file_name(project_name: &str) -> String {
    format!("{}.patch", sanitize_file_stem(project_name))
}

/// Renders an ISO-8601 commit date as `Www Mmm DD HH:MM:SS YYYY +ffff`.
pub fn format_commit_date(raw: &str) -> Result<String, chrono::ParseError> {
    let wall_clock = DateTime::parse_from_rfc3339(raw)?.naive_local();
    let micros = (wall_clock.nanosecond() % 1_000_000_000) / 1_000;
    let fraction = format!("{micros:06}");
    Ok(format!(
        "{} +{}",
        wall_clock.format("%a %b %d %H:%M:%S %Y"),
        &fraction[..4]
    ))
}

pub fn render_commit(entry: &PatchedCommit) -> Result<String, PatchError> {
    let commit = &entry.commit;
    let date = format_commit_date(&commit.committed_date).map_err(|source| {
        PatchError::InvalidDate {
            commit: commit.id.clone(),
            value: commit.committed_date.clone(),
            source,
        }
    })?;

    let mut block = String::new();
    block.push_str(&format!("commit {}\n", commit.id));
    block.push_str(&format!(
        "Author: {} <{}>\n",
        commit.author_name, commit.author_email
    ));
    block.push_str(&format!("Date:   {date}\n"));
    block.push('\n');
    block.push_str(&format!("    {}\n", commit.title));
    block.push('\n');
    for file in &entry.diffs {
        block.push_str(&format!("+++ a/{}\n", file.new_path));
        block.push_str(&format!("--- b/{}\n", file.old_path));
        block.push_str(&file.diff);
        block.push('\n');
    }
    Ok(block)
}

/// Renders all commits in the given order. Nothing is produced if any date is invalid.
pub fn render_patch(commits: &[PatchedCommit]) -> Result<String, PatchError> {
    commits
        .iter()
        .map(render_commit)
        .collect::<Result<Vec<_>, _>>()
        .map(|blocks| blocks.concat())
}

/// Writes `<output_dir>/<sanitized project name>.patch` and returns its path.
pub fn write_patch(
    output_dir: &Path,
    project_name: &str,
    commits: &[PatchedCommit],
) -> Result<PathBuf, PatchError> {
    let rendered = render_patch(commits)?;
    let path = output_dir.join(patch_file_name(project_name));
    fs::write(&path, rendered).map_err(|source| PatchError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), commits = commits.len(), "[PATCH] Wrote patch file");
    Ok(path)
}
