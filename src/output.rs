//! Run output directory: `output_<YYYY-MM-DD-HH-MM-SS>`, created once per run.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

pub fn output_dir_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("output_{}", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Creates the run directory under `parent`. Fails if it already exists.
pub fn create_output_dir<Tz>(parent: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let dir = parent.join(output_dir_name(now));
    fs::create_dir(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    tracing::info!(path = %dir.display(), "Created output directory");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn names_directory_after_the_run_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(output_dir_name(&now), "output_2024-02-03-04-05-06");
    }

    #[test]
    fn second_creation_with_same_timestamp_fails() {
        let parent = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();

        let dir = create_output_dir(parent.path(), &now).unwrap();
        assert!(dir.is_dir());

        let err = create_output_dir(parent.path(), &now).unwrap_err();
        assert!(err.to_string().contains("Failed to create output directory"));
    }
}
