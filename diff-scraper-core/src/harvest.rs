//! High-level pipeline: traversal → discovery → per-project processing.
//!
//! Stages run one after another; work inside a stage runs concurrently up to
//! the stage's limit in [`Concurrency`](crate::config::Concurrency).
//!
//! # Error Handling
//! Nothing in here aborts the run. Failed fetches shrink a stage's result,
//! per-project errors and panics are caught at the project boundary, logged
//! with the project identity and listed in [`HarvestReport::failed`].
//!
//! # Navigation
//! - Main entrypoint: [`harvest`]
//! - Supporting types: [`HarvestReport`], [`WrittenPatch`], [`SkippedProject`], [`FailedProject`]

use futures::future::FutureExt;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::{HarvestConfig, Target};
use crate::contract::{GitlabApi, Project};
use crate::discovery::{discover_projects, fetch_one_project, ProjectMap};
use crate::processor::{process_project, ProjectOutcome};
use crate::traversal::discover_subgroups;

#[derive(Debug, Default)]
pub struct HarvestReport {
    pub projects_discovered: usize,
    pub written: Vec<WrittenPatch>,
    pub skipped: Vec<SkippedProject>,
    pub failed: Vec<FailedProject>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPatch {
    pub project_id: String,
    pub project_name: String,
    pub path: PathBuf,
    pub commits: usize,
}

/// A project that finished without producing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProject {
    pub project_id: String,
    pub project_name: String,
    pub outcome: ProjectOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedProject {
    pub project_id: String,
    pub project_name: String,
    pub reason: String,
}

/// Runs the whole pipeline for `config` against `api`.
pub async fn harvest<A>(config: &HarvestConfig, api: &A) -> HarvestReport
where
    A: GitlabApi + ?Sized,
{
    config.trace_loaded();
    info!("[HARVEST] Starting harvest pipeline");

    let projects = resolve_projects(config, api).await;
    let mut report = HarvestReport {
        projects_discovered: projects.len(),
        ..HarvestReport::default()
    };

    let limit = config.concurrency.normalized().processing;
    let results: Vec<(Project, Result<ProjectOutcome, String>)> = stream::iter(projects.into_values())
        .map(|project| async move {
            let result = AssertUnwindSafe(process_project(api, config, &project))
                .catch_unwind()
                .await
                .map_err(panic_reason)
                .and_then(|processed| processed.map_err(|e| e.to_string()));
            (project, result)
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    for (project, result) in results {
        match result {
            Ok(ProjectOutcome::Written { path, commits }) => report.written.push(WrittenPatch {
                project_id: project.id,
                project_name: project.name,
                path,
                commits,
            }),
            Ok(outcome) => {
                info!(project_id = %project.id, name = %project.name, outcome = ?outcome, "[HARVEST] Project produced no patch");
                report.skipped.push(SkippedProject {
                    project_id: project.id,
                    project_name: project.name,
                    outcome,
                });
            }
            Err(reason) => {
                error!(project_id = %project.id, name = %project.name, reason = %reason, "[HARVEST][ERROR] Project processing failed");
                report.failed.push(FailedProject {
                    project_id: project.id,
                    project_name: project.name,
                    reason,
                });
            }
        }
    }

    info!(
        discovered = report.projects_discovered,
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "[HARVEST] Harvest complete"
    );
    report
}

async fn resolve_projects<A>(config: &HarvestConfig, api: &A) -> ProjectMap
where
    A: GitlabApi + ?Sized,
{
    let limits = config.concurrency.normalized();
    match &config.target {
        Target::Group(root) => {
            let subgroups = discover_subgroups(api, root, limits.traversal).await;
            // The root's own projects are harvested along with its subgroups'.
            let groups = std::iter::once(root.clone()).chain(subgroups);
            discover_projects(api, groups, limits.discovery).await
        }
        Target::Project(project_id) => {
            let projects = fetch_one_project(api, project_id).await;
            if projects.is_empty() {
                warn!(project_id = %project_id, "[HARVEST] Requested project is unavailable or excluded");
            }
            projects
        }
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("panicked: {message}")
}
