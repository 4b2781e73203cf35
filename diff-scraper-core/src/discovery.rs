//! Resolves the candidate projects of a run.
//!
//! Group mode fetches the projects of every group concurrently and folds them
//! into an id-keyed map, so a project listed under several groups is kept once
//! (last seen wins). Archived projects and projects with an empty repository
//! are dropped here and never reach processing.

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::contract::{GitlabApi, Project};

pub type ProjectMap = BTreeMap<String, Project>;

/// Fetches the projects of each group in `group_ids`, at most `limit` at a time.
pub async fn discover_projects<A, I>(api: &A, group_ids: I, limit: usize) -> ProjectMap
where
    A: GitlabApi + ?Sized,
    I: IntoIterator<Item = String>,
{
    let fetched: Vec<(String, Vec<Project>)> = stream::iter(group_ids)
        .map(|group_id| async move {
            match api.group_projects(&group_id).await {
                Ok(projects) => {
                    debug!(group_id = %group_id, projects = projects.len(), "[DISCOVER] Fetched group projects");
                    (group_id, projects)
                }
                Err(e) => {
                    warn!(group_id = %group_id, error = %e, "[DISCOVER] Project listing failed, group contributes nothing");
                    (group_id, Vec::new())
                }
            }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    let mut projects = ProjectMap::new();
    for (group_id, listed) in fetched {
        for project in listed {
            if admit(&project) {
                info!(group_id = %group_id, project_id = %project.id, name = %project.name, "[DISCOVER] Project queued");
                projects.insert(project.id.clone(), project);
            }
        }
    }

    info!(projects = projects.len(), "[DISCOVER] Project discovery finished");
    projects
}

/// Single-project mode: the map holds at most the one requested project.
pub async fn fetch_one_project<A>(api: &A, project_id: &str) -> ProjectMap
where
    A: GitlabApi + ?Sized,
{
    let mut projects = ProjectMap::new();
    match api.project(project_id).await {
        Ok(project) => {
            if admit(&project) {
                info!(project_id = %project.id, name = %project.name, "[DISCOVER] Project queued");
                projects.insert(project.id.clone(), project);
            }
        }
        Err(e) => {
            warn!(project_id = %project_id, error = %e, "[DISCOVER] Project lookup failed");
        }
    }
    projects
}

fn admit(project: &Project) -> bool {
    if project.is_processable() {
        return true;
    }
    info!(
        project_id = %project.id,
        name = %project.name,
        archived = project.archived,
        empty_repo = project.empty_repo,
        "[DISCOVER] Project excluded"
    );
    false
}
