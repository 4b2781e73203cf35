//! Per-project processing: branches → commits → diffs → patch file.
//!
//! Branches are walked one after another against a single dedup set owned by
//! this call, so a commit reachable from several branches is fetched and
//! written once. When the commit listing of any branch fails, the whole
//! project yields no commits ([`CommitCollection::Aborted`]); this is the
//! "partial data, continue" policy and is reported, never raised.

use chrono::DateTime;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{DateWindow, HarvestConfig};
use crate::contract::{ApiError, Branch, CommitQuery, CommitRecord, GitlabApi, Project};
use crate::patch::{write_patch, PatchError, PatchedCommit};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Result of collecting the author's commits over every branch of a project.
#[derive(Debug)]
pub enum CommitCollection {
    /// Unique commits in first-seen order.
    Collected(Vec<CommitRecord>),
    /// A branch listing failed; the project contributes no commits at all.
    Aborted { branch: String, error: ApiError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    NoBranches,
    BranchesUnavailable,
    NoCommits,
    CommitsAborted { branch: String },
    DiffsUnavailable,
    Written { path: PathBuf, commits: usize },
}

pub async fn collect_commits<A>(
    api: &A,
    project_id: &str,
    branches: &[Branch],
    author_email: &str,
    window: &DateWindow,
) -> CommitCollection
where
    A: GitlabApi + ?Sized,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut commits = Vec::new();

    for branch in branches {
        let query = CommitQuery::for_branch(&branch.name, author_email, window);
        let listed = match api.commits(project_id, &query).await {
            Ok(listed) => listed,
            Err(error) => {
                warn!(project_id = %project_id, branch = %branch.name, error = %error, "[PROCESS] Commit listing failed, dropping all commits of project");
                return CommitCollection::Aborted {
                    branch: branch.name.clone(),
                    error,
                };
            }
        };

        for commit in listed {
            if !accepts(&commit, author_email, window) {
                continue;
            }
            if seen.insert(commit.id.clone()) {
                debug!(project_id = %project_id, branch = %branch.name, commit = %commit.id, "[PROCESS] Commit accepted");
                commits.push(commit);
            } else {
                debug!(project_id = %project_id, branch = %branch.name, commit = %commit.id, "[PROCESS] Commit already seen on another branch");
            }
        }
    }

    CommitCollection::Collected(commits)
}

fn accepts(commit: &CommitRecord, author_email: &str, window: &DateWindow) -> bool {
    if commit.author_email != author_email {
        return false;
    }
    match DateTime::parse_from_rfc3339(&commit.committed_date) {
        Ok(at) => window.contains(&at),
        Err(e) => {
            warn!(commit = %commit.id, value = %commit.committed_date, error = %e, "[PROCESS] Unparseable commit date, skipping commit");
            false
        }
    }
}

/// Processes one project end to end and writes at most one patch file.
pub async fn process_project<A>(
    api: &A,
    config: &HarvestConfig,
    project: &Project,
) -> Result<ProjectOutcome, ProcessError>
where
    A: GitlabApi + ?Sized,
{
    info!(project_id = %project.id, name = %project.name, "[PROCESS] Processing project");

    let branches = match api.branches(&project.id).await {
        Ok(branches) if branches.is_empty() => {
            info!(project_id = %project.id, "[PROCESS] Project has no branches");
            return Ok(ProjectOutcome::NoBranches);
        }
        Ok(branches) => branches,
        Err(e) => {
            warn!(project_id = %project.id, error = %e, "[PROCESS] Branch listing failed");
            return Ok(ProjectOutcome::BranchesUnavailable);
        }
    };
    debug!(project_id = %project.id, branches = branches.len(), "[PROCESS] Branches fetched");

    let commits = match collect_commits(
        api,
        &project.id,
        &branches,
        &config.author_email,
        &config.window,
    )
    .await
    {
        CommitCollection::Collected(commits) if commits.is_empty() => {
            info!(project_id = %project.id, "[PROCESS] No matching commits");
            return Ok(ProjectOutcome::NoCommits);
        }
        CommitCollection::Collected(commits) => commits,
        CommitCollection::Aborted { branch, .. } => {
            return Ok(ProjectOutcome::CommitsAborted { branch });
        }
    };

    let mut patched = Vec::with_capacity(commits.len());
    for commit in commits {
        match api.commit_diff(&project.id, &commit.id).await {
            Ok(diffs) => patched.push(PatchedCommit { commit, diffs }),
            Err(e) => {
                warn!(project_id = %project.id, commit = %commit.id, error = %e, "[PROCESS] Diff fetch failed, commit omitted from patch");
            }
        }
    }
    if patched.is_empty() {
        return Ok(ProjectOutcome::DiffsUnavailable);
    }

    let path = write_patch(&config.output_dir, &project.name, &patched)?;
    Ok(ProjectOutcome::Written {
        path,
        commits: patched.len(),
    })
}
