//! # contract: data model and the remote API seam
//!
//! Plain data types deserialized from the GitLab REST payloads, the error type
//! shared by every remote call, and the [`GitlabApi`] trait the pipeline is
//! written against.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so tests (in this crate and in
//!   dependants via the `test-export-mocks` feature) can script remote answers.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::config::DateWindow;

/// Error returned by any remote call once the transport has given up.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("unexpected payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// A group or subgroup node, identified by id only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct GroupRef {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub empty_repo: bool,
}

impl Project {
    /// Archived projects and projects without a repository are never processed.
    pub fn is_processable(&self) -> bool {
        !self.archived && !self.empty_repo
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    /// ISO-8601 with fractional seconds and an explicit UTC offset.
    pub committed_date: String,
    pub title: String,
}

/// One changed file of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiffEntry {
    pub old_path: String,
    pub new_path: String,
    pub diff: String,
}

/// Server-side constraints for listing the commits of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    pub ref_name: String,
    pub author: String,
    pub since: String,
    pub until: String,
}

impl CommitQuery {
    pub fn for_branch(branch: &str, author_email: &str, window: &DateWindow) -> Self {
        Self {
            ref_name: branch.to_string(),
            author: author_email.to_string(),
            since: window.since_param(),
            until: window.until_param(),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ref_name", self.ref_name.clone()),
            ("author", self.author.clone()),
            ("since", self.since.clone()),
            ("until", self.until.clone()),
        ]
    }
}

/// Remote operations used by the pipeline, one per REST endpoint.
///
/// Implemented by [`crate::gitlab::GitlabClient`] and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait GitlabApi: Send + Sync {
    /// `GET /groups/{id}/subgroups/`
    async fn subgroups(&self, group_id: &str) -> Result<Vec<GroupRef>, ApiError>;

    /// `GET /groups/{id}/projects`
    async fn group_projects(&self, group_id: &str) -> Result<Vec<Project>, ApiError>;

    /// `GET /projects/{id}`
    async fn project(&self, project_id: &str) -> Result<Project, ApiError>;

    /// `GET /projects/{id}/repository/branches`
    async fn branches(&self, project_id: &str) -> Result<Vec<Branch>, ApiError>;

    /// `GET /projects/{id}/repository/commits`
    async fn commits(
        &self,
        project_id: &str,
        query: &CommitQuery,
    ) -> Result<Vec<CommitRecord>, ApiError>;

    /// `GET /projects/{id}/repository/commits/{hash}/diff`
    async fn commit_diff(
        &self,
        project_id: &str,
        commit_id: &str,
    ) -> Result<Vec<DiffEntry>, ApiError>;
}

// GitLab sends numeric ids; path-style ids arrive as strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
