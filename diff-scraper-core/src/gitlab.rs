//! Networked [`GitlabApi`] over the GitLab REST v4 endpoints.
//!
//! List endpoints are fetched as a single page of `per_page=100`; the pipeline
//! treats one response as exhaustive.

use async_trait::async_trait;

use crate::contract::{
    ApiError, Branch, CommitQuery, CommitRecord, DiffEntry, GitlabApi, GroupRef, Project,
};
use crate::transport::{Transport, TransportConfig};

const PER_PAGE: &str = "100";

pub struct GitlabClient {
    transport: Transport,
}

impl GitlabClient {
    pub fn new(config: TransportConfig) -> Result<Self, ApiError> {
        tracing::info!(base_url = %config.base_url, retry = ?config.retry, "Initialized GitlabClient");
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }
}

/// Ids may be namespaced paths (`group/sub`), which GitLab expects URL-encoded.
fn encode_id(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}

fn page() -> Vec<(&'static str, String)> {
    vec![("per_page", PER_PAGE.to_string())]
}

#[async_trait]
impl GitlabApi for GitlabClient {
    async fn subgroups(&self, group_id: &str) -> Result<Vec<GroupRef>, ApiError> {
        let path = format!("groups/{}/subgroups/", encode_id(group_id));
        self.transport.get_json(&path, &page()).await
    }

    async fn group_projects(&self, group_id: &str) -> Result<Vec<Project>, ApiError> {
        let path = format!("groups/{}/projects", encode_id(group_id));
        self.transport.get_json(&path, &page()).await
    }

    async fn project(&self, project_id: &str) -> Result<Project, ApiError> {
        let path = format!("projects/{}", encode_id(project_id));
        self.transport.get_json(&path, &[]).await
    }

    async fn branches(&self, project_id: &str) -> Result<Vec<Branch>, ApiError> {
        let path = format!("projects/{}/repository/branches", encode_id(project_id));
        self.transport.get_json(&path, &page()).await
    }

    async fn commits(
        &self,
        project_id: &str,
        query: &CommitQuery,
    ) -> Result<Vec<CommitRecord>, ApiError> {
        let path = format!("projects/{}/repository/commits", encode_id(project_id));
        let mut params = query.to_params();
        params.extend(page());
        self.transport.get_json(&path, &params).await
    }

    async fn commit_diff(
        &self,
        project_id: &str,
        commit_id: &str,
    ) -> Result<Vec<DiffEntry>, ApiError> {
        let path = format!(
            "projects/{}/repository/commits/{}/diff",
            encode_id(project_id),
            commit_id
        );
        self.transport.get_json(&path, &page()).await
    }
}
