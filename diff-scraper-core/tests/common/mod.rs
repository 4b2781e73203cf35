// In-memory GitLab used by the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use diff_scraper_core::contract::{
    ApiError, Branch, CommitQuery, CommitRecord, DiffEntry, GitlabApi, GroupRef, Project,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeGitlab {
    pub subgroups: HashMap<String, Vec<GroupRef>>,
    pub group_projects: HashMap<String, Vec<Project>>,
    pub projects: HashMap<String, Project>,
    pub branches: HashMap<String, Vec<Branch>>,
    /// Keyed by (project id, branch name).
    pub commits: HashMap<(String, String), Vec<CommitRecord>>,
    /// Keyed by commit id.
    pub diffs: HashMap<String, Vec<DiffEntry>>,
    /// Project ids whose branch listing panics.
    pub panicking: HashSet<String>,
    pub branch_calls: Mutex<Vec<String>>,
    pub diff_calls: Mutex<Vec<String>>,
}

fn unavailable(url: String) -> ApiError {
    ApiError::Exhausted {
        url,
        attempts: 3,
        last: "unexpected status 404 Not Found".into(),
    }
}

impl FakeGitlab {
    pub fn with_subgroups(mut self, group: &str, children: &[&str]) -> Self {
        self.subgroups
            .insert(group.into(), children.iter().map(|id| group_ref(id)).collect());
        self
    }

    pub fn with_projects(mut self, group: &str, projects: Vec<Project>) -> Self {
        for project in &projects {
            self.projects.insert(project.id.clone(), project.clone());
        }
        self.group_projects.insert(group.into(), projects);
        self
    }

    pub fn with_branch_commits(
        mut self,
        project_id: &str,
        branch: &str,
        commits: Vec<CommitRecord>,
    ) -> Self {
        self.branches
            .entry(project_id.into())
            .or_default()
            .push(Branch {
                name: branch.into(),
            });
        for commit in &commits {
            self.diffs.entry(commit.id.clone()).or_insert_with(|| {
                vec![DiffEntry {
                    old_path: format!("{}.txt", commit.id),
                    new_path: format!("{}.txt", commit.id),
                    diff: format!("@@ -0,0 +1 @@\n+{}\n", commit.title),
                }]
            });
        }
        self.commits
            .insert((project_id.into(), branch.into()), commits);
        self
    }

    pub fn branch_calls(&self) -> Vec<String> {
        self.branch_calls.lock().unwrap().clone()
    }

    pub fn diff_calls(&self) -> Vec<String> {
        self.diff_calls.lock().unwrap().clone()
    }
}

pub fn group_ref(id: &str) -> GroupRef {
    GroupRef {
        id: id.into(),
        name: format!("group {id}"),
    }
}

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        archived: false,
        empty_repo: false,
    }
}

pub fn commit(id: &str, email: &str, date: &str) -> CommitRecord {
    CommitRecord {
        id: id.into(),
        author_name: "Doe, Jane".into(),
        author_email: email.into(),
        committed_date: date.into(),
        title: format!("work on {id}"),
    }
}

#[async_trait]
impl GitlabApi for FakeGitlab {
    async fn subgroups(&self, group_id: &str) -> Result<Vec<GroupRef>, ApiError> {
        Ok(self.subgroups.get(group_id).cloned().unwrap_or_default())
    }

    async fn group_projects(&self, group_id: &str) -> Result<Vec<Project>, ApiError> {
        Ok(self.group_projects.get(group_id).cloned().unwrap_or_default())
    }

    async fn project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| unavailable(format!("projects/{project_id}")))
    }

    async fn branches(&self, project_id: &str) -> Result<Vec<Branch>, ApiError> {
        self.branch_calls.lock().unwrap().push(project_id.into());
        if self.panicking.contains(project_id) {
            panic!("branch listing exploded for {project_id}");
        }
        Ok(self.branches.get(project_id).cloned().unwrap_or_default())
    }

    async fn commits(
        &self,
        project_id: &str,
        query: &CommitQuery,
    ) -> Result<Vec<CommitRecord>, ApiError> {
        self.commits
            .get(&(project_id.to_string(), query.ref_name.clone()))
            .cloned()
            .ok_or_else(|| unavailable(format!("projects/{project_id}/repository/commits")))
    }

    async fn commit_diff(
        &self,
        project_id: &str,
        commit_id: &str,
    ) -> Result<Vec<DiffEntry>, ApiError> {
        self.diff_calls.lock().unwrap().push(commit_id.into());
        self.diffs.get(commit_id).cloned().ok_or_else(|| {
            unavailable(format!(
                "projects/{project_id}/repository/commits/{commit_id}/diff"
            ))
        })
    }
}
