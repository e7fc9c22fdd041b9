use async_trait::async_trait;

use crate::contract::{
    error::IssueTrackerError,
    model::{Issue, IssueFilter, IssuePatch, NewIssue},
};

/// Public API trait for the issue_tracker module that other modules can use
#[async_trait]
pub trait IssueTrackerApi: Send + Sync {
    /// List issues of a project matching every filter criterion
    async fn list_issues(&self, project: &str, filter: IssueFilter) -> Vec<Issue>;

    /// Create a new issue in a project (the project is created on first use)
    async fn create_issue(&self, project: &str, new_issue: NewIssue)
        -> Result<Issue, IssueTrackerError>;

    /// Update an issue with partial data, returning the id of the updated issue
    async fn update_issue(
        &self,
        project: &str,
        id: Option<String>,
        patch: IssuePatch,
    ) -> Result<String, IssueTrackerError>;

    /// Delete an issue, returning the id of the removed issue
    async fn delete_issue(
        &self,
        project: &str,
        id: Option<String>,
    ) -> Result<String, IssueTrackerError>;
}
