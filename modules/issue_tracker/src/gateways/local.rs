use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::IssueTrackerApi,
    error::IssueTrackerError,
    model::{Issue, IssueFilter, IssuePatch, NewIssue},
};
use crate::domain::service::Service;

/// Local implementation of the IssueTrackerApi trait that delegates to the domain service
pub struct IssueTrackerLocalClient {
    service: Arc<Service>,
}

impl IssueTrackerLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl IssueTrackerApi for IssueTrackerLocalClient {
    async fn list_issues(&self, project: &str, filter: IssueFilter) -> Vec<Issue> {
        self.service.list_issues(project, &filter)
    }

    async fn create_issue(
        &self,
        project: &str,
        new_issue: NewIssue,
    ) -> Result<Issue, IssueTrackerError> {
        self.service
            .create_issue(project, new_issue)
            .map_err(IssueTrackerError::from)
    }

    async fn update_issue(
        &self,
        project: &str,
        id: Option<String>,
        patch: IssuePatch,
    ) -> Result<String, IssueTrackerError> {
        self.service
            .update_issue(project, id, patch)
            .map_err(IssueTrackerError::from)
    }

    async fn delete_issue(
        &self,
        project: &str,
        id: Option<String>,
    ) -> Result<String, IssueTrackerError> {
        self.service
            .delete_issue(project, id)
            .map_err(IssueTrackerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::InMemoryIssuesRepository;

    fn client() -> IssueTrackerLocalClient {
        let repo = Arc::new(InMemoryIssuesRepository::new());
        IssueTrackerLocalClient::new(Arc::new(Service::new(repo)))
    }

    #[tokio::test]
    async fn errors_cross_the_boundary_as_contract_errors() {
        let client = client();

        let err = client
            .create_issue("p", NewIssue::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IssueTrackerError::Validation { .. }));

        let err = client
            .update_issue("p", None, IssuePatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, IssueTrackerError::MissingId);

        let err = client
            .delete_issue("p", Some("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err, IssueTrackerError::not_found("nope"));
    }

    #[tokio::test]
    async fn create_then_list_through_client() {
        let client = client();
        let created = client
            .create_issue(
                "p",
                NewIssue {
                    issue_title: Some("t".into()),
                    issue_text: Some("x".into()),
                    created_by: Some("me".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let listed = client
            .list_issues("p", IssueFilter::new().with("_id", created.id.clone()))
            .await;
        assert_eq!(listed, vec![created]);
    }
}
