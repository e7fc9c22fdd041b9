//! Tests to verify that the service layer emits expected tracing events

use std::sync::Arc;
use tracing_test::traced_test;

use issue_tracker::contract::model::{IssueFilter, IssuePatch, NewIssue};
use issue_tracker::domain::service::Service;
use issue_tracker::infra::storage::InMemoryIssuesRepository;

fn service() -> Service {
    Service::new(Arc::new(InMemoryIssuesRepository::new()))
}

fn new_issue() -> NewIssue {
    NewIssue {
        issue_title: Some("Title".into()),
        issue_text: Some("text".into()),
        created_by: Some("Tester".into()),
        ..Default::default()
    }
}

#[traced_test]
#[test]
fn create_issue_logs_new_id() {
    let service = service();

    let issue = service.create_issue("traced", new_issue()).unwrap();

    assert!(logs_contain("Creating new issue"));
    assert!(logs_contain(&format!(
        "Successfully created issue with id={}",
        issue.id
    )));
}

#[traced_test]
#[test]
fn rejected_create_is_logged_at_debug() {
    let service = service();

    let result = service.create_issue("traced", NewIssue::default());

    assert!(result.is_err());
    assert!(logs_contain("Rejecting issue without required fields"));
}

#[traced_test]
#[test]
fn update_and_delete_run_inside_spans() {
    let service = service();
    let issue = service.create_issue("traced", new_issue()).unwrap();

    service
        .update_issue(
            "traced",
            Some(issue.id.clone()),
            IssuePatch {
                status_text: Some("In QA".into()),
                ..Default::default()
            },
        )
        .unwrap();
    service.delete_issue("traced", Some(issue.id)).unwrap();

    assert!(logs_contain("issue_tracker.service.update_issue"));
    assert!(logs_contain("Successfully updated issue"));
    assert!(logs_contain("issue_tracker.service.delete_issue"));
    assert!(logs_contain("Successfully deleted issue"));
}

#[traced_test]
#[test]
fn list_reports_match_count() {
    let service = service();
    service.create_issue("traced", new_issue()).unwrap();

    let issues = service.list_issues("traced", &IssueFilter::new().with("open", "true"));

    assert_eq!(issues.len(), 1);
    assert!(logs_contain("matched=1"));
}
