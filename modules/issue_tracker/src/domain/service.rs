use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{FieldValue, Issue, IssueFilter, IssuePatch, NewIssue};
use crate::domain::error::DomainError;
use crate::domain::fields::{self, IssueField};
use crate::domain::repo::IssuesRepository;

/// Domain service with the store rules for issues.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn IssuesRepository>,
}

/// Wall clock truncated to the wire precision (milliseconds).
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Next `updated_on` value: strictly after `previous` even within one millisecond.
fn next_update_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::milliseconds(1)
    }
}

impl Service {
    /// Create a service over a repository.
    pub fn new(repo: Arc<dyn IssuesRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "issue_tracker.service.create_issue", skip(self, new_issue))]
    pub fn create_issue(&self, project: &str, new_issue: NewIssue) -> Result<Issue, DomainError> {
        info!("Creating new issue");

        let required = [
            &new_issue.issue_title,
            &new_issue.issue_text,
            &new_issue.created_by,
        ];
        if !required.iter().all(|v| fields::is_truthy(v.as_ref())) {
            debug!("Rejecting issue without required fields");
            return Err(DomainError::required_fields_missing());
        }

        let created = now();
        let issue = Issue {
            id: Uuid::new_v4().to_string(),
            issue_title: fields::text_or_empty(new_issue.issue_title),
            issue_text: fields::text_or_empty(new_issue.issue_text),
            created_by: fields::text_or_empty(new_issue.created_by),
            assigned_to: fields::text_or_empty(new_issue.assigned_to),
            status_text: fields::text_or_empty(new_issue.status_text),
            created_on: created,
            updated_on: created,
            open: true,
        };

        self.repo.append(project, issue.clone());

        info!("Successfully created issue with id={}", issue.id);
        Ok(issue)
    }

    #[instrument(name = "issue_tracker.service.list_issues", skip(self, filter))]
    pub fn list_issues(&self, project: &str, filter: &IssueFilter) -> Vec<Issue> {
        let issues = self
            .repo
            .select(project, &|issue: &Issue| fields::matches_all(issue, filter));
        debug!(
            criteria = filter.criteria.len(),
            matched = issues.len(),
            "Listed issues"
        );
        issues
    }

    #[instrument(name = "issue_tracker.service.update_issue", skip(self, patch))]
    pub fn update_issue(
        &self,
        project: &str,
        id: Option<String>,
        patch: IssuePatch,
    ) -> Result<String, DomainError> {
        info!("Updating issue");

        let id = id.ok_or_else(DomainError::missing_id)?;

        let candidates: [(IssueField, Option<FieldValue>); 6] = [
            (IssueField::IssueTitle, patch.issue_title),
            (IssueField::IssueText, patch.issue_text),
            (IssueField::CreatedBy, patch.created_by),
            (IssueField::AssignedTo, patch.assigned_to),
            (IssueField::StatusText, patch.status_text),
            (IssueField::Open, patch.open),
        ];
        let qualifying: Vec<(IssueField, FieldValue)> = candidates
            .into_iter()
            .filter_map(|(field, value)| {
                value
                    .filter(|v| fields::counts_as_present(Some(v)))
                    .map(|v| (field, v))
            })
            .collect();

        if qualifying.is_empty() {
            return Err(DomainError::no_update_fields(id));
        }

        let found = self.repo.modify(project, &id, &mut |issue: &mut Issue| {
            for (field, value) in &qualifying {
                apply_field(issue, *field, value);
            }
            issue.updated_on = next_update_stamp(issue.updated_on);
        });

        if !found {
            return Err(DomainError::issue_not_found(id));
        }

        info!(fields = qualifying.len(), "Successfully updated issue");
        Ok(id)
    }

    #[instrument(name = "issue_tracker.service.delete_issue", skip(self))]
    pub fn delete_issue(&self, project: &str, id: Option<String>) -> Result<String, DomainError> {
        info!("Deleting issue");

        let id = id.ok_or_else(DomainError::missing_id)?;
        if !self.repo.remove(project, &id) {
            return Err(DomainError::issue_not_found(id));
        }

        info!("Successfully deleted issue");
        Ok(id)
    }

    /// Number of issues stored for `project`.
    pub fn issue_count(&self, project: &str) -> usize {
        self.repo.count(project)
    }
}

fn apply_field(issue: &mut Issue, field: IssueField, value: &FieldValue) {
    match field {
        IssueField::IssueTitle => issue.issue_title = value.render(),
        IssueField::IssueText => issue.issue_text = value.render(),
        IssueField::CreatedBy => issue.created_by = value.render(),
        IssueField::AssignedTo => issue.assigned_to = value.render(),
        IssueField::StatusText => issue.status_text = value.render(),
        IssueField::Open => issue.open = fields::coerce_open(value, issue.open),
        IssueField::Id | IssueField::CreatedOn | IssueField::UpdatedOn => {}
    }
}
