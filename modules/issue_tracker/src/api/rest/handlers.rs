use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    response::Json,
    Extension,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::rest::dto::{
    CreateIssueReq, CreateIssueResponse, DeleteIssueReq, IssueDto, MutationResponse,
    UpdateIssueReq,
};
use crate::api::rest::error::{create_error_body, error_body, result_body, Operation};
use crate::api::rest::extract::{FieldBag, TargetId};
use crate::contract::model::IssueFilter;
use crate::domain::service::Service;

/// List issues of a project; every query parameter is an exact-match filter
#[utoipa::path(
    get,
    path = "/api/issues/{project}",
    operation_id = "issue_tracker.list_issues",
    tag = "issues",
    params(("project" = String, Path, description = "Project name")),
    responses((status = 200, description = "Matching issues", body = [IssueDto]))
)]
pub async fn list_issues(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Json<Vec<IssueDto>> {
    let filter: IssueFilter = match query {
        Ok(Query(pairs)) => pairs.into_iter().collect(),
        Err(rejection) => {
            debug!(%rejection, "Ignoring unparseable query string");
            IssueFilter::new()
        }
    };
    info!(project = %project, criteria = filter.criteria.len(), "Listing issues");

    let issues = svc.list_issues(&project, &filter);
    Json(issues.into_iter().map(IssueDto::from).collect())
}

/// Create an issue in a project
#[utoipa::path(
    post,
    path = "/api/issues/{project}",
    operation_id = "issue_tracker.create_issue",
    tag = "issues",
    params(("project" = String, Path, description = "Project name")),
    request_body(content = CreateIssueReq, description = "Issue fields"),
    responses((status = 200, description = "Created issue or error body", body = CreateIssueResponse))
)]
pub async fn create_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    bag: FieldBag,
) -> Json<CreateIssueResponse> {
    info!(project = %project, "Creating issue");

    match svc.create_issue(&project, bag.into_new_issue()) {
        Ok(issue) => Json(CreateIssueResponse::Created(IssueDto::from(issue))),
        Err(e) => {
            debug!("Create rejected: {}", e);
            Json(CreateIssueResponse::Rejected(create_error_body(e)))
        }
    }
}

/// Update fields of an existing issue
#[utoipa::path(
    put,
    path = "/api/issues/{project}",
    operation_id = "issue_tracker.update_issue",
    tag = "issues",
    params(("project" = String, Path, description = "Project name")),
    request_body(content = UpdateIssueReq, description = "Issue id and fields to change"),
    responses((status = 200, description = "Result or error body", body = MutationResponse))
)]
pub async fn update_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    bag: FieldBag,
) -> Json<MutationResponse> {
    let (target, patch) = bag.into_update();
    let (id, echo) = split_target(target);
    info!(project = %project, id = id.as_deref().unwrap_or("-"), "Updating issue");

    match svc.update_issue(&project, id, patch) {
        Ok(id) => Json(MutationResponse::Done(result_body(Operation::Update, id, echo))),
        Err(e) => {
            debug!("Update rejected: {}", e);
            Json(MutationResponse::Rejected(error_body(Operation::Update, e, echo)))
        }
    }
}

/// Delete an issue
#[utoipa::path(
    delete,
    path = "/api/issues/{project}",
    operation_id = "issue_tracker.delete_issue",
    tag = "issues",
    params(("project" = String, Path, description = "Project name")),
    request_body(content = DeleteIssueReq, description = "Issue id"),
    responses((status = 200, description = "Result or error body", body = MutationResponse))
)]
pub async fn delete_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    mut bag: FieldBag,
) -> Json<MutationResponse> {
    let (id, echo) = split_target(bag.take_id());
    info!(project = %project, id = id.as_deref().unwrap_or("-"), "Deleting issue");

    match svc.delete_issue(&project, id) {
        Ok(id) => Json(MutationResponse::Done(result_body(Operation::Delete, id, echo))),
        Err(e) => {
            debug!("Delete rejected: {}", e);
            Json(MutationResponse::Rejected(error_body(Operation::Delete, e, echo)))
        }
    }
}

fn split_target(target: Option<TargetId>) -> (Option<String>, Option<Value>) {
    match target {
        Some(TargetId { key, echo }) => (Some(key), Some(echo)),
        None => (None, None),
    }
}
