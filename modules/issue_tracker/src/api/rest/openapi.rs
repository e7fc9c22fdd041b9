use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

/// OpenAPI document for the issue routes.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_issues,
        handlers::create_issue,
        handlers::update_issue,
        handlers::delete_issue,
    ),
    components(schemas(
        dto::IssueDto,
        dto::CreateIssueReq,
        dto::UpdateIssueReq,
        dto::DeleteIssueReq,
        dto::ErrorBody,
        dto::ResultBody,
        dto::CreateIssueResponse,
        dto::MutationResponse,
    )),
    tags((name = "issues", description = "Per-project issue tracking"))
)]
pub struct IssueTrackerDoc;
