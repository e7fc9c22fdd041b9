use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::contract::model::{iso_timestamp, Issue};

/// REST DTO for issue representation; field order and names are the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Issue")]
pub struct IssueDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    #[schema(format = "date-time")]
    pub created_on: String,
    #[schema(format = "date-time")]
    pub updated_on: String,
    pub open: bool,
}

/// REST DTO for creating an issue (documents the accepted body)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateIssueReq {
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

/// REST DTO for updating an issue (partial)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateIssueReq {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
}

/// REST DTO for deleting an issue
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DeleteIssueReq {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// `{error, _id?}` body. Reported with HTTP 200 like every other outcome.
/// `_id` is echoed exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(title = "ErrorBody")]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<Value>,
}

/// `{result, _id}` body for successful updates and deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(title = "ResultBody")]
pub struct ResultBody {
    pub result: String,
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CreateIssueResponse {
    Created(IssueDto),
    Rejected(ErrorBody),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MutationResponse {
    Done(ResultBody),
    Rejected(ErrorBody),
}

// Conversion implementations between REST DTOs and contract models

impl From<Issue> for IssueDto {
    fn from(issue: Issue) -> Self {
        Self {
            created_on: iso_timestamp(&issue.created_on),
            updated_on: iso_timestamp(&issue.updated_on),
            id: issue.id,
            issue_title: issue.issue_title,
            issue_text: issue.issue_text,
            created_by: issue.created_by,
            assigned_to: issue.assigned_to,
            status_text: issue.status_text,
            open: issue.open,
        }
    }
}
