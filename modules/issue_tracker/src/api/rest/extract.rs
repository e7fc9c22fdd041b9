//! Lenient request-body extraction.
//!
//! Bodies arrive as JSON objects or urlencoded forms. Anything else, including
//! an oversized or unreadable body, yields an empty field set so that the
//! handlers answer with the usual `{error: ...}` bodies instead of a 4xx.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;
use tracing::debug;

use crate::contract::model::{FieldValue, IssuePatch, NewIssue};
use crate::domain::fields;

/// Field name to value map taken from a request body. Later keys win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    fields: HashMap<String, FieldValue>,
    // `_id` as it appeared in a JSON body, echoed back verbatim.
    raw_id: Option<Value>,
}

/// Issue addressed by a request: the lookup key and the value to echo.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetId {
    pub key: String,
    pub echo: Value,
}

impl FieldBag {
    pub fn from_json(body: &[u8]) -> Option<Self> {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return None;
        };
        let raw_id = map.get("_id").cloned();
        let fields = map
            .into_iter()
            .filter_map(|(key, value)| json_field(value).map(|v| (key, v)))
            .collect();
        Some(Self { fields, raw_id })
    }

    pub fn from_form(body: &[u8]) -> Option<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
        Some(pairs.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn take(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// `_id` as sent; a falsy value counts as absent.
    pub fn take_id(&mut self) -> Option<TargetId> {
        let raw = self.raw_id.take();
        let key = self
            .take("_id")
            .filter(|v| fields::is_truthy(Some(v)))?
            .render();
        let echo = raw.unwrap_or_else(|| Value::String(key.clone()));
        Some(TargetId { key, echo })
    }

    pub fn into_new_issue(mut self) -> NewIssue {
        NewIssue {
            issue_title: self.take("issue_title"),
            issue_text: self.take("issue_text"),
            created_by: self.take("created_by"),
            assigned_to: self.take("assigned_to"),
            status_text: self.take("status_text"),
        }
    }

    /// Splits the bag into the target id and the updatable fields.
    pub fn into_update(mut self) -> (Option<TargetId>, IssuePatch) {
        let id = self.take_id();
        let patch = IssuePatch {
            issue_title: self.take("issue_title"),
            issue_text: self.take("issue_text"),
            created_by: self.take("created_by"),
            assigned_to: self.take("assigned_to"),
            status_text: self.take("status_text"),
            open: self.take("open"),
        };
        (id, patch)
    }
}

impl FromIterator<(String, String)> for FieldBag {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k, FieldValue::Text(v)))
                .collect(),
            raw_id: None,
        }
    }
}

/// JSON `null` is absence; scalars other than strings and booleans keep their JSON text.
fn json_field(value: Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(b)),
        Value::String(s) => Some(FieldValue::Text(s)),
        other => Some(FieldValue::Text(other.to_string())),
    }
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

impl<S> FromRequest<S> for FieldBag
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = match Bytes::from_request(req, state).await {
            Ok(body) => body,
            Err(rejection) => {
                debug!(%rejection, "Unreadable request body, using empty field set");
                return Ok(Self::default());
            }
        };
        if body.is_empty() {
            return Ok(Self::default());
        }

        if let Some(bag) = Self::from_json(&body) {
            return Ok(bag);
        }
        if is_form(content_type.as_deref()) {
            if let Some(bag) = Self::from_form(&body) {
                return Ok(bag);
            }
        }

        debug!(
            content_type = content_type.as_deref().unwrap_or("-"),
            "Malformed request body, using empty field set"
        );
        Ok(Self::default())
    }
}
