use chrono::{DateTime, SecondsFormat, Utc};

/// Pure issue model for inter-module communication (no serde/schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub open: bool,
}

/// A request-supplied field value. Absence is modelled as `Option::None` at the use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// String rendering used for equality checks and verbatim copies.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Data for creating a new issue; presence is checked by the domain service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewIssue {
    pub issue_title: Option<FieldValue>,
    pub issue_text: Option<FieldValue>,
    pub created_by: Option<FieldValue>,
    pub assigned_to: Option<FieldValue>,
    pub status_text: Option<FieldValue>,
}

/// Partial update data for an issue
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssuePatch {
    pub issue_title: Option<FieldValue>,
    pub issue_text: Option<FieldValue>,
    pub created_by: Option<FieldValue>,
    pub assigned_to: Option<FieldValue>,
    pub status_text: Option<FieldValue>,
    pub open: Option<FieldValue>,
}

/// Field-equality constraints for listing, keyed by wire field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueFilter {
    pub criteria: Vec<(String, FieldValue)>,
}

impl IssueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.criteria.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl FromIterator<(String, String)> for IssueFilter {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            criteria: iter
                .into_iter()
                .map(|(k, v)| (k, FieldValue::Text(v)))
                .collect(),
        }
    }
}

/// ISO 8601 rendering with millisecond precision, e.g. `2024-05-01T10:00:00.123Z`.
pub fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
