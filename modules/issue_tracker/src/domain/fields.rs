//! Field presence, coercion and matching rules.
//!
//! Everything here is a pure function over contract types so the rules can be
//! exercised without a store or an HTTP stack.

use crate::contract::model::{iso_timestamp, FieldValue, Issue, IssueFilter};

/// Fields of an issue addressable by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueField {
    Id,
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
    CreatedOn,
    UpdatedOn,
    Open,
}

impl IssueField {
    pub fn from_wire(key: &str) -> Option<Self> {
        Some(match key {
            "_id" => Self::Id,
            "issue_title" => Self::IssueTitle,
            "issue_text" => Self::IssueText,
            "created_by" => Self::CreatedBy,
            "assigned_to" => Self::AssignedTo,
            "status_text" => Self::StatusText,
            "created_on" => Self::CreatedOn,
            "updated_on" => Self::UpdatedOn,
            "open" => Self::Open,
            _ => return None,
        })
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
            Self::Open => "open",
        }
    }
}

/// Stored value of one field, as seen by filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Text(String),
    Bool(bool),
}

pub fn stored_value(issue: &Issue, field: IssueField) -> StoredValue {
    match field {
        IssueField::Id => StoredValue::Text(issue.id.clone()),
        IssueField::IssueTitle => StoredValue::Text(issue.issue_title.clone()),
        IssueField::IssueText => StoredValue::Text(issue.issue_text.clone()),
        IssueField::CreatedBy => StoredValue::Text(issue.created_by.clone()),
        IssueField::AssignedTo => StoredValue::Text(issue.assigned_to.clone()),
        IssueField::StatusText => StoredValue::Text(issue.status_text.clone()),
        IssueField::CreatedOn => StoredValue::Text(iso_timestamp(&issue.created_on)),
        IssueField::UpdatedOn => StoredValue::Text(iso_timestamp(&issue.updated_on)),
        IssueField::Open => StoredValue::Bool(issue.open),
    }
}

/// Presence test used at creation: empty text and `false` do not count.
pub fn is_truthy(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Text(s)) => !s.is_empty(),
        Some(FieldValue::Bool(b)) => *b,
        None => false,
    }
}

/// Value of an optional text field at creation; falsy input becomes `""`.
pub fn text_or_empty(value: Option<FieldValue>) -> String {
    match value {
        Some(v) if is_truthy(Some(&v)) => v.render(),
        _ => String::new(),
    }
}

/// Qualification test used by updates: text must be non-blank, booleans always count.
pub fn counts_as_present(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Text(s)) => !s.trim().is_empty(),
        Some(FieldValue::Bool(_)) => true,
        None => false,
    }
}

/// New `open` state for an update. Unrecognized values keep `current`.
pub fn coerce_open(value: &FieldValue, current: bool) -> bool {
    match value {
        FieldValue::Bool(b) => *b,
        FieldValue::Text(s) if s == "true" => true,
        FieldValue::Text(s) if s == "false" => false,
        FieldValue::Text(_) => current,
    }
}

/// Filter target for boolean fields: only `"true"` / `true` mean true.
fn coerce_filter_bool(value: &FieldValue) -> bool {
    matches!(value, FieldValue::Bool(true)) || matches!(value, FieldValue::Text(s) if s == "true")
}

/// Single filter criterion against one issue.
pub fn filter_matches(issue: &Issue, key: &str, query: &FieldValue) -> bool {
    let Some(field) = IssueField::from_wire(key) else {
        return false;
    };
    match stored_value(issue, field) {
        StoredValue::Bool(stored) => stored == coerce_filter_bool(query),
        StoredValue::Text(stored) => stored == query.render(),
    }
}

pub fn matches_all(issue: &Issue, filter: &IssueFilter) -> bool {
    filter
        .criteria
        .iter()
        .all(|(key, value)| filter_matches(issue, key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Issue {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        Issue {
            id: "abc".into(),
            issue_title: "Title".into(),
            issue_text: "text".into(),
            created_by: "Functional Test".into(),
            assigned_to: "Chai".into(),
            status_text: "In QA".into(),
            created_on: at,
            updated_on: at,
            open: true,
        }
    }

    #[test]
    fn truthiness_for_required_fields() {
        assert!(is_truthy(Some(&FieldValue::text("x"))));
        assert!(is_truthy(Some(&FieldValue::text("  "))));
        assert!(is_truthy(Some(&FieldValue::Bool(true))));
        assert!(!is_truthy(Some(&FieldValue::text(""))));
        assert!(!is_truthy(Some(&FieldValue::Bool(false))));
        assert!(!is_truthy(None));
    }

    #[test]
    fn optional_text_defaults_to_empty() {
        assert_eq!(text_or_empty(Some(FieldValue::text("Chai"))), "Chai");
        assert_eq!(text_or_empty(Some(FieldValue::text(""))), "");
        assert_eq!(text_or_empty(Some(FieldValue::Bool(false))), "");
        assert_eq!(text_or_empty(None), "");
    }

    #[test]
    fn presence_for_update_fields() {
        assert!(counts_as_present(Some(&FieldValue::text("a"))));
        assert!(!counts_as_present(Some(&FieldValue::text(" \t\n"))));
        assert!(!counts_as_present(Some(&FieldValue::text(""))));
        assert!(counts_as_present(Some(&FieldValue::Bool(false))));
        assert!(!counts_as_present(None));
    }

    #[test]
    fn open_coercion_keeps_current_on_garbage() {
        assert!(!coerce_open(&FieldValue::text("false"), true));
        assert!(!coerce_open(&FieldValue::Bool(false), true));
        assert!(coerce_open(&FieldValue::text("true"), false));
        assert!(coerce_open(&FieldValue::Bool(true), false));
        assert!(coerce_open(&FieldValue::text("nope"), true));
        assert!(!coerce_open(&FieldValue::text("FALSE"), false));
        assert!(coerce_open(&FieldValue::text("FALSE"), true));
    }

    #[test]
    fn unknown_filter_key_excludes_issue() {
        let issue = sample();
        assert!(!filter_matches(&issue, "priority", &FieldValue::text("high")));
        assert!(!filter_matches(&issue, "issueTitle", &FieldValue::text("Title")));
    }

    #[test]
    fn boolean_filter_coerces_query_value() {
        let mut issue = sample();
        assert!(filter_matches(&issue, "open", &FieldValue::text("true")));
        assert!(filter_matches(&issue, "open", &FieldValue::Bool(true)));
        assert!(!filter_matches(&issue, "open", &FieldValue::text("1")));

        issue.open = false;
        assert!(filter_matches(&issue, "open", &FieldValue::text("false")));
        // anything other than "true" targets false
        assert!(filter_matches(&issue, "open", &FieldValue::text("yes")));
    }

    #[test]
    fn text_filters_compare_exactly() {
        let issue = sample();
        assert!(filter_matches(&issue, "assigned_to", &FieldValue::text("Chai")));
        assert!(!filter_matches(&issue, "assigned_to", &FieldValue::text("chai")));
        assert!(filter_matches(&issue, "_id", &FieldValue::text("abc")));
        assert!(filter_matches(
            &issue,
            "created_on",
            &FieldValue::text("2024-05-01T10:00:00.000Z")
        ));
    }

    #[test]
    fn all_criteria_must_match() {
        let issue = sample();
        let both = IssueFilter::new()
            .with("open", "true")
            .with("issue_title", "Title");
        assert!(matches_all(&issue, &both));

        let conflicting = both.clone().with("created_by", "Someone Else");
        assert!(!matches_all(&issue, &conflicting));

        assert!(matches_all(&issue, &IssueFilter::new()));
    }

    #[test]
    fn wire_names_roundtrip() {
        for key in [
            "_id",
            "issue_title",
            "issue_text",
            "created_by",
            "assigned_to",
            "status_text",
            "created_on",
            "updated_on",
            "open",
        ] {
            let field = IssueField::from_wire(key).unwrap();
            assert_eq!(field.wire_name(), key);
        }
    }
}
