use crate::contract::model::Issue;

/// Port for the domain layer: the project-partitioned sequences the service works on.
///
/// Every call runs to completion without suspending; implementations guarantee
/// that readers never observe a half-applied `modify`.
pub trait IssuesRepository: Send + Sync {
    /// Append to the end of a project's sequence, creating the project if needed.
    fn append(&self, project: &str, issue: Issue);

    /// Clone out the issues of a project accepted by `predicate`, in insertion order.
    fn select(&self, project: &str, predicate: &dyn Fn(&Issue) -> bool) -> Vec<Issue>;

    /// Apply `change` to the issue with `id` in `project`. Returns false if absent.
    fn modify(&self, project: &str, id: &str, change: &mut dyn FnMut(&mut Issue)) -> bool;

    /// Remove the issue with `id` from `project`. Returns false if absent.
    fn remove(&self, project: &str, id: &str) -> bool;

    /// Number of issues currently stored for `project`.
    fn count(&self, project: &str) -> usize;
}
