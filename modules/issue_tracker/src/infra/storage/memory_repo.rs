use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::contract::model::Issue;
use crate::domain::repo::IssuesRepository;

type Partition = Arc<RwLock<Vec<Issue>>>;

/// Process-local storage: one lock-protected sequence per project.
///
/// The map only hands out partition handles; all reads and writes of a
/// sequence happen under that partition's own `RwLock`, so projects never
/// contend with each other.
#[derive(Default)]
pub struct InMemoryIssuesRepository {
    projects: DashMap<String, Partition>,
}

impl InMemoryIssuesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, project: &str) -> Option<Partition> {
        self.projects.get(project).map(|p| Arc::clone(p.value()))
    }

    fn partition_or_create(&self, project: &str) -> Partition {
        if let Some(existing) = self.partition(project) {
            return existing;
        }
        Arc::clone(self.projects.entry(project.to_owned()).or_default().value())
    }
}

impl IssuesRepository for InMemoryIssuesRepository {
    fn append(&self, project: &str, issue: Issue) {
        let partition = self.partition_or_create(project);
        partition.write().push(issue);
    }

    fn select(&self, project: &str, predicate: &dyn Fn(&Issue) -> bool) -> Vec<Issue> {
        let Some(partition) = self.partition(project) else {
            return Vec::new();
        };
        let issues = partition.read();
        issues.iter().filter(|i| predicate(i)).cloned().collect()
    }

    fn modify(&self, project: &str, id: &str, change: &mut dyn FnMut(&mut Issue)) -> bool {
        let Some(partition) = self.partition(project) else {
            return false;
        };
        let mut issues = partition.write();
        match issues.iter_mut().find(|i| i.id == id) {
            Some(issue) => {
                change(issue);
                true
            }
            None => false,
        }
    }

    fn remove(&self, project: &str, id: &str) -> bool {
        let Some(partition) = self.partition(project) else {
            return false;
        };
        let mut issues = partition.write();
        match issues.iter().position(|i| i.id == id) {
            Some(idx) => {
                issues.remove(idx);
                true
            }
            None => false,
        }
    }

    fn count(&self, project: &str) -> usize {
        self.partition(project).map_or(0, |p| p.read().len())
    }
}
