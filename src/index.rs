// Primary table plus secondary indexes over tasks

use crate::models::{Priority, Task, TaskStatus};
use eyre::{Result, eyre};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub type IdSet = HashSet<String>;

/// Owns every live task and the status, priority and tag buckets over them.
///
/// Every live task sits in exactly one status bucket, one priority bucket and
/// one tag bucket per tag. Tag buckets are removed once empty. Status and
/// priority buckets exist for every variant from construction on.
#[derive(Debug, Clone)]
pub struct IndexSet {
    tasks: HashMap<String, Task>,
    by_status: HashMap<TaskStatus, IdSet>,
    by_priority: HashMap<Priority, IdSet>,
    by_tag: HashMap<String, IdSet>,
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSet {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            by_status: TaskStatus::ALL.into_iter().map(|s| (s, IdSet::new())).collect(),
            by_priority: Priority::ALL.into_iter().map(|p| (p, IdSet::new())).collect(),
            by_tag: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.tasks.keys()
    }

    pub fn status_bucket(&self, status: TaskStatus) -> Option<&IdSet> {
        self.by_status.get(&status)
    }

    pub fn priority_bucket(&self, priority: Priority) -> Option<&IdSet> {
        self.by_priority.get(&priority)
    }

    pub fn tag_bucket(&self, tag: &str) -> Option<&IdSet> {
        self.by_tag.get(tag)
    }

    pub fn tag_bucket_count(&self) -> usize {
        self.by_tag.len()
    }

    /// Insert a task that is not yet stored.
    ///
    /// # Panics
    /// If a task with the same id is already stored; use `replace` for that.
    pub fn insert(&mut self, task: Task) {
        assert!(!self.tasks.contains_key(&task.id), "duplicate task id {}", task.id);
        self.index(&task);
        debug!(id = %task.id, status = %task.status, priority = %task.priority, tags = ?task.tags, "index insert");
        self.tasks.insert(task.id.clone(), task);
    }

    /// Swap in a new version of a stored task, moving its index entries.
    ///
    /// Returns the previous version, or gives the task back if the id is unknown.
    pub fn replace(&mut self, task: Task) -> std::result::Result<Task, Task> {
        let Some(previous) = self.tasks.remove(&task.id) else {
            return Err(task);
        };
        self.unindex(&previous);
        self.index(&task);
        debug!(
            id = %task.id,
            old_status = %previous.status,
            new_status = %task.status,
            old_priority = %previous.priority,
            new_priority = %task.priority,
            "index replace"
        );
        self.tasks.insert(task.id.clone(), task);
        Ok(previous)
    }

    /// Drop a task from the table and every bucket it is in
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let task = self.tasks.remove(id)?;
        self.unindex(&task);
        debug!(id, "index remove");
        Some(task)
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn index(&mut self, task: &Task) {
        self.by_status.entry(task.status).or_default().insert(task.id.clone());
        self.by_priority.entry(task.priority).or_default().insert(task.id.clone());
        for tag in &task.tags {
            self.by_tag.entry(tag.clone()).or_default().insert(task.id.clone());
        }
    }

    fn unindex(&mut self, task: &Task) {
        if let Some(bucket) = self.by_status.get_mut(&task.status) {
            bucket.remove(&task.id);
        }
        if let Some(bucket) = self.by_priority.get_mut(&task.priority) {
            bucket.remove(&task.id);
        }
        for tag in &task.tags {
            if let Some(bucket) = self.by_tag.get_mut(tag) {
                bucket.remove(&task.id);
                if bucket.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Compare every bucket with the primary table.
    ///
    /// Returns the first divergence found. Any error here is a bug in the
    /// mutation paths.
    pub fn verify(&self) -> Result<()> {
        let mut expected_status: HashMap<TaskStatus, IdSet> = HashMap::new();
        let mut expected_priority: HashMap<Priority, IdSet> = HashMap::new();
        let mut expected_tag: HashMap<String, IdSet> = HashMap::new();

        for (key, task) in &self.tasks {
            if key != &task.id {
                return Err(eyre!("Task stored under {} carries id {}", key, task.id));
            }
            if task.created_at > task.updated_at {
                return Err(eyre!("Task {} has created_at after updated_at", task.id));
            }
            expected_status.entry(task.status).or_default().insert(task.id.clone());
            expected_priority.entry(task.priority).or_default().insert(task.id.clone());
            for tag in &task.tags {
                expected_tag.entry(tag.clone()).or_default().insert(task.id.clone());
            }
        }

        for status in TaskStatus::ALL {
            let actual = self.by_status.get(&status).cloned().unwrap_or_default();
            let expected = expected_status.remove(&status).unwrap_or_default();
            if actual != expected {
                return Err(eyre!(
                    "Status bucket {} holds {:?}, expected {:?}",
                    status,
                    actual,
                    expected
                ));
            }
        }

        for priority in Priority::ALL {
            let actual = self.by_priority.get(&priority).cloned().unwrap_or_default();
            let expected = expected_priority.remove(&priority).unwrap_or_default();
            if actual != expected {
                return Err(eyre!(
                    "Priority bucket {} holds {:?}, expected {:?}",
                    priority,
                    actual,
                    expected
                ));
            }
        }

        if let Some((tag, _)) = self.by_tag.iter().find(|(_, bucket)| bucket.is_empty()) {
            return Err(eyre!("Empty tag bucket {} was not pruned", tag));
        }
        if self.by_tag != expected_tag {
            return Err(eyre!(
                "Tag index {:?} does not match stored tags {:?}",
                self.by_tag,
                expected_tag
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now;

    fn task(id: &str, status: TaskStatus, priority: Priority, tags: &[&str]) -> Task {
        let ts = now();
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            status,
            priority,
            due_date: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_insert_indexes_every_field() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::Todo, Priority::High, &["x", "y"]));

        assert!(index.status_bucket(TaskStatus::Todo).unwrap().contains("a"));
        assert!(index.priority_bucket(Priority::High).unwrap().contains("a"));
        assert!(index.tag_bucket("x").unwrap().contains("a"));
        assert!(index.tag_bucket("y").unwrap().contains("a"));
        assert_eq!(index.tag_bucket_count(), 2);
        index.verify().unwrap();
    }

    #[test]
    fn test_replace_moves_entries() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::Todo, Priority::Low, &["x"]));

        let previous = index
            .replace(task("a", TaskStatus::Completed, Priority::Low, &["z"]))
            .unwrap();
        assert_eq!(previous.status, TaskStatus::Todo);

        assert!(index.status_bucket(TaskStatus::Todo).unwrap().is_empty());
        assert!(index.status_bucket(TaskStatus::Completed).unwrap().contains("a"));
        assert!(index.tag_bucket("x").is_none());
        assert!(index.tag_bucket("z").unwrap().contains("a"));
        index.verify().unwrap();
    }

    #[test]
    #[should_panic(expected = "duplicate task id a")]
    fn test_insert_duplicate_id_panics() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::Todo, Priority::Low, &["x"]));
        index.insert(task("a", TaskStatus::Completed, Priority::High, &["y"]));
    }

    #[test]
    fn test_replace_unknown_returns_task() {
        let mut index = IndexSet::new();
        let result = index.replace(task("ghost", TaskStatus::Todo, Priority::Low, &[]));
        assert_eq!(result.unwrap_err().id, "ghost");
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_prunes_empty_tag_buckets() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::Todo, Priority::Low, &["shared", "solo"]));
        index.insert(task("b", TaskStatus::Todo, Priority::Low, &["shared"]));

        let removed = index.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(index.tag_bucket("solo").is_none());
        assert_eq!(index.tag_bucket("shared").unwrap().len(), 1);
        assert!(index.remove("a").is_none());
        index.verify().unwrap();
    }

    #[test]
    fn test_clear_resets_buckets() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::InProgress, Priority::Medium, &["x"]));
        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.tag_bucket_count(), 0);
        assert!(index.status_bucket(TaskStatus::InProgress).unwrap().is_empty());
        index.verify().unwrap();
    }

    #[test]
    fn test_verify_detects_stale_bucket() {
        let mut index = IndexSet::new();
        index.insert(task("a", TaskStatus::Todo, Priority::Low, &[]));
        index
            .by_status
            .get_mut(&TaskStatus::Completed)
            .unwrap()
            .insert("a".to_string());
        assert!(index.verify().is_err());
    }

    #[test]
    fn test_verify_detects_unpruned_tag() {
        let mut index = IndexSet::new();
        index.by_tag.insert("orphan".to_string(), IdSet::new());
        assert!(index.verify().is_err());
    }
}
