// In-memory task store guarded by a single reader/writer lock

use crate::config::Config;
use crate::index::{IdSet, IndexSet};
use crate::models::{NewTask, Priority, Task, TaskPatch, TaskStatus, now};
use crate::query::{self, Page, TaskQuery};
use crate::stats::{self, TaskStats};
use crate::validate;
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Owner of every live task and its indexes.
///
/// Mutations take the write lock for their full read-modify-write, so readers
/// never see a task indexed under both its old and new values. Everything
/// handed out is a clone.
#[derive(Debug, Default)]
pub struct Store {
    index: RwLock<IndexSet>,
    config: Config,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            index: RwLock::new(IndexSet::new()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a task from validated input and return the stored copy
    pub fn create(&self, input: NewTask) -> Result<Task> {
        let input = validate::validate_new_task(input).wrap_err("Invalid task input")?;
        let ts = now();

        let mut index = self.index.write();
        let mut id = Uuid::now_v7().to_string();
        while index.contains(&id) {
            id = Uuid::now_v7().to_string();
        }

        let task = Task {
            id,
            title: input.title,
            description: input.description.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            tags: input.tags.unwrap_or_default(),
            created_at: ts,
            updated_at: ts,
        };

        debug!(id = %task.id, status = %task.status, "Created task");
        index.insert(task.clone());
        Ok(task)
    }

    /// Get a task by id
    pub fn get(&self, id: &str) -> Option<Task> {
        self.index.read().get(id).cloned()
    }

    /// Merge `patch` into the stored task.
    ///
    /// Returns `Ok(None)` for an unknown id. `id` and `created_at` never change;
    /// `updated_at` is refreshed even for an empty patch.
    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let patch = validate::validate_patch(patch).wrap_err("Invalid task update")?;

        let mut index = self.index.write();
        let Some(current) = index.get(id) else {
            debug!(id, "Update of unknown task");
            return Ok(None);
        };

        let mut task = current.clone();
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        task.updated_at = now().max(task.updated_at);

        debug!(id, status = %task.status, priority = %task.priority, "Updated task");
        match index.replace(task.clone()) {
            Ok(_) => Ok(Some(task)),
            Err(_) => Ok(None),
        }
    }

    /// Delete a task, returning what was removed
    pub fn delete(&self, id: &str) -> Option<Task> {
        let removed = self.index.write().remove(id);
        if removed.is_some() {
            debug!(id, "Deleted task");
        }
        removed
    }

    /// Drop every task and bucket
    pub fn clear(&self) {
        let mut index = self.index.write();
        let count = index.len();
        index.clear();
        info!(count, "Cleared store");
    }

    // ========================================================================
    // Index views (copies)
    // ========================================================================

    pub fn all_ids(&self) -> IdSet {
        self.index.read().ids().cloned().collect()
    }

    pub fn ids_by_status(&self, status: TaskStatus) -> IdSet {
        self.index.read().status_bucket(status).cloned().unwrap_or_default()
    }

    pub fn ids_by_priority(&self, priority: Priority) -> IdSet {
        self.index.read().priority_bucket(priority).cloned().unwrap_or_default()
    }

    pub fn ids_by_tag(&self, tag: &str) -> IdSet {
        self.index
            .read()
            .tag_bucket(&validate::normalize_tag(tag))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of non-empty tag buckets
    pub fn tag_bucket_count(&self) -> usize {
        self.index.read().tag_bucket_count()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Every task in default order (newest update first)
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.index.read().tasks().cloned().collect();
        query::sort_tasks(&mut tasks, query::SortField::UpdatedAt, query::SortOrder::Desc);
        tasks
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn query(&self, q: &TaskQuery) -> Page {
        self.query_at(q, now())
    }

    /// Query with an explicit clock for the overdue predicate
    pub fn query_at(&self, q: &TaskQuery, now: DateTime<Utc>) -> Page {
        let page = query::run(&self.index.read(), q, now, &self.config.page);
        debug!(
            total = page.pagination.total,
            returned = page.records.len(),
            "Ran task query"
        );
        page
    }

    pub fn stats(&self) -> TaskStats {
        self.stats_at(now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> TaskStats {
        stats::compute(&self.index.read(), now, self.config.popular_tags)
    }

    /// Check every bucket against the primary table
    pub fn verify_indexes(&self) -> Result<()> {
        self.index.read().verify()
    }
}
