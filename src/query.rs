// Filtered, sorted, paginated reads over an IndexSet

use crate::config::{MAX_PAGE_LIMIT, PageConfig};
use crate::index::{IdSet, IndexSet};
use crate::models::{Priority, Task, TaskStatus};
use crate::validate::normalize_tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Query parameters. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// All listed tags must be present
    pub tags: Vec<String>,
    /// Case-insensitive substring over title or description
    pub search: Option<String>,
    pub overdue: bool,
    /// Free-form so unknown values can fall back to the default sort
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Description,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
    DueDate,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SortField::Title),
            "description" => Some(SortField::Description),
            "status" => Some(SortField::Status),
            "priority" => Some(SortField::Priority),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "dueDate" => Some(SortField::DueDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<Task>,
    pub pagination: Pagination,
}

/// Intersect two id sets, iterating the smaller and probing the larger
pub fn intersect(a: &IdSet, b: &IdSet) -> IdSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|id| large.contains(*id)).cloned().collect()
}

impl TaskQuery {
    /// Resolve the sort key and direction, falling back to `updatedAt` desc
    pub fn sort(&self) -> (SortField, SortOrder) {
        match self.sort_by.as_deref().and_then(SortField::parse) {
            Some(field) => (field, self.sort_order.unwrap_or_default()),
            None => (SortField::UpdatedAt, SortOrder::Desc),
        }
    }

    /// Clamp `limit` into `[1, max_limit]` and `offset` to at least 0.
    ///
    /// `max_limit` never exceeds `MAX_PAGE_LIMIT`, even for a hand-built
    /// `PageConfig`.
    pub fn window(&self, page: &PageConfig) -> (usize, usize) {
        let max = page.max_limit.clamp(1, MAX_PAGE_LIMIT);
        let default = page.default_limit.clamp(1, max);
        let limit = match self.limit {
            Some(requested) => requested.clamp(1, max as i64) as usize,
            None => default,
        };
        let offset = usize::try_from(self.offset.unwrap_or(0).max(0)).unwrap_or(usize::MAX);
        (limit, offset)
    }

    // Blank searches are ignored; otherwise the needle is matched as given
    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_lowercase)
    }
}

// Intersect the running candidate set with one bucket. A missing bucket
// empties it.
fn narrow_with(current: &mut Option<IdSet>, bucket: Option<&IdSet>) {
    let Some(bucket) = bucket else {
        *current = Some(IdSet::new());
        return;
    };
    *current = Some(match current.as_ref() {
        Some(set) => intersect(set, bucket),
        None => bucket.clone(),
    });
}

/// Narrow ids through the status, priority and tag buckets.
///
/// `None` means no index filter applied, so every id is a candidate.
fn narrow(index: &IndexSet, query: &TaskQuery) -> Option<IdSet> {
    let mut current: Option<IdSet> = None;

    if let Some(status) = query.status {
        narrow_with(&mut current, index.status_bucket(status));
    }
    if let Some(priority) = query.priority {
        narrow_with(&mut current, index.priority_bucket(priority));
    }
    for tag in &query.tags {
        if current.as_ref().is_some_and(|set| set.is_empty()) {
            break;
        }
        narrow_with(&mut current, index.tag_bucket(&normalize_tag(tag)));
    }

    current
}

/// Run a query against the index as of `now`
pub fn run(index: &IndexSet, query: &TaskQuery, now: DateTime<Utc>, page: &PageConfig) -> Page {
    let narrowed = narrow(index, query);
    let needle = query.search_needle();

    let matches = |task: &Task| {
        if query.overdue && !task.is_overdue(now) {
            return false;
        }
        match &needle {
            Some(needle) => {
                task.title.to_lowercase().contains(needle) || task.description.to_lowercase().contains(needle)
            }
            None => true,
        }
    };

    let mut records: Vec<Task> = match &narrowed {
        Some(ids) => ids.iter().filter_map(|id| index.get(id)).filter(|t| matches(*t)).cloned().collect(),
        None => index.tasks().filter(|t| matches(*t)).cloned().collect(),
    };

    let (field, order) = query.sort();
    sort_tasks(&mut records, field, order);

    let (limit, offset) = query.window(page);
    let total = records.len();
    let records: Vec<Task> = records.into_iter().skip(offset).take(limit).collect();

    Page {
        records,
        pagination: Pagination {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(limit) < total,
        },
    }
}

/// Sort by `field` in `order`; ties fall back to id ascending.
///
/// A missing value ranks after every present value, so it lands last when
/// ascending and first when descending.
pub fn sort_tasks(tasks: &mut [Task], field: SortField, order: SortOrder) {
    tasks.sort_by(|a, b| {
        let by_key = compare_field(a, b, field);
        let by_key = match order {
            SortOrder::Asc => by_key,
            SortOrder::Desc => by_key.reverse(),
        };
        by_key.then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_field(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::Title => compare_text(&a.title, &b.title),
        SortField::Description => compare_text(&a.description, &b.description),
        SortField::Status => a.status.cmp(&b.status),
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

// Case-folded order, raw order on ties
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
