// Aggregate counts over all live tasks

use crate::index::IndexSet;
use crate::models::{Priority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    /// Distinct tags in use
    pub total: usize,
    pub popular: Vec<TagCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue: usize,
    /// Completed tasks last updated on the current UTC date
    pub completed_today: usize,
    pub tags: TagStats,
}

/// Single pass over the index. Popular tags are ordered by count, then name.
pub fn compute(index: &IndexSet, now: DateTime<Utc>, top_tags: usize) -> TaskStats {
    let today = now.date_naive();
    let mut stats = TaskStats::default();
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();

    for task in index.tasks() {
        stats.total += 1;
        stats.by_status.bump(task.status);
        stats.by_priority.bump(task.priority);
        if task.is_overdue(now) {
            stats.overdue += 1;
        }
        if task.status == TaskStatus::Completed && task.updated_at.date_naive() == today {
            stats.completed_today += 1;
        }
        for tag in &task.tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut popular: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

    stats.tags.total = popular.len();
    popular.truncate(top_tags);
    stats.tags.popular = popular;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 9, 30, 0).unwrap()
    }

    fn task(id: &str, status: TaskStatus, priority: Priority, tags: &[&str]) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            status,
            priority,
            due_date: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now() - Duration::days(3),
            updated_at: now() - Duration::hours(1),
        }
    }

    #[test]
    fn test_empty_index() {
        let stats = compute(&IndexSet::new(), now(), 5);
        assert_eq!(stats, TaskStats::default());
    }

    #[test]
    fn test_counts_by_status_and_priority() {
        let mut index = IndexSet::new();
        index.insert(task("1", TaskStatus::Todo, Priority::High, &[]));
        index.insert(task("2", TaskStatus::Todo, Priority::Low, &[]));
        index.insert(task("3", TaskStatus::InProgress, Priority::High, &[]));
        index.insert(task("4", TaskStatus::Completed, Priority::Medium, &[]));

        let stats = compute(&index, now(), 5);
        assert_eq!(stats.total, 4);
        assert_eq!(
            stats.by_status,
            StatusCounts {
                todo: 2,
                in_progress: 1,
                completed: 1
            }
        );
        assert_eq!(
            stats.by_priority,
            PriorityCounts {
                low: 1,
                medium: 1,
                high: 2
            }
        );
    }

    #[test]
    fn test_overdue_and_completed_today() {
        let mut index = IndexSet::new();

        let mut late = task("late", TaskStatus::Todo, Priority::Medium, &[]);
        late.due_date = Some(now() - Duration::days(1));
        index.insert(late);

        let mut late_but_done = task("done", TaskStatus::Completed, Priority::Medium, &[]);
        late_but_done.due_date = Some(now() - Duration::days(1));
        index.insert(late_but_done);

        let mut done_yesterday = task("old", TaskStatus::Completed, Priority::Medium, &[]);
        done_yesterday.updated_at = now() - Duration::days(1);
        index.insert(done_yesterday);

        let stats = compute(&index, now(), 5);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completed_today, 1);
    }

    #[test]
    fn test_completed_today_uses_utc_date() {
        let mut index = IndexSet::new();
        let mut done = task("d", TaskStatus::Completed, Priority::Medium, &[]);
        // 23:59 the previous UTC day
        done.updated_at = Utc.with_ymd_and_hms(2026, 5, 19, 23, 59, 0).unwrap();
        done.created_at = done.updated_at;
        index.insert(done);

        assert_eq!(compute(&index, now(), 5).completed_today, 0);
    }

    #[test]
    fn test_popular_tags_ordering_and_truncation() {
        let mut index = IndexSet::new();
        index.insert(task("1", TaskStatus::Todo, Priority::Medium, &["b", "a", "c"]));
        index.insert(task("2", TaskStatus::Todo, Priority::Medium, &["b", "a"]));
        index.insert(task("3", TaskStatus::Todo, Priority::Medium, &["b", "d"]));

        let stats = compute(&index, now(), 3);
        assert_eq!(stats.tags.total, 4);
        let popular: Vec<(&str, usize)> = stats.tags.popular.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(popular, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_stats_json_shape() {
        let mut index = IndexSet::new();
        index.insert(task("1", TaskStatus::InProgress, Priority::Low, &["x"]));
        let json = serde_json::to_value(compute(&index, now(), 5)).unwrap();

        assert_eq!(json["byStatus"]["in_progress"], 1);
        assert_eq!(json["byPriority"]["low"], 1);
        assert_eq!(json["completedToday"], 0);
        assert_eq!(json["tags"]["popular"][0]["tag"], "x");
    }
}
