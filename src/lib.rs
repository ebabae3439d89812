// TaskIndex - In-memory task store with secondary indexes and paginated queries

pub mod config;
pub mod index;
pub mod jsonl;
pub mod models;
pub mod query;
pub mod stats;
pub mod store;
pub mod validate;

// Re-export main types for convenience
pub use config::{Config, PageConfig};
pub use index::{IdSet, IndexSet};
pub use models::{NewTask, Priority, Task, TaskPatch, TaskStatus, now};
pub use query::{Page, Pagination, SortField, SortOrder, TaskQuery, intersect};
pub use stats::{PriorityCounts, StatusCounts, TagCount, TagStats, TaskStats};
pub use store::Store;
