// JSONL import of task inputs

use crate::models::NewTask;
use crate::store::Store;
use eyre::{Result, WrapErr};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Read one `NewTask` per line.
///
/// Blank lines are ignored. Lines that fail to read or parse are logged and
/// skipped.
pub fn read_new_tasks(path: &Path) -> Result<Vec<NewTask>> {
    let file = File::open(path).wrap_err_with(|| format!("Failed to open JSONL file {:?}", path))?;
    let reader = BufReader::new(file);
    let mut inputs = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<NewTask>(&line) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
            }
        }
    }

    Ok(inputs)
}

/// Create every valid task from `path` in `store`, returning how many landed
pub fn seed_store(store: &Store, path: &Path) -> Result<usize> {
    let inputs = read_new_tasks(path).wrap_err("Failed to read seed file")?;
    let mut created = 0;

    for (n, input) in inputs.into_iter().enumerate() {
        match store.create(input) {
            Ok(_) => created += 1,
            Err(e) => {
                warn!(file = ?path, entry = n + 1, error = %format!("{:#}", e), "Rejected task, skipping");
            }
        }
    }

    info!(file = ?path, count = created, "Seeded store from JSONL");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_new_tasks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"title\":\"One\",\"status\":\"in_progress\"}\n",
                "\n",
                "{\"title\":\"Two\",\"tags\":[\"a\"]}\n",
            ),
        )
        .unwrap();

        let inputs = read_new_tasks(&path).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].status, Some(TaskStatus::InProgress));
        assert_eq!(inputs[1].tags, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");
        fs::write(&path, "{\"title\":\"Good\"}\nnot json\n{\"nope\":1}\n").unwrap();

        let inputs = read_new_tasks(&path).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].title, "Good");
    }

    #[test]
    fn test_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        assert!(read_new_tasks(&temp.path().join("absent.jsonl")).is_err());
    }

    #[test]
    fn test_seed_store_skips_invalid_tasks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");
        fs::write(
            &path,
            "{\"title\":\"Valid\",\"tags\":[\"x\"]}\n{\"title\":\"   \"}\n{\"title\":\"Also valid\"}\n",
        )
        .unwrap();

        let store = Store::new();
        assert_eq!(seed_store(&store, &path).unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.ids_by_tag("x").len(), 1);
    }
}
