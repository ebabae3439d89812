// Input validation for task mutations

use crate::models::{NewTask, TaskPatch};
use eyre::{Result, eyre};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_TAGS: usize = 10;

/// Validate a title and return it trimmed
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(eyre!("Task title cannot be empty or whitespace-only"));
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(eyre!("Task title too long: {} chars (max {})", len, MAX_TITLE_CHARS));
    }
    Ok(trimmed.to_string())
}

pub fn validate_description(description: &str) -> Result<()> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(eyre!(
            "Task description too long: {} chars (max {})",
            len,
            MAX_DESCRIPTION_CHARS
        ));
    }
    Ok(())
}

/// Lowercase a tag without checking it
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize, deduplicate (first occurrence wins) and check a tag list
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for raw in tags {
        let tag = normalize_tag(raw.as_ref());
        if tag.is_empty() {
            return Err(eyre!("Tag cannot be empty"));
        }
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid tag: {} (must match [A-Za-z0-9_-]+)", raw.as_ref()));
        }
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(eyre!("Too many tags: {} (max {})", out.len(), MAX_TAGS));
    }
    Ok(out)
}

/// Check a create input, returning it with title and tags normalized
pub fn validate_new_task(input: NewTask) -> Result<NewTask> {
    let title = validate_title(&input.title)?;
    if let Some(description) = &input.description {
        validate_description(description)?;
    }
    let tags = input.tags.as_deref().map(normalize_tags).transpose()?;
    Ok(NewTask { title, tags, ..input })
}

/// Check an update input, returning it with title and tags normalized
pub fn validate_patch(patch: TaskPatch) -> Result<TaskPatch> {
    let title = patch.title.as_deref().map(validate_title).transpose()?;
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    let tags = patch.tags.as_deref().map(normalize_tags).transpose()?;
    Ok(TaskPatch { title, tags, ..patch })
}
