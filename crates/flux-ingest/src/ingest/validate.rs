use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use flux_model::jobspec;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Checks that an unwrapped jobspec is acceptable.
#[async_trait]
pub trait Validator: Send + Sync + 'static {
    async fn validate(&self, jobspec: &[u8]) -> Result<(), ValidationError>;
}

/// Structural check of version 1 jobspecs.
///
/// Requires `version: 1`, non-empty `resources` and `tasks` lists, a command, slot and count
/// on every task, and a mapping for `attributes` when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicValidator;

#[async_trait]
impl Validator for BasicValidator {
    async fn validate(&self, jobspec: &[u8]) -> Result<(), ValidationError> {
        let doc = jobspec::decode(jobspec)
            .map_err(|e| ValidationError::new(format!("jobspec is not valid JSON: {e}")))?;
        check(&doc)
    }
}

fn check(doc: &Value) -> Result<(), ValidationError> {
    let doc = doc
        .as_object()
        .ok_or_else(|| ValidationError::new("jobspec must be a mapping"))?;

    match doc.get("version").and_then(Value::as_i64) {
        Some(1) => {}
        Some(v) => return Err(ValidationError::new(format!("unsupported version {v}"))),
        None => return Err(ValidationError::new("missing required key 'version'")),
    }

    let resources = non_empty_list(doc.get("resources"), "resources")?;
    for res in resources {
        let kind = res.get("type").and_then(Value::as_str);
        if kind.is_none_or(str::is_empty) {
            return Err(ValidationError::new("every resource needs a 'type'"));
        }
    }

    let tasks = non_empty_list(doc.get("tasks"), "tasks")?;
    for task in tasks {
        let command = task
            .get("command")
            .and_then(Value::as_array)
            .ok_or_else(|| ValidationError::new("task 'command' must be a list"))?;
        if command.is_empty() || !command.iter().all(Value::is_string) {
            return Err(ValidationError::new(
                "task 'command' must be a non-empty list of strings",
            ));
        }
        if !task.get("slot").is_some_and(Value::is_string) {
            return Err(ValidationError::new("task 'slot' must be a string"));
        }
        if !task.get("count").is_some_and(Value::is_object) {
            return Err(ValidationError::new("task 'count' must be a mapping"));
        }
    }

    if let Some(attrs) = doc.get("attributes")
        && !attrs.is_object()
    {
        return Err(ValidationError::new("'attributes' must be a mapping"));
    }
    Ok(())
}

fn non_empty_list<'a>(value: Option<&'a Value>, key: &str) -> Result<&'a Vec<Value>, ValidationError> {
    let list = value
        .ok_or_else(|| ValidationError::new(format!("missing required key '{key}'")))?
        .as_array()
        .ok_or_else(|| ValidationError::new(format!("'{key}' must be a list")))?;
    if list.is_empty() {
        return Err(ValidationError::new(format!("'{key}' must not be empty")));
    }
    Ok(list)
}
