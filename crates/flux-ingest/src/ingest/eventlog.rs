use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

/// One line of a job eventlog.
#[derive(Debug, Clone, Serialize)]
pub struct EventEntry {
    pub timestamp: f64,
    pub name: &'static str,
    pub context: Value,
}

impl EventEntry {
    pub fn now(name: &'static str, context: Value) -> Self {
        Self {
            timestamp: unix_now(),
            name,
            context,
        }
    }

    /// Newline-terminated compact JSON.
    pub fn encode(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_default();
        line.push('\n');
        line
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
