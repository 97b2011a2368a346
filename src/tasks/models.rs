// src/tasks/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];

// ============================================================================
// Task Models
// ============================================================================

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// Present-but-null becomes `Some(None)`; an absent field stays `None`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields are left untouched, `"description": null` clears it
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl Task {
    /// Apply a partial update. Touching `completed` stamps or clears `completed_at`.
    pub fn apply(&mut self, update: UpdateTaskRequest, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
            self.completed_at = completed.then_some(now);
        }
    }
}
