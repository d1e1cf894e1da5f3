use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manifest::TenantRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Create,
    Rename,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Rename => f.write_str("rename"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Step log of one in-flight lifecycle operation. Removed on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub operation: Operation,
    /// The record the operation is driving towards.
    pub target: TenantRecord,
    /// For rename: the record before the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<TenantRecord>,
    #[serde(default)]
    pub completed: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(operation: Operation, target: TenantRecord, previous: Option<TenantRecord>) -> Self {
        let now = Utc::now();
        Self {
            operation,
            target,
            previous,
            completed: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn site(&self) -> &str {
        &self.target.id
    }

    pub fn has_completed(&self, step: &str) -> bool {
        self.completed.iter().any(|s| s == step)
    }

    pub fn last_step(&self) -> Option<&str> {
        self.completed.last().map(String::as_str)
    }
}
