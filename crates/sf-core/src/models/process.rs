use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the supervisor needs to launch one site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub name: String,
    pub script: String,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProcessState {
    Online,
    Launching,
    Stopping,
    Stopped,
    Errored,
    Unknown,
}

impl ProcessState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "online" => ProcessState::Online,
            "launching" | "waiting restart" => ProcessState::Launching,
            "stopping" => ProcessState::Stopping,
            "stopped" => ProcessState::Stopped,
            "errored" => ProcessState::Errored,
            _ => ProcessState::Unknown,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, ProcessState::Online | ProcessState::Launching)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProcessState::Online => "online",
            ProcessState::Launching => "launching",
            ProcessState::Stopping => "stopping",
            ProcessState::Stopped => "stopped",
            ProcessState::Errored => "errored",
            ProcessState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A supervised process as reported by `list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessInfo {
    pub name: String,
    pub status: ProcessState,
}
