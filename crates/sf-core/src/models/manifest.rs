use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SiteStatus {
    #[default]
    Active,
    Paused,
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteStatus::Active => f.write_str("active"),
            SiteStatus::Paused => f.write_str("paused"),
        }
    }
}

/// One tenant as recorded in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub id: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SiteStatus,
    #[serde(default, alias = "repoPath")]
    pub repo: String,
}

impl TenantRecord {
    pub fn new(id: String, port: u16, url: String, repo: String) -> Self {
        Self {
            id,
            port,
            url: Some(url),
            created_at: Utc::now(),
            status: SiteStatus::Active,
            repo,
        }
    }

    /// Supervisor process name, always `<id>:<port>`.
    pub fn process_name(&self) -> String {
        process_name(&self.id, self.port)
    }

    pub fn is_paused(&self) -> bool {
        self.status == SiteStatus::Paused
    }
}

pub fn process_name(id: &str, port: u16) -> String {
    format!("{id}:{port}")
}

/// The whole manifest file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(alias = "last_port")]
    pub last_port: u16,
    #[serde(default)]
    pub sites: Vec<TenantRecord>,
}

impl Manifest {
    pub fn empty(floor: u16) -> Self {
        Self {
            last_port: floor,
            sites: Vec::new(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&TenantRecord> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TenantRecord> {
        self.sites.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn max_used_port(&self) -> Option<u16> {
        self.sites.iter().map(|s| s.port).max()
    }

    /// Append a record, raising `last_port` so it never moves backwards.
    pub fn push(&mut self, record: TenantRecord) {
        self.last_port = self.last_port.max(record.port);
        self.sites.push(record);
    }

    /// Insert or replace the record with the same id.
    pub fn upsert(&mut self, record: TenantRecord) {
        match self.find_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                self.last_port = self.last_port.max(record.port);
            }
            None => self.push(record),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<TenantRecord> {
        let index = self.sites.iter().position(|s| s.id == id)?;
        Some(self.sites.remove(index))
    }
}
