use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{FleetError, Result};
use crate::models::{JournalEntry, Operation, TenantRecord};

/// One JSON file per in-flight operation, named after the target site.
#[derive(Debug, Clone)]
pub struct JournalStore {
    dir: PathBuf,
}

impl JournalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, site_id: &str) -> PathBuf {
        self.dir.join(format!("{site_id}.json"))
    }

    pub async fn begin(
        &self,
        operation: Operation,
        target: TenantRecord,
        previous: Option<TenantRecord>,
    ) -> Result<JournalEntry> {
        let entry = JournalEntry::new(operation, target, previous);
        self.write(&entry).await?;
        Ok(entry)
    }

    /// Mark `step` done and persist.
    pub async fn record(&self, entry: &mut JournalEntry, step: &str) -> Result<()> {
        if !entry.has_completed(step) {
            entry.completed.push(step.to_string());
        }
        entry.updated_at = Utc::now();
        self.write(entry).await
    }

    pub async fn load(&self, site_id: &str) -> Result<Option<JournalEntry>> {
        read_entry(&self.entry_path(site_id)).await
    }

    /// The entry targeting `site_id`, or a rename entry moving away from it.
    pub async fn find(&self, site_id: &str) -> Result<Option<JournalEntry>> {
        if let Some(entry) = self.load(site_id).await? {
            return Ok(Some(entry));
        }
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|e| e.previous.as_ref().is_some_and(|p| p.id == site_id)))
    }

    /// All pending entries. Unreadable files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<JournalEntry>> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(FleetError::Journal(format!("failed to read journal dir: {e}"))),
        };
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| FleetError::Journal(e.to_string()))?
        {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "journal_entry_unreadable"),
            }
        }
        entries.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(entries)
    }

    pub async fn clear(&self, site_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.entry_path(site_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FleetError::Journal(format!("failed to clear journal: {e}"))),
        }
    }

    async fn write(&self, entry: &JournalEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FleetError::Journal(format!("failed to create journal dir: {e}")))?;
        let json = serde_json::to_string_pretty(entry)?;
        tokio::fs::write(self.entry_path(entry.site()), json)
            .await
            .map_err(|e| FleetError::Journal(format!("failed to write journal: {e}")))?;
        Ok(())
    }
}

async fn read_entry(path: &Path) -> Result<Option<JournalEntry>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FleetError::Journal(format!("failed to read {}: {e}", path.display())))?;
    let entry = serde_json::from_str(&json)
        .map_err(|e| FleetError::Journal(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(entry))
}
