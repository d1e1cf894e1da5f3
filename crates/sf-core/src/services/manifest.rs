use std::path::{Path, PathBuf};

use crate::error::{FleetError, Result};
use crate::models::Manifest;

use super::lock::FileLock;

/// Reads and writes the manifest file. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    lock_path: PathBuf,
    port_floor: u16,
}

/// Exclusive access to the manifest for one read-modify-write cycle.
#[derive(Debug)]
pub struct ManifestGuard {
    manifest: Manifest,
    path: PathBuf,
    _lock: FileLock,
}

impl ManifestStore {
    pub fn new(path: PathBuf, lock_path: PathBuf, port_floor: u16) -> Self {
        Self {
            path,
            lock_path,
            port_floor,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlocked snapshot read; an absent file yields an empty manifest.
    pub async fn load(&self) -> Result<Manifest> {
        read_manifest(&self.path, self.port_floor).await
    }

    pub async fn save(&self, manifest: &Manifest) -> Result<()> {
        write_manifest(&self.path, manifest).await
    }

    /// Take the manifest lock and load a fresh copy under it.
    pub async fn lock(&self) -> Result<ManifestGuard> {
        let lock = FileLock::acquire(&self.lock_path).await?;
        let manifest = read_manifest(&self.path, self.port_floor).await?;
        Ok(ManifestGuard {
            manifest,
            path: self.path.clone(),
            _lock: lock,
        })
    }
}

impl ManifestGuard {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    /// Persist the current contents while still holding the lock.
    pub async fn commit(&self) -> Result<()> {
        write_manifest(&self.path, &self.manifest).await
    }
}

async fn read_manifest(path: &Path, floor: u16) -> Result<Manifest> {
    if !path.exists() {
        return Ok(Manifest::empty(floor));
    }
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FleetError::Manifest(format!("failed to read {}: {e}", path.display())))?;
    let manifest: Manifest = serde_json::from_str(&json)
        .map_err(|e| FleetError::Manifest(format!("failed to parse {}: {e}", path.display())))?;
    Ok(manifest)
}

async fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FleetError::Manifest(format!("failed to create manifest dir: {e}")))?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| FleetError::Manifest(format!("failed to write manifest: {e}")))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| FleetError::Manifest(format!("failed to replace manifest: {e}")))?;
    Ok(())
}
