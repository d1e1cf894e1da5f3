use std::path::{Path, PathBuf};

use crate::error::{FleetError, Result};
use crate::models::PlatformConfig;

pub const CONFIG_FILENAME: &str = "sitefleet.yaml";

pub fn load(config_path: &Path) -> Result<PlatformConfig> {
    if !config_path.exists() {
        return Err(FleetError::ConfigNotFound(config_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(config_path)?;
    let mut config: PlatformConfig = serde_yaml::from_str(&contents)
        .map_err(|e| FleetError::InvalidConfig(e.to_string()))?;
    validate(&config)?;
    config.source_path = Some(
        std::path::absolute(config_path).unwrap_or_else(|_| config_path.to_path_buf()),
    );
    Ok(config)
}

pub fn validate(config: &PlatformConfig) -> Result<()> {
    if !config.apps_root.is_absolute() {
        return Err(FleetError::InvalidConfig(format!(
            "apps_root must be absolute, got {}",
            config.apps_root.display()
        )));
    }
    if config.domain.trim().is_empty() {
        return Err(FleetError::InvalidConfig("domain field is required".into()));
    }
    if config.port_floor == 0 {
        return Err(FleetError::InvalidConfig("port_floor must be non-zero".into()));
    }
    if config.deploy.install.is_empty() || config.deploy.build.is_empty() {
        return Err(FleetError::InvalidConfig(
            "deploy.install and deploy.build must name a command".into(),
        ));
    }
    if config.proxy.reload.is_empty() {
        return Err(FleetError::InvalidConfig(
            "proxy.reload must name a command".into(),
        ));
    }
    Ok(())
}

/// Walk up from `start` looking for `sitefleet.yaml`.
pub fn discover(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}
