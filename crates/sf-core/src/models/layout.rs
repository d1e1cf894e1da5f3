use std::path::PathBuf;

use super::config::PlatformConfig;

/// Directory names skipped when copying a template into a new site.
pub const TEMPLATE_EXCLUDES: &[&str] = &["node_modules", ".git", ".nuxt", "data", ".output", "dist"];

pub const ENV_FILE: &str = ".env";
pub const DESCRIPTOR_FILE: &str = "ecosystem.config.json";
pub const TENANT_CONFIG_FILE: &str = "_config.json";

/// Resolves every on-disk location the orchestrator manages.
#[derive(Debug, Clone)]
pub struct PlatformLayout {
    apps_root: PathBuf,
    proxy_sites_dir: PathBuf,
    proxy_log_dir: PathBuf,
}

/// All paths belonging to one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub site_dir: PathBuf,
    pub storage_root: PathBuf,
    pub repo_dir: PathBuf,
    pub proxy_fragment: PathBuf,
    pub access_log: PathBuf,
}

impl SitePaths {
    pub fn env_file(&self) -> PathBuf {
        self.site_dir.join(ENV_FILE)
    }

    pub fn descriptor_file(&self) -> PathBuf {
        self.site_dir.join(DESCRIPTOR_FILE)
    }

    pub fn tenant_config(&self) -> PathBuf {
        self.storage_root.join(TENANT_CONFIG_FILE)
    }

    pub fn hook_file(&self) -> PathBuf {
        self.repo_dir.join("hooks").join("post-receive")
    }

    /// Directories removed by Delete and moved by Rename.
    pub fn directories(&self) -> [&PathBuf; 3] {
        [&self.site_dir, &self.storage_root, &self.repo_dir]
    }
}

impl PlatformLayout {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            apps_root: config.apps_root.clone(),
            proxy_sites_dir: config.proxy_sites_dir(),
            proxy_log_dir: config.proxy.log_dir.clone(),
        }
    }

    pub fn sites_dir(&self) -> PathBuf {
        self.apps_root.join("sites")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.apps_root.join("storage")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.apps_root.join("repos")
    }

    pub fn proxy_sites_dir(&self) -> PathBuf {
        self.proxy_sites_dir.clone()
    }

    /// Orchestrator bookkeeping (locks, journal).
    pub fn state_dir(&self) -> PathBuf {
        self.apps_root.join(".sitefleet")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.state_dir().join("locks")
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.state_dir().join("journal")
    }

    pub fn site_lock(&self, id: &str) -> PathBuf {
        self.locks_dir().join(format!("{id}.lock"))
    }

    pub fn proxy_fragment(&self, id: &str) -> PathBuf {
        self.proxy_sites_dir.join(format!("{id}.caddy"))
    }

    pub fn manifest_lock(&self) -> PathBuf {
        self.locks_dir().join("manifest.lock")
    }

    pub fn site(&self, id: &str) -> SitePaths {
        SitePaths {
            site_dir: self.sites_dir().join(id),
            storage_root: self.storage_dir().join(id),
            repo_dir: self.repos_dir().join(format!("{id}.git")),
            proxy_fragment: self.proxy_fragment(id),
            access_log: self.proxy_log_dir.join(format!("{}.log", log_name(id))),
        }
    }
}

/// Access-log file stem: anything outside `[a-z0-9]` becomes `_`.
pub fn log_name(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_paths_follow_platform_layout() {
        let config = PlatformConfig::with_root("/srv/apps", "example.test");
        let layout = PlatformLayout::new(&config);
        let paths = layout.site("client-a");
        assert_eq!(paths.site_dir, PathBuf::from("/srv/apps/sites/client-a"));
        assert_eq!(paths.storage_root, PathBuf::from("/srv/apps/storage/client-a"));
        assert_eq!(paths.repo_dir, PathBuf::from("/srv/apps/repos/client-a.git"));
        assert_eq!(
            paths.proxy_fragment,
            PathBuf::from("/srv/apps/caddy/sites/client-a.caddy")
        );
        assert_eq!(paths.access_log, PathBuf::from("/var/log/caddy/client_a.log"));
        assert_eq!(
            paths.hook_file(),
            PathBuf::from("/srv/apps/repos/client-a.git/hooks/post-receive")
        );
    }

    #[test]
    fn log_name_replaces_non_alphanumerics() {
        assert_eq!(log_name("my-site-2"), "my_site_2");
    }
}
