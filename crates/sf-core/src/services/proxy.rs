use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FleetError, Result};
use crate::models::{PlatformConfig, PlatformLayout, ProxyRoute};

use super::command::{CommandRunner, CommandSpec};
use super::render;

/// Owns one Caddy fragment per site under the directory the root Caddyfile
/// imports.
pub struct ProxyRegistrar {
    runner: Arc<dyn CommandRunner>,
    layout: PlatformLayout,
    import: Option<String>,
    reload_command: Vec<String>,
}

impl ProxyRegistrar {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &PlatformConfig, layout: PlatformLayout) -> Self {
        Self {
            runner,
            layout,
            import: config.proxy.import.clone(),
            reload_command: config.proxy.reload.clone(),
        }
    }

    pub async fn write_route(&self, route: &ProxyRoute) -> Result<PathBuf> {
        let sites_dir = self.layout.proxy_sites_dir();
        tokio::fs::create_dir_all(&sites_dir)
            .await
            .map_err(|e| proxy_error(&sites_dir, e))?;
        let path = self.layout.proxy_fragment(&route.site_id);
        let fragment = render::render_proxy_fragment(route, self.import.as_deref());
        tokio::fs::write(&path, fragment)
            .await
            .map_err(|e| proxy_error(&path, e))?;
        tracing::info!(site = %route.site_id, domain = %route.domain, port = route.port, "proxy_route_written");
        Ok(path)
    }

    /// Returns whether a fragment existed.
    pub async fn remove_route(&self, site_id: &str) -> Result<bool> {
        let path = self.layout.proxy_fragment(site_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(site = site_id, "proxy_route_removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(proxy_error(&path, e)),
        }
    }

    /// Ask the proxy to pick up fragment changes. Failure only warns: the
    /// fragment on disk is already correct and the next reload applies it.
    pub async fn reload(&self) -> bool {
        let spec = match CommandSpec::from_argv(&self.reload_command) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(error = %e, "proxy_reload_misconfigured");
                return false;
            }
        };
        match self.runner.run_checked(&spec).await {
            Ok(_) => {
                tracing::debug!("proxy_reloaded");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "proxy_reload_failed");
                false
            }
        }
    }
}

fn proxy_error(path: &Path, e: std::io::Error) -> FleetError {
    FleetError::Proxy(format!("{}: {e}", path.display()))
}
