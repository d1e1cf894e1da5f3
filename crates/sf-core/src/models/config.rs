use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Platform-wide settings loaded from `sitefleet.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Root holding `sites/`, `storage/`, `repos/` and `caddy/`.
    pub apps_root: PathBuf,
    /// Parent domain; each site is served at `<id>.<domain>`.
    pub domain: String,
    #[serde(default = "default_port_floor")]
    pub port_floor: u16,
    #[serde(default)]
    pub core_server: Option<PathBuf>,
    #[serde(default)]
    pub core_components: Option<PathBuf>,
    #[serde(default)]
    pub template_site: Option<PathBuf>,
    #[serde(default)]
    pub template_storage: Option<PathBuf>,
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    /// Shared signing secret written to every `.env`. When unset each site
    /// gets its own random secret.
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default = "default_node_env")]
    pub node_env: String,

    /// Path the config was read from; baked into generated hooks.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub sites_dir: Option<PathBuf>,
    #[serde(default = "default_proxy_log_dir")]
    pub log_dir: PathBuf,
    /// Optional snippet imported at the top of every fragment.
    #[serde(default)]
    pub import: Option<String>,
    #[serde(default = "default_proxy_reload")]
    pub reload: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            sites_dir: None,
            log_dir: default_proxy_log_dir(),
            import: None,
            reload: default_proxy_reload(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_supervisor_program")]
    pub program: String,
    #[serde(default = "default_server_script")]
    pub script: String,
    /// Run `pm2 save` after changes so the process list survives reboots.
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            program: default_supervisor_program(),
            script: default_server_script(),
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_install")]
    pub install: Vec<String>,
    #[serde(default = "default_build")]
    pub build: Vec<String>,
    /// Extra PATH entries exported by generated hooks.
    #[serde(default)]
    pub path: Vec<String>,
    /// Binary the hook calls back into. Defaults to the running executable.
    #[serde(default)]
    pub orchestrator_bin: Option<PathBuf>,
    #[serde(default = "default_git_user_name")]
    pub git_user_name: String,
    #[serde(default = "default_git_user_email")]
    pub git_user_email: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            install: default_install(),
            build: default_build(),
            path: Vec::new(),
            orchestrator_bin: None,
            git_user_name: default_git_user_name(),
            git_user_email: default_git_user_email(),
        }
    }
}

impl PlatformConfig {
    /// A config rooted at `apps_root` with every other field defaulted.
    pub fn with_root(apps_root: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            apps_root: apps_root.into(),
            domain: domain.into(),
            port_floor: default_port_floor(),
            core_server: None,
            core_components: None,
            template_site: None,
            template_storage: None,
            manifest_path: None,
            proxy: ProxyConfig::default(),
            supervisor: SupervisorConfig::default(),
            deploy: DeployConfig::default(),
            signing_secret: None,
            node_env: default_node_env(),
            source_path: None,
        }
    }

    pub fn core_server(&self) -> PathBuf {
        self.core_server
            .clone()
            .unwrap_or_else(|| self.apps_root.join("siriusstudio").join("server"))
    }

    pub fn core_components(&self) -> PathBuf {
        self.core_components.clone().unwrap_or_else(|| {
            self.apps_root
                .join("siriusstudio")
                .join("app")
                .join("components")
                .join("content")
        })
    }

    pub fn template_site(&self) -> PathBuf {
        self.template_site
            .clone()
            .unwrap_or_else(|| self.apps_root.join("sites").join("template_0"))
    }

    pub fn template_storage(&self) -> PathBuf {
        self.template_storage
            .clone()
            .unwrap_or_else(|| self.apps_root.join("storage").join("template_0"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.apps_root.join("sites").join("info.json"))
    }

    pub fn proxy_sites_dir(&self) -> PathBuf {
        self.proxy
            .sites_dir
            .clone()
            .unwrap_or_else(|| self.apps_root.join("caddy").join("sites"))
    }

    pub fn orchestrator_bin(&self) -> PathBuf {
        self.deploy
            .orchestrator_bin
            .clone()
            .or_else(|| std::env::current_exe().ok())
            .unwrap_or_else(|| Path::new("sitefleet").to_path_buf())
    }

    pub fn site_domain(&self, id: &str) -> String {
        format!("{id}.{}", self.domain)
    }

    pub fn site_url(&self, id: &str) -> String {
        format!("https://{}", self.site_domain(id))
    }
}

fn default_port_floor() -> u16 {
    4000
}

fn default_node_env() -> String {
    "production".into()
}

fn default_proxy_log_dir() -> PathBuf {
    PathBuf::from("/var/log/caddy")
}

fn default_proxy_reload() -> Vec<String> {
    vec![
        "sudo".into(),
        "systemctl".into(),
        "reload".into(),
        "caddy".into(),
    ]
}

fn default_supervisor_program() -> String {
    "pm2".into()
}

fn default_server_script() -> String {
    "./.output/server/index.mjs".into()
}

fn default_true() -> bool {
    true
}

fn default_branch() -> String {
    "main".into()
}

fn default_install() -> Vec<String> {
    vec!["pnpm".into(), "install".into(), "--shamefully-hoist".into()]
}

fn default_build() -> Vec<String> {
    vec!["pnpm".into(), "run".into(), "build".into()]
}

fn default_git_user_name() -> String {
    "SiteFleet Bot".into()
}

fn default_git_user_email() -> String {
    "bot@sitefleet.invalid".into()
}
