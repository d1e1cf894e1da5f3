use std::path::PathBuf;

/// One tenant's reverse-proxy entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub site_id: String,
    pub domain: String,
    pub port: u16,
    pub log_path: PathBuf,
}
