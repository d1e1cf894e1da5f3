use std::path::PathBuf;

use sf_core::models::{PlatformConfig, PlatformLayout, TenantRecord};
use sf_core::services::render;

fn platform() -> PlatformConfig {
    let mut config = PlatformConfig::with_root("/srv/apps", "example.test");
    config.deploy.orchestrator_bin = Some(PathBuf::from("/usr/local/bin/sitefleet"));
    config.deploy.path = vec!["/usr/local/bin".into(), "/opt/node/bin".into()];
    config.source_path = Some(PathBuf::from("/srv/apps/sitefleet.yaml"));
    config.proxy.import = Some("common".into());
    config
}

fn record(config: &PlatformConfig) -> TenantRecord {
    TenantRecord::new(
        "client-a".into(),
        4006,
        config.site_url("client-a"),
        "/srv/apps/repos/client-a.git".into(),
    )
}

#[test]
fn post_receive_hook() {
    let config = platform();
    let hook = render::render_hook(&config, &record(&config));
    insta::assert_snapshot!("post_receive_hook", hook);
}

#[test]
fn caddy_fragment() {
    let config = platform();
    let paths = PlatformLayout::new(&config).site("client-a");
    let route = render::proxy_route(&config, &record(&config), &paths);
    let fragment = render::render_proxy_fragment(&route, config.proxy.import.as_deref());
    insta::assert_snapshot!("caddy_fragment", fragment);
}

#[test]
fn env_file() {
    let config = platform();
    let paths = PlatformLayout::new(&config).site("client-a");
    let env = render::render_env(&config, &record(&config), &paths, "s3cret");
    insta::assert_snapshot!("env_file", env);
}
