//! Text artifacts derived from a tenant record. Everything here is pure; the
//! callers decide where the output lands.

use std::collections::BTreeMap;

use rand::RngCore;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::models::{PlatformConfig, ProcessDescriptor, ProxyRoute, SitePaths, TenantRecord};

const SECRET_KEY: &str = "JWT_SECRET";

/// The signing secret for a site: the platform secret when configured,
/// otherwise whatever the site's current env file holds, otherwise fresh.
pub fn resolve_secret(config: &PlatformConfig, existing_env: Option<&str>) -> String {
    if let Some(secret) = config.signing_secret.as_deref().filter(|s| !s.is_empty()) {
        return secret.to_string();
    }
    existing_env
        .and_then(|env| env_value(env, SECRET_KEY))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_secret)
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Value of `key` in a `KEY=value` file.
pub fn env_value<'a>(env: &'a str, key: &str) -> Option<&'a str> {
    env.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Runtime environment of a site, in file order.
pub fn site_env(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
    secret: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("NUXT_SITE_ID", record.id.clone()),
        ("PORT", record.port.to_string()),
        ("NODE_ENV", config.node_env.clone()),
        ("NUXT_PUBLIC_SITE_URL", config.site_url(&record.id)),
        (SECRET_KEY, secret.to_string()),
        ("STORAGE_PATH", paths.storage_root.display().to_string()),
    ]
}

pub fn render_env(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
    secret: &str,
) -> String {
    let mut out = String::new();
    for (key, value) in site_env(config, record, paths, secret) {
        out.push_str(key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    out
}

pub fn process_descriptor(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
    secret: &str,
) -> ProcessDescriptor {
    let env: BTreeMap<String, String> = site_env(config, record, paths, secret)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ProcessDescriptor {
        name: record.process_name(),
        script: config.supervisor.script.clone(),
        cwd: paths.site_dir.clone(),
        env,
    }
}

/// `ecosystem.config.json`, loadable by `pm2 start`.
pub fn render_descriptor(descriptor: &ProcessDescriptor) -> Result<String> {
    let app = serde_json::to_value(descriptor)?;
    let mut out = serde_json::to_string_pretty(&json!({ "apps": [app] }))?;
    out.push('\n');
    Ok(out)
}

/// Merge the platform-owned keys into an existing `_config.json`, keeping
/// any keys the site added itself. Unparseable input is replaced.
pub fn render_tenant_config(
    existing: Option<&str>,
    config: &PlatformConfig,
    record: &TenantRecord,
) -> Result<String> {
    let mut object = match existing.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Object(map))) => map,
        Some(_) => {
            tracing::warn!(site = %record.id, "tenant_config_unreadable_replacing");
            Map::new()
        }
        None => Map::new(),
    };
    object.insert("url".into(), Value::String(config.site_url(&record.id)));
    object.insert("port".into(), Value::String(record.port.to_string()));
    object.insert("name".into(), Value::String(record.id.clone()));
    object.insert("dominio".into(), Value::String(config.site_domain(&record.id)));
    let mut out = serde_json::to_string_pretty(&Value::Object(object))?;
    out.push('\n');
    Ok(out)
}

/// The post-receive hook. Only a push to the deploy branch triggers a deploy;
/// the actual work happens in the orchestrator under the site lock.
pub fn render_hook(config: &PlatformConfig, record: &TenantRecord) -> String {
    let mut out = String::from("#!/bin/sh\n");
    out.push_str(&format!(
        "# Deploy hook for site '{}' on port {}. Generated by sitefleet; regenerated on rename.\n",
        record.id, record.port
    ));
    if !config.deploy.path.is_empty() {
        out.push_str(&format!(
            "export PATH={}:\"$PATH\"\n",
            sh_quote(&config.deploy.path.join(":"))
        ));
    }
    out.push_str("unset GIT_DIR\n\n");

    let mut command = vec![sh_quote(&config.orchestrator_bin().display().to_string())];
    if let Some(ref cfg) = config.source_path {
        command.push("--config".into());
        command.push(sh_quote(&cfg.display().to_string()));
    }
    command.push("deploy".into());
    command.push(sh_quote(&record.id));
    command.push("--port".into());
    command.push(record.port.to_string());

    out.push_str("while read -r oldrev newrev refname; do\n");
    out.push_str(&format!(
        "    if [ \"$refname\" = {} ]; then\n",
        sh_quote(&format!("refs/heads/{}", config.deploy.branch))
    ));
    out.push_str(&format!("        exec {}\n", command.join(" ")));
    out.push_str("    fi\n");
    out.push_str("done\n");
    out.push_str("exit 0\n");
    out
}

pub fn proxy_route(config: &PlatformConfig, record: &TenantRecord, paths: &SitePaths) -> ProxyRoute {
    ProxyRoute {
        site_id: record.id.clone(),
        domain: config.site_domain(&record.id),
        port: record.port,
        log_path: paths.access_log.clone(),
    }
}

/// A self-contained Caddy site block.
pub fn render_proxy_fragment(route: &ProxyRoute, import: Option<&str>) -> String {
    let mut out = format!("# sitefleet: {}\n", route.site_id);
    out.push_str(&format!("{0}, www.{0} {{\n", route.domain));
    if let Some(snippet) = import {
        out.push_str(&format!("\timport {snippet}\n"));
    }
    out.push_str(&format!("\treverse_proxy localhost:{}\n", route.port));
    out.push_str("\tlog {\n");
    out.push_str(&format!("\t\toutput file {}\n", route.log_path.display()));
    out.push_str("\t}\n");
    out.push_str("}\n");
    out
}

/// Single-quote for POSIX sh.
pub fn sh_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlatformLayout;
    use std::path::PathBuf;

    fn setup() -> (PlatformConfig, TenantRecord, SitePaths) {
        let mut config = PlatformConfig::with_root("/srv/apps", "example.test");
        config.deploy.orchestrator_bin = Some(PathBuf::from("/usr/local/bin/sitefleet"));
        let record = TenantRecord::new(
            "client-a".into(),
            4006,
            config.site_url("client-a"),
            "/srv/apps/repos/client-a.git".into(),
        );
        let paths = PlatformLayout::new(&config).site("client-a");
        (config, record, paths)
    }

    #[test]
    fn env_lists_runtime_keys() {
        let (config, record, paths) = setup();
        let env = render_env(&config, &record, &paths, "abc");
        assert!(env.contains("NUXT_SITE_ID=client-a\n"));
        assert!(env.contains("PORT=4006\n"));
        assert!(env.contains("NODE_ENV=production\n"));
        assert!(env.contains("NUXT_PUBLIC_SITE_URL=https://client-a.example.test\n"));
        assert!(env.contains("JWT_SECRET=abc\n"));
        assert!(env.contains("STORAGE_PATH=/srv/apps/storage/client-a\n"));
    }

    #[test]
    fn secret_prefers_config_then_existing_then_random() {
        let (mut config, _, _) = setup();
        let existing = "PORT=1\nJWT_SECRET=kept\n";
        assert_eq!(resolve_secret(&config, Some(existing)), "kept");

        let fresh = resolve_secret(&config, None);
        assert_eq!(fresh.len(), 64);
        assert_ne!(fresh, resolve_secret(&config, None));

        config.signing_secret = Some("platform".into());
        assert_eq!(resolve_secret(&config, Some(existing)), "platform");
    }

    #[test]
    fn descriptor_wraps_single_app() {
        let (config, record, paths) = setup();
        let descriptor = process_descriptor(&config, &record, &paths, "abc");
        assert_eq!(descriptor.name, "client-a:4006");
        let json: Value = serde_json::from_str(&render_descriptor(&descriptor).unwrap()).unwrap();
        assert_eq!(json["apps"][0]["name"], "client-a:4006");
        assert_eq!(json["apps"][0]["cwd"], "/srv/apps/sites/client-a");
        assert_eq!(json["apps"][0]["env"]["PORT"], "4006");
    }

    #[test]
    fn tenant_config_preserves_foreign_keys() {
        let (config, record, _) = setup();
        let existing = r#"{"theme":"dark","port":"1234","name":"old"}"#;
        let json: Value =
            serde_json::from_str(&render_tenant_config(Some(existing), &config, &record).unwrap())
                .unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["port"], "4006");
        assert_eq!(json["name"], "client-a");
        assert_eq!(json["dominio"], "client-a.example.test");
        assert_eq!(json["url"], "https://client-a.example.test");
    }

    #[test]
    fn tenant_config_replaces_garbage() {
        let (config, record, _) = setup();
        let out = render_tenant_config(Some("[1,2"), &config, &record).unwrap();
        let json: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["port"], "4006");
    }

    #[test]
    fn hook_only_deploys_main() {
        let (mut config, record, _) = setup();
        config.source_path = Some(PathBuf::from("/srv/apps/sitefleet.yaml"));
        config.deploy.path = vec!["/opt/node/bin".into()];
        let hook = render_hook(&config, &record);
        assert!(hook.starts_with("#!/bin/sh\n"));
        assert!(hook.contains("export PATH='/opt/node/bin':\"$PATH\""));
        assert!(hook.contains("if [ \"$refname\" = 'refs/heads/main' ]; then"));
        assert!(hook.contains(
            "exec '/usr/local/bin/sitefleet' --config '/srv/apps/sitefleet.yaml' deploy 'client-a' --port 4006"
        ));
    }

    #[test]
    fn proxy_fragment_routes_domain_and_www() {
        let (config, record, paths) = setup();
        let route = proxy_route(&config, &record, &paths);
        let fragment = render_proxy_fragment(&route, Some("sirius_rules"));
        assert!(fragment.contains("client-a.example.test, www.client-a.example.test {"));
        assert!(fragment.contains("\timport sirius_rules\n"));
        assert!(fragment.contains("reverse_proxy localhost:4006"));
        assert!(fragment.contains("output file /var/log/caddy/client_a.log"));
        assert!(!render_proxy_fragment(&route, None).contains("import"));
    }

    #[test]
    fn sh_quote_escapes_single_quotes() {
        assert_eq!(sh_quote("it's"), r"'it'\''s'");
    }
}
