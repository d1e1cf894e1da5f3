use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{FleetError, Result};
use crate::models::{ProcessDescriptor, ProcessInfo, ProcessState};

use super::command::{CommandOutput, CommandRunner, CommandSpec};

/// Keeps one long-running process per active site.
#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn start(&self, descriptor: &ProcessDescriptor) -> Result<()>;

    /// Zero-downtime restart of a known process.
    async fn reload(&self, name: &str) -> Result<()>;

    /// Succeeds when the process is unknown.
    async fn stop(&self, name: &str) -> Result<()>;

    /// Succeeds when the process is unknown.
    async fn remove(&self, name: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<ProcessInfo>>;

    async fn reload_or_start(&self, descriptor: &ProcessDescriptor) -> Result<()> {
        match self.reload(&descriptor.name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(process = %descriptor.name, error = %e, "reload_failed_starting");
                self.start(descriptor).await
            }
        }
    }
}

/// Drives the pm2 CLI.
pub struct Pm2Supervisor {
    runner: Arc<dyn CommandRunner>,
    program: String,
    persist: bool,
}

impl Pm2Supervisor {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>, persist: bool) -> Self {
        Self {
            runner,
            program: program.into(),
            persist,
        }
    }

    fn pm2(&self) -> CommandSpec {
        CommandSpec::new(self.program.clone())
    }

    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        self.runner
            .run(&spec)
            .await
            .map_err(|e| FleetError::Supervisor(e.to_string()))
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let output = self.run(spec.clone()).await?;
        if output.success() {
            return Ok(output);
        }
        Err(FleetError::Supervisor(format!(
            "{} failed (exit {}): {}",
            spec.display(),
            output.code.unwrap_or(-1),
            output.stderr
        )))
    }

    /// `pm2 save`, so the process list survives a reboot. Never fatal.
    async fn save(&self) {
        if !self.persist {
            return;
        }
        if let Err(e) = self.run_checked(self.pm2().arg("save")).await {
            tracing::warn!(error = %e, "pm2_save_failed");
        }
    }

    /// Run a per-process command, treating "not found" as success.
    async fn run_tolerant(&self, action: &str, name: &str) -> Result<()> {
        let spec = self.pm2().arg(action).arg(name);
        let output = self.run(spec.clone()).await?;
        if output.success() {
            return Ok(());
        }
        if is_missing_process(&output) {
            tracing::debug!(process = name, action, "process_not_found");
            return Ok(());
        }
        Err(FleetError::Supervisor(format!(
            "{} failed (exit {}): {}",
            spec.display(),
            output.code.unwrap_or(-1),
            output.stderr
        )))
    }
}

/// pm2 answers `Process or Namespace <name> not found` for unknown names.
/// Exit 126/127 is the shell failing to run pm2 at all.
fn is_missing_process(output: &CommandOutput) -> bool {
    if matches!(output.code, None | Some(126) | Some(127)) {
        return false;
    }
    let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
    text.contains("process or namespace") && text.contains("not found")
}

#[async_trait]
impl Supervisor for Pm2Supervisor {
    async fn start(&self, descriptor: &ProcessDescriptor) -> Result<()> {
        let mut spec = self
            .pm2()
            .arg("start")
            .arg(descriptor.script.clone())
            .arg("--name")
            .arg(descriptor.name.clone())
            .arg("--cwd")
            .path_arg(&descriptor.cwd)
            .arg("--update-env")
            .current_dir(&descriptor.cwd);
        for (key, value) in &descriptor.env {
            spec = spec.env(key.clone(), value.clone());
        }
        self.run_checked(spec).await?;
        tracing::info!(process = %descriptor.name, "process_started");
        self.save().await;
        Ok(())
    }

    async fn reload(&self, name: &str) -> Result<()> {
        self.run_checked(self.pm2().arg("reload").arg(name)).await?;
        tracing::info!(process = name, "process_reloaded");
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.run_tolerant("stop", name).await?;
        self.save().await;
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.run_tolerant("delete", name).await?;
        self.save().await;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProcessInfo>> {
        let output = self.run_checked(self.pm2().arg("jlist")).await?;
        parse_jlist(&output.stdout)
    }
}

/// Parse `pm2 jlist`. pm2 sometimes prints banners before the JSON array.
pub fn parse_jlist(raw: &str) -> Result<Vec<ProcessInfo>> {
    let start = raw
        .find('[')
        .ok_or_else(|| FleetError::Supervisor("pm2 jlist returned no process list".into()))?;
    let value: Value = serde_json::from_str(&raw[start..])
        .map_err(|e| FleetError::Supervisor(format!("unreadable pm2 jlist output: {e}")))?;
    let entries = value.as_array().cloned().unwrap_or_default();
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?.to_string();
            let status = entry
                .pointer("/pm2_env/status")
                .and_then(Value::as_str)
                .map_or(ProcessState::Unknown, ProcessState::parse);
            Some(ProcessInfo { name, status })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::RecordingRunner;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn descriptor() -> ProcessDescriptor {
        let mut env = BTreeMap::new();
        env.insert("PORT".to_string(), "4006".to_string());
        ProcessDescriptor {
            name: "client-a:4006".into(),
            script: "./.output/server/index.mjs".into(),
            cwd: PathBuf::from("/srv/apps/sites/client-a"),
            env,
        }
    }

    #[test]
    fn parses_jlist_with_banner() {
        let raw = r#">>>> In-memory PM2 is out-of-date
[{"name":"client-a:4006","pm2_env":{"status":"online"}},{"name":"b:4007","pm2_env":{"status":"stopped"}},{"pm2_env":{}}]"#;
        let list = parse_jlist(raw).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].status, ProcessState::Online);
        assert_eq!(list[1].status, ProcessState::Stopped);
    }

    #[tokio::test]
    async fn start_passes_env_and_saves() {
        let runner = Arc::new(RecordingRunner::new());
        let pm2 = Pm2Supervisor::new(runner.clone(), "pm2", true);
        pm2.start(&descriptor()).await.unwrap();
        let calls = runner.calls();
        assert_eq!(
            calls[0].display(),
            "pm2 start ./.output/server/index.mjs --name client-a:4006 --cwd /srv/apps/sites/client-a --update-env"
        );
        assert!(calls[0].env.contains(&("PORT".to_string(), "4006".to_string())));
        assert_eq!(calls[1].display(), "pm2 save");
    }

    #[tokio::test]
    async fn stopping_unknown_process_succeeds() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(
            "pm2 stop",
            CommandOutput::failed(1, "[PM2][ERROR] Process or Namespace ghost:1 not found"),
        );
        let pm2 = Pm2Supervisor::new(runner.clone(), "pm2", false);
        pm2.stop("ghost:1").await.unwrap();
        assert_eq!(runner.displays(), vec!["pm2 stop ghost:1"]);
    }

    #[tokio::test]
    async fn missing_pm2_binary_fails_stop_and_remove() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("pm2 stop", CommandOutput::failed(127, "sh: pm2: command not found"));
        runner.respond("pm2 delete", CommandOutput::failed(127, "sh: pm2: command not found"));
        let pm2 = Pm2Supervisor::new(runner, "pm2", false);
        assert!(matches!(pm2.stop("client-a:4006").await, Err(FleetError::Supervisor(_))));
        assert!(matches!(pm2.remove("client-a:4006").await, Err(FleetError::Supervisor(_))));
    }

    #[tokio::test]
    async fn unrelated_not_found_output_is_an_error() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("pm2 delete", CommandOutput::failed(1, "Error: module not found"));
        let pm2 = Pm2Supervisor::new(runner, "pm2", false);
        assert!(pm2.remove("client-a:4006").await.is_err());
    }

    #[tokio::test]
    async fn reload_or_start_falls_back_to_start() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("pm2 reload", CommandOutput::failed(1, "process not found"));
        let pm2 = Pm2Supervisor::new(runner.clone(), "pm2", false);
        pm2.reload_or_start(&descriptor()).await.unwrap();
        let calls = runner.displays();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].starts_with("pm2 start"));
    }

    #[tokio::test]
    async fn unreachable_pm2_is_a_supervisor_error() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond("jlist", CommandOutput::failed(127, "pm2: command not found"));
        let pm2 = Pm2Supervisor::new(runner, "pm2", false);
        assert!(matches!(pm2.list().await, Err(FleetError::Supervisor(_))));
    }
}
