use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{FleetError, Result};

/// A command to run: program plus argv, never a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Stream stdout/stderr to the parent instead of capturing them.
    pub inherit_output: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            inherit_output: false,
        }
    }

    /// Build from an argv vector such as `["pnpm", "run", "build"]`.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| FleetError::InvalidConfig("empty command".into()))?;
        Ok(Self::new(program.clone()).args(rest.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().to_string())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Human-readable form for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into `FleetError::Command`.
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(FleetError::Command {
            command: spec.display(),
            code: self
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: self.stderr.trim().to_string(),
        })
    }
}

/// Executes external tools. `Err` only when the process could not be
/// spawned; a non-zero exit is reported through `CommandOutput`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec).await?.check(spec)
    }
}

/// Runs commands on the host with `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!(command = %spec.display(), cwd = ?spec.cwd, "run_command");
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());

        if spec.inherit_output {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
            let status = cmd.status().await.map_err(|e| FleetError::Spawn {
                command: spec.display(),
                source: e,
            })?;
            return Ok(CommandOutput {
                code: status.code(),
                ..Default::default()
            });
        }

        let output = cmd.output().await.map_err(|e| FleetError::Spawn {
            command: spec.display(),
            source: e,
        })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program() {
        let argv = vec!["pnpm".to_string(), "run".into(), "build".into()];
        let spec = CommandSpec::from_argv(&argv).unwrap();
        assert_eq!(spec.program, "pnpm");
        assert_eq!(spec.args, vec!["run", "build"]);
        assert_eq!(spec.display(), "pnpm run build");
    }

    #[test]
    fn from_argv_rejects_empty() {
        assert!(matches!(
            CommandSpec::from_argv(&[]),
            Err(FleetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn check_maps_failure_to_command_error() {
        let spec = CommandSpec::new("false");
        let err = CommandOutput::failed(2, "nope\n").check(&spec).unwrap_err();
        match err {
            FleetError::Command { code, stderr, .. } => {
                assert_eq!(code, "2");
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_output() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&spec).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
    }

    #[tokio::test]
    async fn system_runner_reports_spawn_failure() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-sitefleet");
        assert!(matches!(
            SystemRunner.run(&spec).await,
            Err(FleetError::Spawn { .. })
        ));
    }
}
