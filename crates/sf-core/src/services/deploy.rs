use serde::Serialize;

use crate::error::{FleetError, Result};
use crate::models::{PlatformConfig, SitePaths, TenantRecord, TopologyReport};

use super::command::{CommandRunner, CommandSpec};
use super::supervisor::Supervisor;
use super::{git, render, scaffold, topology};

/// How far a deploy got. Each stage gates the next.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DeployStage {
    Received,
    CheckedOut,
    Relinked,
    Installed,
    Built,
    Reloaded,
    /// Install or build failed; the running process was left alone.
    FailedKeepOld,
}

impl std::fmt::Display for DeployStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeployStage::Received => "received",
            DeployStage::CheckedOut => "checked-out",
            DeployStage::Relinked => "relinked",
            DeployStage::Installed => "installed",
            DeployStage::Built => "built",
            DeployStage::Reloaded => "reloaded",
            DeployStage::FailedKeepOld => "failed-keep-old",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeployOptions {
    /// Force the working tree to the branch tip first. Off when the tree was
    /// just scaffolded.
    pub checkout: bool,
    /// Stream install/build output instead of capturing it.
    pub inherit_output: bool,
    /// Reload or start the process after a good build. Off for paused sites.
    pub activate: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            checkout: true,
            inherit_output: false,
            activate: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub site: String,
    pub stage: DeployStage,
    pub failure: Option<String>,
    pub topology: TopologyReport,
}

impl DeployReport {
    pub fn succeeded(&self) -> bool {
        self.stage != DeployStage::FailedKeepOld
    }
}

/// checkout → relink → install → build → reload-or-start.
pub struct DeployPipeline<'a> {
    config: &'a PlatformConfig,
    runner: &'a dyn CommandRunner,
    supervisor: &'a dyn Supervisor,
}

impl<'a> DeployPipeline<'a> {
    pub fn new(
        config: &'a PlatformConfig,
        runner: &'a dyn CommandRunner,
        supervisor: &'a dyn Supervisor,
    ) -> Self {
        Self {
            config,
            runner,
            supervisor,
        }
    }

    /// Caller must hold the site lock. Install/build failures come back as an
    /// `Ok` report with `FailedKeepOld`; everything else is an error.
    pub async fn run(
        &self,
        record: &TenantRecord,
        paths: &SitePaths,
        options: DeployOptions,
    ) -> Result<DeployReport> {
        let site = record.id.as_str();
        tracing::info!(site, port = record.port, "deploy_received");

        if options.checkout {
            git::checkout(self.runner, paths, &self.config.deploy.branch)
                .await
                .map_err(|e| stage_error(site, DeployStage::Received, e))?;
            tracing::info!(site, "deploy_checked_out");
        }

        let links = topology::canonical_links(self.config, paths);
        let topology = topology::build(&paths.site_dir, &links)
            .map_err(|e| stage_error(site, DeployStage::CheckedOut, e))?;
        // A checkout can bring back runtime files committed under an older id
        // or port.
        let secret = scaffold::write_runtime_files(self.config, record, paths)
            .map_err(|e| stage_error(site, DeployStage::CheckedOut, e))?;
        tracing::info!(site, created = topology.created(), "deploy_relinked");

        let mut report = DeployReport {
            site: site.to_string(),
            stage: DeployStage::Relinked,
            failure: None,
            topology,
        };

        for (argv, reached) in [
            (&self.config.deploy.install, DeployStage::Installed),
            (&self.config.deploy.build, DeployStage::Built),
        ] {
            if let Err(e) = self.run_step(argv, paths, options).await {
                tracing::error!(site, stage = %reached, error = %e, "deploy_failed_keeping_old");
                report.failure = Some(e.to_string());
                report.stage = DeployStage::FailedKeepOld;
                return Ok(report);
            }
            report.stage = reached;
            tracing::info!(site, stage = %reached, "deploy_stage");
        }

        if !options.activate {
            tracing::info!(site, "deploy_built_not_activated");
            return Ok(report);
        }

        let descriptor = render::process_descriptor(self.config, record, paths, &secret);
        self.supervisor
            .reload_or_start(&descriptor)
            .await
            .map_err(|e| stage_error(site, DeployStage::Built, e))?;
        report.stage = DeployStage::Reloaded;
        tracing::info!(site, process = %descriptor.name, "deploy_reloaded");
        Ok(report)
    }

    async fn run_step(
        &self,
        argv: &[String],
        paths: &SitePaths,
        options: DeployOptions,
    ) -> Result<()> {
        let spec = CommandSpec::from_argv(argv)?
            .current_dir(&paths.site_dir)
            .inherit_output(options.inherit_output);
        self.runner.run_checked(&spec).await?;
        Ok(())
    }
}

fn stage_error(site: &str, last_good: DeployStage, source: FleetError) -> FleetError {
    FleetError::Deploy {
        site: site.to_string(),
        stage: last_good.to_string(),
        detail: source.to_string(),
    }
}
