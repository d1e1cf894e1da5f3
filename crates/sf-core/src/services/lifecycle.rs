use std::future::Future;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{FleetError, Result};
use crate::models::{
    JournalEntry, Operation, PlatformConfig, PlatformLayout, ProcessDescriptor, ProcessInfo,
    SiteListing, SitePaths, SiteStatus, TenantRecord, TopologyReport,
};

use super::command::{CommandRunner, SystemRunner};
use super::deploy::{DeployOptions, DeployPipeline, DeployReport};
use super::journal::JournalStore;
use super::lock::SiteLocks;
use super::manifest::{ManifestGuard, ManifestStore};
use super::ports::allocate_port;
use super::proxy::ProxyRegistrar;
use super::supervisor::{Pm2Supervisor, Supervisor};
use super::{git, render, scaffold, topology};

/// Longest accepted site id; ids become DNS labels.
pub const MAX_ID_LEN: usize = 63;

static INVALID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s_-]+").unwrap());

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").unwrap());

/// Turn a free-form name into a site id: lowercase ASCII letters, digits and
/// single dashes.
pub fn slugify(name: &str) -> Result<String> {
    let lowered = name.to_lowercase();
    let cleaned = INVALID_RE.replace_all(&lowered, "");
    let slug = SEPARATOR_RE
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string();
    if slug.is_empty() {
        return Err(FleetError::InvalidName(
            name.to_string(),
            "must contain at least one letter or digit".into(),
        ));
    }
    if slug.len() > MAX_ID_LEN {
        return Err(FleetError::InvalidName(
            name.to_string(),
            format!("longer than {MAX_ID_LEN} characters"),
        ));
    }
    Ok(slug)
}

/// Accept only ids already in slug form. Ids become path components under
/// the apps root, so `""`, `..` and anything with a separator are refused.
pub fn validate_id(id: &str) -> Result<()> {
    match slugify(id) {
        Ok(slug) if slug == id => Ok(()),
        _ => Err(FleetError::InvalidName(
            id.to_string(),
            "not a site id (lowercase letters, digits and dashes)".into(),
        )),
    }
}

/// What `repair` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    Restored(TenantRecord),
    Deleted(String),
}

/// Coordinates every lifecycle operation. Holds no cached state: each call
/// re-reads the manifest under the appropriate locks.
pub struct SiteManager {
    config: PlatformConfig,
    layout: PlatformLayout,
    manifest: ManifestStore,
    journal: JournalStore,
    runner: Arc<dyn CommandRunner>,
    supervisor: Arc<dyn Supervisor>,
    proxy: ProxyRegistrar,
    stream_output: bool,
}

impl SiteManager {
    /// Manager wired to the host: real commands and pm2.
    pub fn new(config: PlatformConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let supervisor = Arc::new(Pm2Supervisor::new(
            runner.clone(),
            config.supervisor.program.clone(),
            config.supervisor.persist,
        ));
        Self::with_tools(config, runner, supervisor)
    }

    pub fn with_tools(
        config: PlatformConfig,
        runner: Arc<dyn CommandRunner>,
        supervisor: Arc<dyn Supervisor>,
    ) -> Self {
        let layout = PlatformLayout::new(&config);
        let manifest = ManifestStore::new(
            config.manifest_path(),
            layout.manifest_lock(),
            config.port_floor,
        );
        let journal = JournalStore::new(layout.journal_dir());
        let proxy = ProxyRegistrar::new(runner.clone(), &config, layout.clone());
        Self {
            config,
            layout,
            manifest,
            journal,
            runner,
            supervisor,
            proxy,
            stream_output: false,
        }
    }

    /// Stream install/build output to the terminal instead of capturing it.
    pub fn with_streamed_output(mut self, stream: bool) -> Self {
        self.stream_output = stream;
        self
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn paths(&self, id: &str) -> SitePaths {
        self.layout.site(id)
    }

    /// Look up one record without locking.
    pub async fn get(&self, id: &str) -> Result<TenantRecord> {
        validate_id(id)?;
        self.manifest
            .load()
            .await?
            .find(id)
            .cloned()
            .ok_or_else(|| FleetError::SiteNotFound(id.to_string()))
    }

    /// Every site with live process info. Interrupted creates show up too so
    /// they can be repaired.
    pub async fn list(&self) -> Result<Vec<SiteListing>> {
        let manifest = self.manifest.load().await?;
        let (processes, reachable) = match self.supervisor.list().await {
            Ok(processes) => (processes, true),
            Err(e) => {
                tracing::warn!(error = %e, "supervisor_unreachable");
                (Vec::new(), false)
            }
        };
        let pending = self.journal.list().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "journal_unreadable");
            Vec::new()
        });

        let mut rows: Vec<SiteListing> = manifest
            .sites
            .iter()
            .map(|record| self.listing(record.clone(), &processes, reachable, &pending))
            .collect();
        for entry in &pending {
            if entry.operation == Operation::Create && !manifest.contains(entry.site()) {
                rows.push(self.listing(entry.target.clone(), &processes, reachable, &pending));
            }
        }
        Ok(rows)
    }

    fn listing(
        &self,
        record: TenantRecord,
        processes: &[ProcessInfo],
        reachable: bool,
        pending: &[JournalEntry],
    ) -> SiteListing {
        let name = record.process_name();
        let id = record.id.as_str();
        SiteListing {
            url: record
                .url
                .clone()
                .unwrap_or_else(|| self.config.site_url(id)),
            process: processes.iter().find(|p| p.name == name).cloned(),
            supervisor_reachable: reachable,
            pending: pending
                .iter()
                .find(|e| e.site() == id || e.previous.as_ref().is_some_and(|p| p.id == id))
                .map(|e| e.operation),
            record,
        }
    }

    pub async fn create(&self, name: &str) -> Result<TenantRecord> {
        let id = slugify(name)?;
        let locks = SiteLocks::acquire(&self.layout, &[id.as_str()]).await?;
        // The manifest stays locked until the record is appended so no other
        // create can be handed the same port.
        let mut guard = self.manifest.lock().await?;
        let paths = self.layout.site(&id);

        if let Some(entry) = self.journal.load(&id).await? {
            return Err(FleetError::Journal(format!(
                "site '{id}' has an interrupted {}; run repair first",
                entry.operation
            )));
        }
        if guard.manifest().contains(&id) || paths.directories().iter().any(|d| d.exists()) {
            return Err(FleetError::SiteAlreadyExists(id));
        }

        let port = self.next_port(&guard).await.map_err(|e| e.in_step("port"))?;
        let record = TenantRecord::new(
            id.clone(),
            port,
            self.config.site_url(&id),
            paths.repo_dir.display().to_string(),
        );
        tracing::info!(site = %id, port, "create_started");

        let mut entry = self
            .journal
            .begin(Operation::Create, record.clone(), None)
            .await?;
        self.provision(&mut entry, &paths, true, true).await?;
        self.step(&mut entry, "manifest", async {
            guard.manifest_mut().push(record.clone());
            guard.commit().await
        })
        .await?;
        self.journal.clear(&id).await?;
        drop(guard);
        drop(locks);

        tracing::info!(site = %id, port, "create_completed");
        Ok(record)
    }

    /// `allocate_port` also skipping ports claimed by interrupted creates.
    async fn next_port(&self, guard: &ManifestGuard) -> Result<u16> {
        let mut port = allocate_port(guard.manifest(), self.config.port_floor)?;
        let reserved: Vec<u16> = self
            .journal
            .list()
            .await?
            .iter()
            .map(|e| e.target.port)
            .collect();
        while reserved.contains(&port) {
            port = port.checked_add(1).ok_or_else(|| {
                FleetError::PortAllocation("ports exhausted by pending operations".into())
            })?;
        }
        Ok(port)
    }

    /// The idempotent create steps, shared with repair.
    async fn provision(
        &self,
        entry: &mut JournalEntry,
        paths: &SitePaths,
        copy_site: bool,
        deploy: bool,
    ) -> Result<()> {
        let record = entry.target.clone();
        let config = &self.config;

        self.step(entry, "storage", async {
            scaffold::materialize_storage(config, paths)
        })
        .await?;
        self.step(entry, "tenant-config", async {
            scaffold::write_tenant_config(config, &record, paths)
        })
        .await?;
        if copy_site {
            self.step(entry, "site", async { scaffold::materialize_site(config, paths) })
                .await?;
        }
        self.step(entry, "topology", async {
            topology::build(&paths.site_dir, &topology::canonical_links(config, paths))
        })
        .await?;
        self.step(entry, "runtime-files", async {
            scaffold::write_runtime_files(config, &record, paths)
        })
        .await?;
        self.step(
            entry,
            "repository",
            git::init_bare(self.runner.as_ref(), &paths.repo_dir, &config.deploy.branch),
        )
        .await?;
        self.step(entry, "hook", git::install_hook(config, &record, paths))
            .await?;
        self.step(
            entry,
            "seed",
            git::seed_initial_commit(self.runner.as_ref(), config, paths, &record.id),
        )
        .await?;

        if deploy {
            let options = DeployOptions {
                checkout: false,
                inherit_output: self.stream_output,
                activate: !record.is_paused(),
            };
            self.step(entry, "deploy", async {
                let report = self.pipeline().run(&record, paths, options).await?;
                match report.failure {
                    Some(detail) => Err(FleetError::Deploy {
                        site: record.id.clone(),
                        stage: report.stage.to_string(),
                        detail,
                    }),
                    None => Ok(()),
                }
            })
            .await?;
        } else if !record.is_paused() {
            self.step(entry, "start", async {
                let descriptor = self.descriptor(&record, paths)?;
                self.supervisor.reload_or_start(&descriptor).await
            })
            .await?;
        }

        self.step(entry, "proxy", async {
            let route = render::proxy_route(config, &record, paths);
            self.proxy.write_route(&route).await?;
            self.proxy.reload().await;
            Ok(())
        })
        .await
    }

    pub async fn rename(&self, old_id: &str, new_name: &str) -> Result<TenantRecord> {
        validate_id(old_id)?;
        let new_id = slugify(new_name)?;
        if new_id == old_id {
            return Err(FleetError::InvalidName(
                new_name.to_string(),
                "matches the current name".into(),
            ));
        }
        let locks = SiteLocks::acquire(&self.layout, &[old_id, new_id.as_str()]).await?;
        let mut guard = self.manifest.lock().await?;

        let previous = guard
            .manifest()
            .find(old_id)
            .cloned()
            .ok_or_else(|| FleetError::SiteNotFound(old_id.to_string()))?;
        for id in [old_id, new_id.as_str()] {
            if let Some(entry) = self.journal.find(id).await? {
                return Err(FleetError::Journal(format!(
                    "site '{id}' has an interrupted {}; run repair first",
                    entry.operation
                )));
            }
        }
        let new_paths = self.layout.site(&new_id);
        if guard.manifest().contains(&new_id)
            || new_paths.directories().iter().any(|d| d.exists())
        {
            return Err(FleetError::SiteAlreadyExists(new_id));
        }

        let mut target = previous.clone();
        target.id = new_id.clone();
        target.url = Some(self.config.site_url(&new_id));
        target.repo = new_paths.repo_dir.display().to_string();
        tracing::info!(from = old_id, to = %new_id, port = target.port, "rename_started");

        let mut entry = self
            .journal
            .begin(Operation::Rename, target, Some(previous))
            .await?;
        let renamed = self.drive_rename(&mut entry, &mut guard).await?;
        drop(guard);
        locks.release_removing(&[old_id]);

        tracing::info!(from = old_id, to = %new_id, "rename_completed");
        Ok(renamed)
    }

    async fn drive_rename(
        &self,
        entry: &mut JournalEntry,
        guard: &mut ManifestGuard,
    ) -> Result<TenantRecord> {
        let target = entry.target.clone();
        let previous = entry
            .previous
            .clone()
            .ok_or_else(|| FleetError::Journal("rename entry without previous record".into()))?;
        let old_paths = self.layout.site(&previous.id);
        let new_paths = self.layout.site(&target.id);
        let config = &self.config;

        if !entry.has_completed("stop") {
            self.step(entry, "stop", async {
                let name = previous.process_name();
                self.supervisor.stop(&name).await?;
                self.supervisor.remove(&name).await
            })
            .await?;
        }
        self.step(entry, "move", async {
            for (from, to) in old_paths
                .directories()
                .into_iter()
                .zip(new_paths.directories())
            {
                move_directory(from, to).await?;
            }
            Ok(())
        })
        .await?;
        self.step(entry, "tenant-config", async {
            scaffold::write_tenant_config(config, &target, &new_paths)
        })
        .await?;
        self.step(entry, "topology", async {
            topology::build(
                &new_paths.site_dir,
                &topology::canonical_links(config, &new_paths),
            )
        })
        .await?;
        self.step(entry, "runtime-files", async {
            scaffold::write_runtime_files(config, &target, &new_paths)
        })
        .await?;
        self.step(entry, "hook", git::install_hook(config, &target, &new_paths))
            .await?;
        self.step(entry, "proxy", async {
            self.proxy.remove_route(&previous.id).await?;
            self.proxy
                .write_route(&render::proxy_route(config, &target, &new_paths))
                .await?;
            self.proxy.reload().await;
            Ok(())
        })
        .await?;
        self.step(entry, "manifest", async {
            let manifest = guard.manifest_mut();
            manifest.remove(&previous.id);
            manifest.upsert(target.clone());
            guard.commit().await
        })
        .await?;
        if !target.is_paused() {
            self.step(entry, "start", async {
                let descriptor = self.descriptor(&target, &new_paths)?;
                self.supervisor.reload_or_start(&descriptor).await
            })
            .await?;
        }
        self.journal.clear(&target.id).await?;
        Ok(target)
    }

    pub async fn pause(&self, id: &str) -> Result<TenantRecord> {
        validate_id(id)?;
        let _locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        let mut guard = self.manifest.lock().await?;
        let record = guard
            .manifest_mut()
            .find_mut(id)
            .ok_or_else(|| FleetError::SiteNotFound(id.to_string()))?;
        self.supervisor
            .stop(&record.process_name())
            .await
            .map_err(|e| e.in_step("stop"))?;
        record.status = SiteStatus::Paused;
        let record = record.clone();
        guard.commit().await.map_err(|e| e.in_step("manifest"))?;
        tracing::info!(site = id, "site_paused");
        Ok(record)
    }

    pub async fn resume(&self, id: &str) -> Result<TenantRecord> {
        validate_id(id)?;
        let _locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        let mut guard = self.manifest.lock().await?;
        let mut record = guard
            .manifest()
            .find(id)
            .cloned()
            .ok_or_else(|| FleetError::SiteNotFound(id.to_string()))?;
        let descriptor = self
            .descriptor(&record, &self.layout.site(id))
            .map_err(|e| e.in_step("start"))?;
        self.supervisor
            .reload_or_start(&descriptor)
            .await
            .map_err(|e| e.in_step("start"))?;
        record.status = SiteStatus::Active;
        guard.manifest_mut().upsert(record.clone());
        guard.commit().await.map_err(|e| e.in_step("manifest"))?;
        tracing::info!(site = id, "site_resumed");
        Ok(record)
    }

    /// Pause an active site or resume a paused one.
    pub async fn toggle(&self, id: &str) -> Result<TenantRecord> {
        if self.get(id).await?.is_paused() {
            self.resume(id).await
        } else {
            self.pause(id).await
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        let mut guard = self.manifest.lock().await?;
        let paths = self.layout.site(id);
        let record = guard.manifest().find(id).cloned();
        let pending = self.journal.load(id).await?;
        let any_dir = paths.directories().iter().any(|d| d.exists());

        if record.is_none() && !any_dir && pending.is_none() {
            return Err(FleetError::SiteNotFound(id.to_string()));
        }
        tracing::info!(site = id, "delete_started");

        let target = record
            .clone()
            .or_else(|| pending.map(|e| e.target))
            .unwrap_or_else(|| {
                TenantRecord::new(
                    id.to_string(),
                    0,
                    self.config.site_url(id),
                    paths.repo_dir.display().to_string(),
                )
            });
        let mut entry = self.journal.begin(Operation::Delete, target, None).await?;

        self.step(&mut entry, "process", async {
            let names = match record {
                Some(ref r) => vec![r.process_name()],
                None => self.processes_named(id).await,
            };
            for name in names {
                self.supervisor.stop(&name).await?;
                self.supervisor.remove(&name).await?;
            }
            Ok(())
        })
        .await?;
        self.step(&mut entry, "proxy", async {
            if self.proxy.remove_route(id).await? {
                self.proxy.reload().await;
            }
            Ok(())
        })
        .await?;
        self.step(&mut entry, "directories", async {
            for dir in paths.directories() {
                remove_dir_if_exists(dir).await?;
            }
            remove_file_if_exists(&paths.access_log).await
        })
        .await?;
        self.step(&mut entry, "manifest", async {
            if guard.manifest_mut().remove(id).is_some() {
                guard.commit().await?;
            }
            Ok(())
        })
        .await?;
        self.journal.clear(id).await?;
        drop(guard);
        locks.release_removing(&[id]);

        tracing::info!(site = id, "delete_completed");
        Ok(())
    }

    /// Supervisor entries for `id` under any port.
    async fn processes_named(&self, id: &str) -> Vec<String> {
        let prefix = format!("{id}:");
        match self.supervisor.list().await {
            Ok(list) => list
                .into_iter()
                .map(|p| p.name)
                .filter(|name| name.starts_with(&prefix))
                .collect(),
            Err(e) => {
                tracing::warn!(site = id, error = %e, "supervisor_list_failed");
                Vec::new()
            }
        }
    }

    pub async fn relink(&self, id: &str) -> Result<TopologyReport> {
        validate_id(id)?;
        let _locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        self.get(id).await?;
        let paths = self.layout.site(id);
        let report = topology::build(
            &paths.site_dir,
            &topology::canonical_links(&self.config, &paths),
        )?;
        tracing::info!(
            site = id,
            created = report.created(),
            unchanged = report.unchanged(),
            skipped = report.skipped(),
            "relinked"
        );
        Ok(report)
    }

    /// Entry point of the post-receive hook. The manifest record wins over
    /// the port baked into an older hook.
    pub async fn deploy(&self, id: &str, hook_port: Option<u16>) -> Result<DeployReport> {
        validate_id(id)?;
        let _locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        let record = self.get(id).await?;
        if let Some(port) = hook_port.filter(|p| *p != record.port) {
            tracing::warn!(site = id, hook_port = port, port = record.port, "hook_port_stale");
        }
        let options = DeployOptions {
            checkout: true,
            inherit_output: self.stream_output,
            activate: !record.is_paused(),
        };
        self.pipeline()
            .run(&record, &self.layout.site(id), options)
            .await
    }

    /// Finish an interrupted operation, or regenerate every artifact of a
    /// healthy site from its manifest record.
    pub async fn repair(&self, id: &str) -> Result<RepairOutcome> {
        validate_id(id)?;
        let Some(mut entry) = self.journal.find(id).await? else {
            return self.regenerate(id).await.map(RepairOutcome::Restored);
        };
        tracing::info!(site = id, operation = %entry.operation, last_step = ?entry.last_step(), "repair_started");

        match entry.operation {
            Operation::Delete => {
                let target = entry.site().to_string();
                self.delete(&target).await?;
                Ok(RepairOutcome::Deleted(target))
            }
            Operation::Create => {
                let target = entry.site().to_string();
                let _locks = SiteLocks::acquire(&self.layout, &[target.as_str()]).await?;
                let mut guard = self.manifest.lock().await?;
                let paths = self.layout.site(&target);
                let copy_site = !entry.has_completed("site");
                let deploy = !entry.has_completed("deploy");
                self.provision(&mut entry, &paths, copy_site, deploy).await?;
                let record = entry.target.clone();
                self.step(&mut entry, "manifest", async {
                    guard.manifest_mut().upsert(record.clone());
                    guard.commit().await
                })
                .await?;
                self.journal.clear(&target).await?;
                Ok(RepairOutcome::Restored(record))
            }
            Operation::Rename => {
                let previous = entry
                    .previous
                    .as_ref()
                    .map(|p| p.id.clone())
                    .ok_or_else(|| FleetError::Journal("rename entry without previous record".into()))?;
                let target = entry.site().to_string();
                let locks =
                    SiteLocks::acquire(&self.layout, &[previous.as_str(), target.as_str()])
                        .await?;
                let mut guard = self.manifest.lock().await?;
                let record = self.drive_rename(&mut entry, &mut guard).await?;
                drop(guard);
                locks.release_removing(&[previous.as_str()]);
                Ok(RepairOutcome::Restored(record))
            }
        }
    }

    async fn regenerate(&self, id: &str) -> Result<TenantRecord> {
        let _locks = SiteLocks::acquire(&self.layout, &[id]).await?;
        let record = self.get(id).await?;
        let paths = self.layout.site(id);
        let config = &self.config;

        scaffold::materialize_storage(config, &paths).map_err(|e| e.in_step("storage"))?;
        scaffold::write_tenant_config(config, &record, &paths)
            .map_err(|e| e.in_step("tenant-config"))?;
        topology::build(&paths.site_dir, &topology::canonical_links(config, &paths))
            .map_err(|e| e.in_step("topology"))?;
        scaffold::write_runtime_files(config, &record, &paths)
            .map_err(|e| e.in_step("runtime-files"))?;
        git::init_bare(self.runner.as_ref(), &paths.repo_dir, &config.deploy.branch)
            .await
            .map_err(|e| e.in_step("repository"))?;
        git::install_hook(config, &record, &paths)
            .await
            .map_err(|e| e.in_step("hook"))?;
        git::seed_initial_commit(self.runner.as_ref(), config, &paths, &record.id)
            .await
            .map_err(|e| e.in_step("seed"))?;
        self.proxy
            .write_route(&render::proxy_route(config, &record, &paths))
            .await
            .map_err(|e| e.in_step("proxy"))?;
        self.proxy.reload().await;
        if !record.is_paused() {
            let descriptor = self.descriptor(&record, &paths)?;
            self.supervisor
                .reload_or_start(&descriptor)
                .await
                .map_err(|e| e.in_step("start"))?;
        }
        tracing::info!(site = id, "repair_regenerated");
        Ok(record)
    }

    fn pipeline(&self) -> DeployPipeline<'_> {
        DeployPipeline::new(&self.config, self.runner.as_ref(), self.supervisor.as_ref())
    }

    /// Descriptor using the secret already in the site's env file.
    fn descriptor(&self, record: &TenantRecord, paths: &SitePaths) -> Result<ProcessDescriptor> {
        let existing = scaffold::read_optional(&paths.env_file())?;
        let secret = render::resolve_secret(&self.config, existing.as_deref());
        Ok(render::process_descriptor(&self.config, record, paths, &secret))
    }

    /// Run one journaled step. Errors are tagged with the step name.
    async fn step<T, F>(&self, entry: &mut JournalEntry, name: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tracing::info!(site = entry.site(), operation = %entry.operation, step = name, "step");
        let value = work.await.map_err(|e| {
            tracing::error!(site = entry.site(), step = name, error = %e, "step_failed");
            e.in_step(name)
        })?;
        self.journal
            .record(entry, name)
            .await
            .map_err(|e| e.in_step(name))?;
        Ok(value)
    }
}

/// Move `from` to `to` unless that already happened.
async fn move_directory(from: &Path, to: &Path) -> Result<()> {
    let from_exists = tokio::fs::symlink_metadata(from).await.is_ok();
    let to_exists = tokio::fs::symlink_metadata(to).await.is_ok();
    match (from_exists, to_exists) {
        (true, false) => {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::rename(from, to).await?;
            tracing::debug!(from = %from.display(), to = %to.display(), "moved");
            Ok(())
        }
        (true, true) => Err(FleetError::Scaffold {
            path: to.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("both {} and its destination exist", from.display()),
            ),
        }),
        (false, _) => Ok(()),
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FleetError::Scaffold {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FleetError::Scaffold {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
