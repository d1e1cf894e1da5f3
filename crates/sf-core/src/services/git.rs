use std::path::Path;

use crate::error::{FleetError, Result};
use crate::models::{PlatformConfig, SitePaths, TenantRecord};

use super::command::{CommandRunner, CommandSpec};
use super::render;

fn git() -> CommandSpec {
    CommandSpec::new("git")
}

/// `git --git-dir <repo> --work-tree <site> ...`
fn git_detached(repo: &Path, work_tree: &Path) -> CommandSpec {
    git()
        .arg("--git-dir")
        .path_arg(repo)
        .arg("--work-tree")
        .path_arg(work_tree)
}

async fn run_git(runner: &dyn CommandRunner, spec: CommandSpec) -> Result<String> {
    let output = runner
        .run(&spec)
        .await
        .map_err(|e| FleetError::Git(format!("failed to run git: {e}")))?;
    if !output.success() {
        return Err(FleetError::Git(format!(
            "{} failed (exit {}): {}",
            spec.display(),
            output.code.unwrap_or(-1),
            output.stderr
        )));
    }
    Ok(output.stdout)
}

/// Create the bare repository with `HEAD` on the deploy branch. Safe to
/// repeat on an existing repository.
pub async fn init_bare(runner: &dyn CommandRunner, repo: &Path, branch: &str) -> Result<()> {
    tokio::fs::create_dir_all(repo)
        .await
        .map_err(|e| FleetError::Git(format!("failed to create {}: {e}", repo.display())))?;
    run_git(runner, git().args(["init", "--bare", "--quiet"]).path_arg(repo)).await?;
    run_git(
        runner,
        git()
            .arg("--git-dir")
            .path_arg(repo)
            .args(["symbolic-ref", "HEAD"])
            .arg(format!("refs/heads/{branch}")),
    )
    .await?;
    Ok(())
}

/// Write the post-receive hook for `record`, replacing any previous one.
pub async fn install_hook(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
) -> Result<()> {
    let hook = paths.hook_file();
    if let Some(dir) = hook.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| FleetError::Git(format!("failed to create hooks dir: {e}")))?;
    }
    tokio::fs::write(&hook, render::render_hook(config, record))
        .await
        .map_err(|e| FleetError::Git(format!("failed to write hook: {e}")))?;
    set_executable(&hook).await?;
    tracing::debug!(site = %record.id, hook = %hook.display(), "hook_installed");
    Ok(())
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| FleetError::Git(format!("failed to chmod hook: {e}")))
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

pub async fn branch_exists(runner: &dyn CommandRunner, repo: &Path, branch: &str) -> Result<bool> {
    let spec = git()
        .arg("--git-dir")
        .path_arg(repo)
        .args(["rev-parse", "--verify", "--quiet"])
        .arg(format!("refs/heads/{branch}"));
    Ok(runner.run(&spec).await?.success())
}

/// Commit the current working directory straight into the bare repository
/// so that the first clone matches what is deployed. Skipped when the branch
/// already has history. Returns whether a commit was made.
pub async fn seed_initial_commit(
    runner: &dyn CommandRunner,
    config: &PlatformConfig,
    paths: &SitePaths,
    site_id: &str,
) -> Result<bool> {
    let branch = &config.deploy.branch;
    if branch_exists(runner, &paths.repo_dir, branch).await? {
        tracing::debug!(site = site_id, "seed_skipped_branch_exists");
        return Ok(false);
    }
    let detached = git_detached(&paths.repo_dir, &paths.site_dir);
    run_git(runner, detached.clone().args(["add", "-A"]).current_dir(&paths.site_dir)).await?;
    run_git(
        runner,
        detached
            .arg("-c")
            .arg(format!("user.name={}", config.deploy.git_user_name))
            .arg("-c")
            .arg(format!("user.email={}", config.deploy.git_user_email))
            .args(["commit", "--quiet", "--allow-empty", "-m"])
            .arg(format!("Initial setup: {site_id}"))
            .current_dir(&paths.site_dir),
    )
    .await?;
    tracing::info!(site = site_id, "repository_seeded");
    Ok(true)
}

/// Force the working directory to the tip of the deploy branch.
pub async fn checkout(runner: &dyn CommandRunner, paths: &SitePaths, branch: &str) -> Result<()> {
    run_git(
        runner,
        git_detached(&paths.repo_dir, &paths.site_dir)
            .args(["checkout", "-f", branch])
            .current_dir(&paths.site_dir),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlatformLayout;
    use crate::services::command::CommandOutput;
    use crate::services::fakes::RecordingRunner;

    fn setup() -> (tempfile::TempDir, PlatformConfig, SitePaths) {
        let dir = tempfile::tempdir().unwrap();
        let config = PlatformConfig::with_root(dir.path(), "example.test");
        let paths = PlatformLayout::new(&config).site("client-a");
        (dir, config, paths)
    }

    #[tokio::test]
    async fn init_bare_points_head_at_branch() {
        let (_dir, _config, paths) = setup();
        let runner = RecordingRunner::new();
        init_bare(&runner, &paths.repo_dir, "main").await.unwrap();
        let calls = runner.displays();
        assert!(calls[0].starts_with("git init --bare"));
        assert!(calls[1].ends_with("symbolic-ref HEAD refs/heads/main"));
        assert!(paths.repo_dir.is_dir());
    }

    #[tokio::test]
    async fn seed_skips_when_branch_exists() {
        let (_dir, config, paths) = setup();
        let runner = RecordingRunner::new();
        assert!(!seed_initial_commit(&runner, &config, &paths, "client-a").await.unwrap());
        assert_eq!(runner.displays().len(), 1);
    }

    #[tokio::test]
    async fn seed_commits_work_tree_into_bare_repo() {
        let (_dir, config, paths) = setup();
        let runner = RecordingRunner::new();
        runner.respond("rev-parse", CommandOutput::failed(1, ""));
        assert!(seed_initial_commit(&runner, &config, &paths, "client-a").await.unwrap());
        let calls = runner.displays();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].contains("--work-tree") && calls[1].ends_with("add -A"));
        assert!(calls[2].contains("commit --quiet --allow-empty -m Initial setup: client-a"));
    }

    #[tokio::test]
    async fn failing_git_is_a_git_error() {
        let (_dir, _config, paths) = setup();
        let runner = RecordingRunner::new();
        runner.respond("checkout", CommandOutput::failed(128, "fatal: bad ref"));
        let err = checkout(&runner, &paths, "main").await.unwrap_err();
        assert!(matches!(err, FleetError::Git(ref m) if m.contains("bad ref")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hook_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, config, paths) = setup();
        let record = TenantRecord::new("client-a".into(), 4001, String::new(), String::new());
        install_hook(&config, &record, &paths).await.unwrap();
        let mode = std::fs::metadata(paths.hook_file()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
