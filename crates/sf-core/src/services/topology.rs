//! Builds and repairs the symlink tree of one site.
//!
//! Every pass is idempotent: links that already point where they should are
//! left alone, anything else at a destination is replaced. Link targets are
//! computed relative to the *resolved* parent directory, because a parent may
//! itself be a symlink into storage and a target computed from the nominal
//! path would dangle.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{FleetError, Result};
use crate::models::{
    LinkCategory, LinkOutcome, PlatformConfig, SitePaths, TopologyLink, TopologyReport,
};

/// The canonical link set: tenant storage for content/db/data, shared engine
/// for server code and content components. Parents come before children.
pub fn canonical_links(config: &PlatformConfig, paths: &SitePaths) -> Vec<TopologyLink> {
    let storage = &paths.storage_root;
    vec![
        TopologyLink::data("content", storage.join("content")),
        TopologyLink::data("db", storage.join("db")),
        TopologyLink::data("data", storage.join("data")),
        TopologyLink::core("server", config.core_server()),
        TopologyLink::core(
            Path::new("app").join("components").join("content"),
            config.core_components(),
        ),
    ]
}

/// Apply `links` under `site_dir`. Aborts on the first I/O failure.
pub fn build(site_dir: &Path, links: &[TopologyLink]) -> Result<TopologyReport> {
    let mut report = TopologyReport::default();
    for link in links {
        let outcome = apply(site_dir, link).map_err(|source| FleetError::Topology {
            mapping: link.destination.display().to_string(),
            source,
        })?;
        match &outcome {
            LinkOutcome::Created => tracing::debug!(
                destination = %link.destination.display(),
                source = %link.source.display(),
                "link_created"
            ),
            LinkOutcome::Skipped(reason) => tracing::warn!(
                destination = %link.destination.display(),
                %reason,
                "link_skipped"
            ),
            LinkOutcome::Unchanged => {}
        }
        report.entries.push((link.destination.clone(), outcome));
    }
    Ok(report)
}

fn apply(site_dir: &Path, link: &TopologyLink) -> std::io::Result<LinkOutcome> {
    let destination = site_dir.join(&link.destination);
    let parent = destination
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "destination has no parent"))?;
    std::fs::create_dir_all(parent)?;

    if !link.source.exists() {
        match link.category {
            LinkCategory::Data => std::fs::create_dir_all(&link.source)?,
            LinkCategory::Core => {
                remove_existing(&destination)?;
                return Ok(LinkOutcome::Skipped(format!(
                    "core source {} is missing",
                    link.source.display()
                )));
            }
        }
    }

    let real_parent = std::fs::canonicalize(parent)?;
    let real_source = std::fs::canonicalize(&link.source)?;
    let target = relative_path(&real_parent, &real_source);

    if let Ok(existing) = std::fs::read_link(&destination) {
        if existing == target {
            return Ok(LinkOutcome::Unchanged);
        }
    }
    remove_existing(&destination)?;
    symlink_dir(&target, &destination)?;
    Ok(LinkOutcome::Created)
}

/// Remove whatever sits at `path`: file, directory, or (possibly dangling) link.
fn remove_existing(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Path from directory `from` to `to`. Both must be absolute and resolved.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::PlatformLayout;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: PlatformConfig,
        paths: SitePaths,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let config = PlatformConfig::with_root(&root, "example.test");
        fs::create_dir_all(config.core_server()).unwrap();
        fs::create_dir_all(config.core_components()).unwrap();
        let paths = PlatformLayout::new(&config).site("client-a");
        fs::create_dir_all(&paths.site_dir).unwrap();
        Fixture {
            _dir: dir,
            config,
            paths,
        }
    }

    #[test]
    fn relative_path_walks_up_and_down() {
        assert_eq!(
            relative_path(Path::new("/a/sites/x"), Path::new("/a/storage/x/content")),
            PathBuf::from("../../storage/x/content")
        );
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a")), PathBuf::from("."));
    }

    #[test]
    fn builds_links_and_bootstraps_data_sources() {
        let fx = fixture();
        let links = canonical_links(&fx.config, &fx.paths);
        let report = build(&fx.paths.site_dir, &links).unwrap();
        assert_eq!(report.created(), 5);
        assert!(fx.paths.storage_root.join("content").is_dir());

        let content = fx.paths.site_dir.join("content");
        assert_eq!(
            fs::read_link(&content).unwrap(),
            PathBuf::from("../../storage/client-a/content")
        );
        assert_eq!(
            fs::canonicalize(fx.paths.site_dir.join("app/components/content")).unwrap(),
            fs::canonicalize(fx.config.core_components()).unwrap()
        );
    }

    #[test]
    fn second_pass_changes_nothing() {
        let fx = fixture();
        let links = canonical_links(&fx.config, &fx.paths);
        build(&fx.paths.site_dir, &links).unwrap();
        let again = build(&fx.paths.site_dir, &links).unwrap();
        assert_eq!(again.created(), 0);
        assert_eq!(again.unchanged(), 5);
        assert_eq!(again.skipped(), 0);
    }

    #[test]
    fn missing_core_source_is_skipped_not_fatal() {
        let fx = fixture();
        fs::remove_dir_all(fx.config.core_server()).unwrap();
        let links = canonical_links(&fx.config, &fx.paths);
        let report = build(&fx.paths.site_dir, &links).unwrap();
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.created(), 4);
        assert!(fs::symlink_metadata(fx.paths.site_dir.join("server")).is_err());
    }

    #[test]
    fn replaces_directories_and_stale_links() {
        let fx = fixture();
        fs::create_dir_all(fx.paths.site_dir.join("content").join("old")).unwrap();
        std::os::unix::fs::symlink("/nowhere", fx.paths.site_dir.join("db")).unwrap();
        let links = canonical_links(&fx.config, &fx.paths);
        let report = build(&fx.paths.site_dir, &links).unwrap();
        assert_eq!(report.created(), 5);
        assert!(fs::symlink_metadata(fx.paths.site_dir.join("content"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert!(fx.paths.site_dir.join("db").is_dir());
    }

    #[test]
    fn nested_link_resolves_through_symlinked_parent() {
        let fx = fixture();
        let storage_components = fx.paths.storage_root.join("components");
        let links = vec![
            TopologyLink::data(Path::new("app").join("components"), &storage_components),
            TopologyLink::core(
                Path::new("app").join("components").join("content"),
                fx.config.core_components(),
            ),
        ];
        build(&fx.paths.site_dir, &links).unwrap();
        // The nested link physically lives inside storage and must still resolve.
        let nested = storage_components.join("content");
        assert!(fs::symlink_metadata(&nested).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::canonicalize(&nested).unwrap(),
            fs::canonicalize(fx.config.core_components()).unwrap()
        );
    }

    #[test]
    fn io_failure_names_the_mapping() {
        let fx = fixture();
        fs::write(fx.paths.site_dir.join("app"), "not a dir").unwrap();
        let links = canonical_links(&fx.config, &fx.paths);
        match build(&fx.paths.site_dir, &links) {
            Err(FleetError::Topology { mapping, .. }) => {
                assert_eq!(mapping, "app/components/content")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
