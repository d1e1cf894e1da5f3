use std::path::Path;

use walkdir::WalkDir;

use crate::error::{FleetError, Result};
use crate::models::layout::TEMPLATE_EXCLUDES;
use crate::models::{PlatformConfig, SitePaths, TenantRecord};

use super::render;

/// Subdirectories every storage root must have.
pub const STORAGE_DIRS: &[&str] = &["content", "data", "db"];

/// Create the tenant storage root. An existing root is kept and only has
/// missing subdirectories filled in; otherwise the storage template is copied
/// when present.
pub fn materialize_storage(config: &PlatformConfig, paths: &SitePaths) -> Result<()> {
    let template = config.template_storage();
    if !paths.storage_root.exists() && template.is_dir() {
        let copied = copy_tree(&template, &paths.storage_root, &[])?;
        tracing::info!(storage = %paths.storage_root.display(), files = copied, "storage_from_template");
    }
    for dir in STORAGE_DIRS {
        let path = paths.storage_root.join(dir);
        std::fs::create_dir_all(&path).map_err(|e| scaffold_error(&path, e))?;
    }
    Ok(())
}

/// Create the working directory, seeded from the site template when present.
pub fn materialize_site(config: &PlatformConfig, paths: &SitePaths) -> Result<()> {
    let template = config.template_site();
    std::fs::create_dir_all(&paths.site_dir).map_err(|e| scaffold_error(&paths.site_dir, e))?;
    if template.is_dir() {
        let copied = copy_tree(&template, &paths.site_dir, TEMPLATE_EXCLUDES)?;
        tracing::info!(site = %paths.site_dir.display(), files = copied, "site_from_template");
    } else {
        tracing::warn!(template = %template.display(), "site_template_missing");
    }
    Ok(())
}

pub fn write_tenant_config(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
) -> Result<()> {
    let path = paths.tenant_config();
    let existing = read_optional(&path)?;
    let rendered = render::render_tenant_config(existing.as_deref(), config, record)?;
    write_artifact(&path, &rendered)
}

/// Write `.env` and the process descriptor. Returns the signing secret used.
pub fn write_runtime_files(
    config: &PlatformConfig,
    record: &TenantRecord,
    paths: &SitePaths,
) -> Result<String> {
    let existing = read_optional(&paths.env_file())?;
    let secret = render::resolve_secret(config, existing.as_deref());
    write_artifact(
        &paths.env_file(),
        &render::render_env(config, record, paths, &secret),
    )?;
    let descriptor = render::process_descriptor(config, record, paths, &secret);
    write_artifact(&paths.descriptor_file(), &render::render_descriptor(&descriptor)?)?;
    Ok(secret)
}

pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(scaffold_error(path, e)),
    }
}

pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| scaffold_error(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| scaffold_error(path, e))
}

/// Recursively copy `src` into `dest`, skipping any entry whose name is in
/// `excludes`. Symlinks are recreated, not followed. Returns files copied.
pub fn copy_tree(src: &Path, dest: &Path, excludes: &[&str]) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(src).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        e.depth() == 0
            || !e
                .file_name()
                .to_str()
                .is_some_and(|name| excludes.contains(&name))
    }) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            scaffold_error(&path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| scaffold_error(entry.path(), std::io::Error::other(e)))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| scaffold_error(&target, e))?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path()).map_err(|e| scaffold_error(entry.path(), e))?;
            if std::fs::symlink_metadata(&target).is_ok() {
                std::fs::remove_file(&target).map_err(|e| scaffold_error(&target, e))?;
            }
            make_symlink(&link, &target).map_err(|e| scaffold_error(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| scaffold_error(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn scaffold_error(path: &Path, source: std::io::Error) -> FleetError {
    FleetError::Scaffold {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlatformLayout;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PlatformConfig, SitePaths, TenantRecord) {
        let dir = tempfile::tempdir().unwrap();
        let config = PlatformConfig::with_root(dir.path(), "example.test");
        let paths = PlatformLayout::new(&config).site("client-a");
        let record = TenantRecord::new(
            "client-a".into(),
            4001,
            config.site_url("client-a"),
            String::new(),
        );
        (dir, config, paths, record)
    }

    #[test]
    fn storage_without_template_gets_empty_skeleton() {
        let (_dir, config, paths, _) = setup();
        materialize_storage(&config, &paths).unwrap();
        for sub in STORAGE_DIRS {
            assert!(paths.storage_root.join(sub).is_dir());
        }
    }

    #[test]
    fn storage_template_is_copied_whole() {
        let (_dir, config, paths, _) = setup();
        let template = config.template_storage();
        fs::create_dir_all(template.join("data")).unwrap();
        fs::write(template.join("data").join("seed.json"), "{}").unwrap();
        materialize_storage(&config, &paths).unwrap();
        assert!(paths.storage_root.join("data").join("seed.json").is_file());
    }

    #[test]
    fn site_template_skips_heavy_directories() {
        let (_dir, config, paths, _) = setup();
        let template = config.template_site();
        fs::create_dir_all(template.join("node_modules").join("pkg")).unwrap();
        fs::create_dir_all(template.join("pages")).unwrap();
        fs::write(template.join("pages").join("index.vue"), "<template/>").unwrap();
        fs::write(template.join("package.json"), "{}").unwrap();
        materialize_site(&config, &paths).unwrap();
        assert!(paths.site_dir.join("pages").join("index.vue").is_file());
        assert!(paths.site_dir.join("package.json").is_file());
        assert!(!paths.site_dir.join("node_modules").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_recreates_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        std::os::unix::fs::symlink("../elsewhere", src.join("link")).unwrap();
        copy_tree(&src, &dir.path().join("dest"), &[]).unwrap();
        assert_eq!(
            fs::read_link(dir.path().join("dest").join("link")).unwrap(),
            Path::new("../elsewhere")
        );
    }

    #[test]
    fn runtime_files_keep_secret_across_rewrites() {
        let (_dir, config, paths, record) = setup();
        let first = write_runtime_files(&config, &record, &paths).unwrap();
        let second = write_runtime_files(&config, &record, &paths).unwrap();
        assert_eq!(first, second);
        assert!(paths.descriptor_file().is_file());
    }

    #[test]
    fn tenant_config_written_into_storage_root() {
        let (_dir, config, paths, record) = setup();
        write_tenant_config(&config, &record, &paths).unwrap();
        let json = fs::read_to_string(paths.tenant_config()).unwrap();
        assert!(json.contains("\"port\": \"4001\""));
    }
}
