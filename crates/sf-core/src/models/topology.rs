use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LinkCategory {
    /// Tenant-private storage; bootstrapped empty when missing.
    Data,
    /// Shared engine code; a missing source only degrades the site.
    Core,
}

/// One symlink inside a tenant's runtime root.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopologyLink {
    /// Relative to the site directory.
    pub destination: PathBuf,
    /// Absolute.
    pub source: PathBuf,
    pub category: LinkCategory,
}

impl TopologyLink {
    pub fn data(destination: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
            category: LinkCategory::Data,
        }
    }

    pub fn core(destination: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            source: source.into(),
            category: LinkCategory::Core,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    Unchanged,
    Skipped(String),
}

/// Result of one topology pass.
#[derive(Debug, Clone, Default)]
pub struct TopologyReport {
    pub entries: Vec<(PathBuf, LinkOutcome)>,
}

impl TopologyReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Created))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::Skipped(_)))
    }

    fn count(&self, f: impl Fn(&LinkOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| f(o)).count()
    }
}
