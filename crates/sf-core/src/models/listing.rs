use serde::Serialize;

use super::journal::Operation;
use super::manifest::{SiteStatus, TenantRecord};
use super::process::{ProcessInfo, ProcessState};

/// Manifest status reconciled against what the supervisor reports.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SiteHealth {
    /// Active and running.
    Online,
    /// Active but not running.
    Offline,
    /// Paused and not running.
    Paused,
    /// Paused but still running.
    Drift,
    /// Supervisor could not be queried.
    Unknown,
}

impl std::fmt::Display for SiteHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SiteHealth::Online => "online",
            SiteHealth::Offline => "offline",
            SiteHealth::Paused => "paused",
            SiteHealth::Drift => "drift",
            SiteHealth::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One row of the List operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteListing {
    pub record: TenantRecord,
    pub url: String,
    /// `None` when the supervisor has no entry for this site.
    pub process: Option<ProcessInfo>,
    /// `false` when the supervisor could not be queried at all.
    pub supervisor_reachable: bool,
    /// Unfinished lifecycle operation recorded in the journal.
    pub pending: Option<Operation>,
}

impl SiteListing {
    pub fn process_state(&self) -> Option<ProcessState> {
        self.process.as_ref().map(|p| p.status)
    }

    pub fn health(&self) -> SiteHealth {
        if !self.supervisor_reachable {
            return SiteHealth::Unknown;
        }
        let running = self.process_state().is_some_and(ProcessState::is_running);
        match (self.record.status, running) {
            (SiteStatus::Active, true) => SiteHealth::Online,
            (SiteStatus::Active, false) => SiteHealth::Offline,
            (SiteStatus::Paused, false) => SiteHealth::Paused,
            (SiteStatus::Paused, true) => SiteHealth::Drift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(status: SiteStatus, process: Option<ProcessState>) -> SiteListing {
        let mut record = TenantRecord::new("a".into(), 4001, "https://a.test".into(), String::new());
        record.status = status;
        SiteListing {
            url: "https://a.test".into(),
            process: process.map(|status| ProcessInfo {
                name: record.process_name(),
                status,
            }),
            record,
            supervisor_reachable: true,
            pending: None,
        }
    }

    #[test]
    fn health_reconciles_manifest_and_supervisor() {
        assert_eq!(
            listing(SiteStatus::Active, Some(ProcessState::Online)).health(),
            SiteHealth::Online
        );
        assert_eq!(listing(SiteStatus::Active, None).health(), SiteHealth::Offline);
        assert_eq!(
            listing(SiteStatus::Active, Some(ProcessState::Errored)).health(),
            SiteHealth::Offline
        );
        assert_eq!(
            listing(SiteStatus::Paused, Some(ProcessState::Stopped)).health(),
            SiteHealth::Paused
        );
        assert_eq!(
            listing(SiteStatus::Paused, Some(ProcessState::Online)).health(),
            SiteHealth::Drift
        );
    }

    #[test]
    fn unreachable_supervisor_is_unknown() {
        let mut row = listing(SiteStatus::Active, None);
        row.supervisor_reachable = false;
        assert_eq!(row.health(), SiteHealth::Unknown);
    }
}
