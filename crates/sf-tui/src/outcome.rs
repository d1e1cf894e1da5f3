use sf_core::services::deploy::DeployReport;
use sf_core::FleetError;

/// Process exit status of a finished subcommand. git treats a non-zero
/// post-receive status as a failed push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }
}

/// Report a lifecycle error on stderr.
pub fn report_error(e: &FleetError) -> Status {
    eprintln!("error: {e}");
    if let Some(step) = e.step() {
        eprintln!("stopped at step '{step}'; `sitefleet repair <id>` resumes it");
    }
    Status::Failure
}

/// Outcome of `sitefleet deploy`. A build that failed and kept the old
/// process running still fails the push.
pub fn deploy_status(id: &str, result: Result<DeployReport, FleetError>) -> Status {
    match result {
        Ok(report) if report.succeeded() => {
            println!("deployed {id}: {}", report.stage);
            Status::Success
        }
        Ok(report) => {
            eprintln!(
                "deploy of {id} failed, previous version left running: {}",
                report.failure.unwrap_or_default()
            );
            Status::Failure
        }
        Err(e) => report_error(&e),
    }
}
