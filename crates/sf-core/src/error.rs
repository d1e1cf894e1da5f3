use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("invalid site name '{0}': {1}")]
    InvalidName(String, String),

    #[error("site '{0}' already exists")]
    SiteAlreadyExists(String),

    #[error("site '{0}' not found")]
    SiteNotFound(String),

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("port allocation failed: {0}")]
    PortAllocation(String),

    #[error("lock on {path} failed: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("link '{mapping}' failed: {source}")]
    Topology {
        mapping: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scaffold failed at {path}: {source}")]
    Scaffold {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git operation failed: {0}")]
    Git(String),

    #[error("supervisor operation failed: {0}")]
    Supervisor(String),

    #[error("proxy operation failed: {0}")]
    Proxy(String),

    #[error("`{command}` exited with {code}: {stderr}")]
    Command {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deploy of '{site}' stopped at {stage}: {detail}")]
    Deploy {
        site: String,
        stage: String,
        detail: String,
    },

    #[error("journal error: {0}")]
    Journal(String),

    #[error("step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<FleetError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl FleetError {
    /// Tag an error with the lifecycle step it came from. Already-tagged
    /// errors keep their innermost step.
    pub fn in_step(self, step: &'static str) -> Self {
        match self {
            FleetError::Step { .. } => self,
            other => FleetError::Step {
                step,
                source: Box::new(other),
            },
        }
    }

    /// The failing step name, if this error was raised inside one.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            FleetError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Validation errors are raised before any resource is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FleetError::InvalidName(..)
                | FleetError::SiteAlreadyExists(_)
                | FleetError::SiteNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
