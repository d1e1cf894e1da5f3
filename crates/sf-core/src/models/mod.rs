pub mod config;
pub mod journal;
pub mod layout;
pub mod listing;
pub mod manifest;
pub mod process;
pub mod proxy;
pub mod topology;

pub use config::PlatformConfig;
pub use journal::{JournalEntry, Operation};
pub use layout::{PlatformLayout, SitePaths};
pub use listing::{SiteHealth, SiteListing};
pub use manifest::{Manifest, SiteStatus, TenantRecord};
pub use process::{ProcessDescriptor, ProcessInfo, ProcessState};
pub use proxy::ProxyRoute;
pub use topology::{LinkCategory, LinkOutcome, TopologyLink, TopologyReport};
