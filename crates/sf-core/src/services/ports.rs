use crate::error::{FleetError, Result};
use crate::models::Manifest;

/// Next free port: one above the highest of `last_port`, every used port,
/// and the configured floor.
pub fn allocate_port(manifest: &Manifest, floor: u16) -> Result<u16> {
    let highest = manifest
        .max_used_port()
        .unwrap_or(0)
        .max(manifest.last_port)
        .max(floor);
    highest.checked_add(1).ok_or_else(|| {
        FleetError::PortAllocation(format!("no port above {highest} is available"))
    })
}
