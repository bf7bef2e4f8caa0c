//! Geyserwala device discovery library
//!
//! Geyserwala controllers advertise themselves over multicast DNS as
//! `_geyserwala._tcp.local`. This crate browses for that service and returns
//! the address, port, hostname and TXT properties of every device that answers.
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> geyserwala_discovery::Result<()> {
//! use std::time::Duration;
//!
//! let devices = geyserwala_discovery::discover(Duration::from_secs(5)).await?;
//! for device in devices {
//!     println!("Found {} at {}:{}", device.hostname, device.address, device.port);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod device;
mod discovery;

pub use error::{DiscoveryError, Result};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

/// mDNS service type advertised by Geyserwala devices.
pub const SERVICE_TYPE: &str = "_geyserwala._tcp.local.";

/// Default browse duration used by [`discover_default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A Geyserwala device found on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// IPv4 address of the device
    pub address: String,
    /// HTTP port of the device REST API
    pub port: u16,
    /// Advertised host name, e.g. "geyserwala.local"
    pub hostname: String,
    /// TXT record properties (the device publishes at least `id`)
    pub properties: BTreeMap<String, String>,
}

impl Device {
    /// Device id from the advertised properties, if present.
    pub fn id(&self) -> Option<&str> {
        self.properties.get("id").map(String::as_str)
    }
}

/// Browse the local network for Geyserwala devices.
///
/// Blocks (asynchronously) for the whole `timeout` collecting answers; the
/// result is empty if nothing answered.
pub async fn discover(timeout: Duration) -> Result<Vec<Device>> {
    discovery::browse(SERVICE_TYPE, timeout).await
}

/// [`discover`] with the default 10 second timeout.
pub async fn discover_default() -> Result<Vec<Device>> {
    discover(DEFAULT_TIMEOUT).await
}
