//! mDNS browsing for Geyserwala devices.
//!
//! Discovery sends periodic multicast queries for the service type and
//! listens for answers until the timeout expires. Every answer is converted
//! into a [`Device`] and duplicates (same address and port) are dropped.

use std::collections::HashSet;
use std::time::Duration;

use futures::{pin_mut, StreamExt};
use mdns::{Record, RecordKind};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::device::{device_from_records, ServiceRecord};
use crate::error::Result;
use crate::Device;

/// How often the multicast query is repeated while browsing.
const QUERY_INTERVAL: Duration = Duration::from_secs(1);

fn to_service_record(record: &Record) -> Option<ServiceRecord> {
    let name = record.name.clone();
    match &record.kind {
        RecordKind::PTR(target) => Some(ServiceRecord::Pointer {
            name,
            target: target.clone(),
        }),
        RecordKind::SRV { port, target, .. } => Some(ServiceRecord::Service {
            name,
            port: *port,
            target: target.clone(),
        }),
        RecordKind::TXT(entries) => Some(ServiceRecord::Text {
            name,
            entries: entries.clone(),
        }),
        RecordKind::A(address) => Some(ServiceRecord::Address {
            name,
            address: (*address).into(),
        }),
        RecordKind::AAAA(address) => Some(ServiceRecord::Address {
            name,
            address: (*address).into(),
        }),
        _ => None,
    }
}

/// Collects unique devices from a stream of answers.
#[derive(Debug, Default)]
pub(crate) struct DeviceCollector {
    seen: HashSet<(String, u16)>,
    devices: Vec<Device>,
}

impl DeviceCollector {
    /// Record a device, returning `false` if it was already seen.
    pub(crate) fn add(&mut self, device: Device) -> bool {
        if self.seen.insert((device.address.clone(), device.port)) {
            self.devices.push(device);
            true
        } else {
            false
        }
    }

    pub(crate) fn into_devices(self) -> Vec<Device> {
        self.devices
    }
}

/// Browse `service` for the full `timeout`, returning every device found.
pub(crate) async fn browse(service: &str, timeout: Duration) -> Result<Vec<Device>> {
    let query_name = service.trim_end_matches('.');
    let stream = mdns::discover::all(query_name, QUERY_INTERVAL)?.listen();
    pin_mut!(stream);

    let deadline = Instant::now() + timeout;
    let mut collector = DeviceCollector::default();

    loop {
        let response = match timeout_at(deadline, stream.next()).await {
            Err(_) | Ok(None) => break,
            Ok(Some(Ok(response))) => response,
            Ok(Some(Err(e))) => {
                warn!("mDNS receive error: {}", e);
                continue;
            }
        };

        let records: Vec<ServiceRecord> = response.records().filter_map(to_service_record).collect();
        match device_from_records(service, &records) {
            Some(device) => {
                debug!(address = %device.address, port = device.port, "mDNS answer");
                if collector.add(device.clone()) {
                    info!("Found {} at {}:{}", device.hostname, device.address, device.port);
                }
            }
            None => debug!("Ignoring mDNS response with {} records", records.len()),
        }
    }

    Ok(collector.into_devices())
}
