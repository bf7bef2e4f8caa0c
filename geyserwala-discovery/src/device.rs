//! Turning mDNS answers into device descriptors.
//!
//! A single mDNS response usually carries the PTR, SRV, TXT and A records of
//! one advertised instance. This module works on a transport-neutral view of
//! those records so the assembly rules can be exercised without a network.

use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::Device;

/// The subset of DNS record kinds needed to describe a device.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRecord {
    /// `PTR` from the service type to an instance name
    Pointer { name: String, target: String },
    /// `SRV` giving the port and host of an instance
    Service { name: String, port: u16, target: String },
    /// `TXT` key/value metadata of an instance
    Text { name: String, entries: Vec<String> },
    /// `A` / `AAAA` address of a host
    Address { name: String, address: IpAddr },
}

impl ServiceRecord {
    pub fn name(&self) -> &str {
        match self {
            ServiceRecord::Pointer { name, .. }
            | ServiceRecord::Service { name, .. }
            | ServiceRecord::Text { name, .. }
            | ServiceRecord::Address { name, .. } => name,
        }
    }
}

/// Compare DNS names ignoring case and the optional trailing root dot.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

fn belongs_to(name: &str, service: &str) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    let service = service.trim_end_matches('.').to_ascii_lowercase();
    name == service || name.ends_with(&format!(".{}", service))
}

/// Parse TXT entries of the form `key=value`.
///
/// A bare `key` maps to an empty value. Entries with an empty key are dropped.
pub fn parse_txt_properties<S: AsRef<str>>(entries: &[S]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_ref();
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}

/// Assemble a [`Device`] for `service` from the records of one response.
///
/// Returns `None` when the response is about some other service, or lacks the
/// SRV record or IPv4 address needed to reach the device.
pub fn device_from_records(service: &str, records: &[ServiceRecord]) -> Option<Device> {
    let instance = records.iter().find_map(|record| match record {
        ServiceRecord::Pointer { name, target } if same_name(name, service) => {
            Some(target.as_str())
        }
        _ => None,
    });

    let (port, hostname) = records.iter().find_map(|record| match record {
        ServiceRecord::Service { name, port, target } => {
            let matches = match instance {
                Some(instance) => same_name(name, instance),
                None => belongs_to(name, service),
            };
            matches.then(|| (*port, target.clone()))
        }
        _ => None,
    })?;

    // Prefer the address record of the SRV target, then any IPv4 address
    let ipv4 = |record: &ServiceRecord| match record {
        ServiceRecord::Address {
            address: address @ IpAddr::V4(_),
            ..
        } => Some(*address),
        _ => None,
    };
    let address = records
        .iter()
        .filter(|record| same_name(record.name(), &hostname))
        .find_map(ipv4)
        .or_else(|| records.iter().find_map(ipv4))?;

    let properties = records
        .iter()
        .find_map(|record| match record {
            ServiceRecord::Text { name, entries } if belongs_to(name, service) => {
                Some(parse_txt_properties(entries))
            }
            _ => None,
        })
        .unwrap_or_default();

    Some(Device {
        address: address.to_string(),
        port,
        hostname,
        properties,
    })
}
