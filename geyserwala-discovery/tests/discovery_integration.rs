//! Discovery integration tests
//!
//! Record-level tests build mDNS answers by hand; the live browse test needs a
//! multicast-capable network and is ignored by default
//! (run with `cargo test -p geyserwala-discovery -- --ignored`).

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use geyserwala_discovery::device::{device_from_records, ServiceRecord};
use geyserwala_discovery::{discover, Device, SERVICE_TYPE};
use rstest::rstest;

fn answer(instance: &str, host: &str, ip: [u8; 4], port: u16, txt: &[&str]) -> Vec<ServiceRecord> {
    let instance = format!("{}._geyserwala._tcp.local", instance);
    vec![
        ServiceRecord::Pointer {
            name: "_geyserwala._tcp.local".to_string(),
            target: instance.clone(),
        },
        ServiceRecord::Service {
            name: instance.clone(),
            port,
            target: host.to_string(),
        },
        ServiceRecord::Text {
            name: instance,
            entries: txt.iter().map(|s| s.to_string()).collect(),
        },
        ServiceRecord::Address {
            name: host.to_string(),
            address: IpAddr::V4(Ipv4Addr::from(ip)),
        },
    ]
}

#[rstest]
#[case("geyserwala", "geyserwala.local", [192, 168, 1, 20], 80, &["id=AB12"], Some("AB12"))]
#[case("geyserwala_mock", "geyserwala_mock.local", [127, 0, 0, 1], 8082, &["id=01234567898082"], Some("01234567898082"))]
#[case("kitchen", "kitchen.local", [10, 0, 0, 7], 8080, &[], None)]
fn test_answer_to_device(
    #[case] instance: &str,
    #[case] host: &str,
    #[case] ip: [u8; 4],
    #[case] port: u16,
    #[case] txt: &[&str],
    #[case] expected_id: Option<&str>,
) {
    let records = answer(instance, host, ip, port, txt);
    let device = device_from_records(SERVICE_TYPE, &records).expect("device should assemble");

    assert_eq!(device.address, Ipv4Addr::from(ip).to_string());
    assert_eq!(device.port, port);
    assert_eq!(device.hostname, host);
    assert_eq!(device.id(), expected_id);
}

#[test]
fn test_missing_srv_record_yields_nothing() {
    let mut records = answer("gw", "gw.local", [192, 168, 1, 3], 80, &["id=1"]);
    records.retain(|r| !matches!(r, ServiceRecord::Service { .. }));
    assert!(device_from_records(SERVICE_TYPE, &records).is_none());
}

#[test]
fn test_device_serializes_for_scripting() {
    let records = answer("gw", "gw.local", [192, 168, 1, 3], 80, &["id=1"]);
    let device: Device = device_from_records(SERVICE_TYPE, &records).unwrap();
    let json = serde_json::to_value(&device).unwrap();

    assert_eq!(json["address"], "192.168.1.3");
    assert_eq!(json["port"], 80);
    assert_eq!(json["properties"]["id"], "1");
}

#[tokio::test]
#[ignore = "requires a multicast-capable network"]
async fn test_live_browse_completes_within_timeout() {
    let started = std::time::Instant::now();
    let devices = discover(Duration::from_secs(2)).await.expect("browse should start");
    assert!(started.elapsed() < Duration::from_secs(5));
    for device in devices {
        assert!(!device.address.is_empty());
        assert!(device.port > 0);
    }
}
