//! Simple device discovery that outputs JSON for scripting
//!
//! Usage: cargo run -p geyserwala-discovery --example discover_json [seconds]

use std::time::Duration;

#[tokio::main]
async fn main() -> geyserwala_discovery::Result<()> {
    let timeout = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let devices = geyserwala_discovery::discover(Duration::from_secs(timeout)).await?;

    match serde_json::to_string_pretty(&devices) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode devices: {}", e),
    }
    Ok(())
}
