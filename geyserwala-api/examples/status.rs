//! Print the status of every Geyserwala on the local network
//!
//! ```text
//! GEYSERWALA_PASSWORD=secret GEYSERWALA_LOG_MODE=development cargo run --example status
//! ```

use std::time::Duration;

use geyserwala_api::{discover, logging, ClientConfig, GeyserwalaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let password = std::env::var("GEYSERWALA_PASSWORD").unwrap_or_default();
    let devices = discover(Duration::from_secs(5)).await?;
    if devices.is_empty() {
        println!("No devices found");
    }

    for device in devices {
        let client = GeyserwalaClient::new(ClientConfig::from_device(&device).with_password(password.clone()));
        client.update_status().await?;

        println!("{} ({}:{})", client.name(), device.address, device.port);
        println!("  status:   {}", client.status());
        println!("  tank:     {} °C", client.tank_temp());
        println!("  mode:     {}", client.mode());
        println!("  setpoint: {:?}", client.setpoint());
        for timer in client.list_timers().await? {
            println!("  timer {}: {:02}:{:02}-{:02}:{:02} {} °C", timer.id, timer.begin[0], timer.begin[1], timer.end[0], timer.end[1], timer.temp);
        }
        client.close().await;
    }
    Ok(())
}
