//! Async client for the Geyserwala water-heater controller
//!
//! The device exposes a small JSON REST API: a session resource for bearer
//! token login, a value resource read with a key filter and written with
//! PATCH, and a timer collection. [`GeyserwalaClient`] wraps all three:
//!
//! - the session logs in lazily and again after any 401,
//! - reads are served from a short-lived cache ([`StateCache`]) so bursts of
//!   `update()` calls cost one request,
//! - setters validate locally and adopt the value the device echoes back.
//!
//! Devices can be found on the local network with [`discover`] and turned
//! into a configuration with [`ClientConfig::from_device`].
//!
//! ```rust,no_run
//! use geyserwala_api::{discover, ClientConfig, GeyserwalaClient};
//! use std::time::Duration;
//!
//! # async fn run() -> geyserwala_api::Result<()> {
//! for device in discover(Duration::from_secs(5)).await.unwrap_or_default() {
//!     let client = GeyserwalaClient::new(ClientConfig::from_device(&device));
//!     client.update_status().await?;
//!     println!("{} {} °C", client.name(), client.tank_temp());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod keys;
pub mod logging;
pub mod mode;
pub mod session;
pub mod timer;

pub use cache::StateCache;
pub use client::{Flag, GeyserwalaClient, TEMP_UNKNOWN, UNKNOWN};
pub use config::ClientConfig;
pub use credentials::{AsyncFnCredential, CredentialProvider, FnCredential, Password};
pub use error::{ApiError, Result};
pub use mode::{Mode, UnknownMode, MAX_SETPOINT, MIN_SETPOINT};
pub use session::{ApiRequest, Session};
pub use timer::Timer;

pub use geyserwala_discovery::{discover, discover_default, Device, DiscoveryError};
pub use rest_client::{Endpoint, HttpTransport, Method, RestClient, RestError, RestRequest, RestResponse};
