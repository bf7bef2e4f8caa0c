use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use rest_client::{HttpTransport, RestClient};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{as_bool, StateCache};
use crate::config::ClientConfig;
use crate::credentials::Password;
use crate::error::{ApiError, Result};
use crate::keys;
use crate::mode::{Mode, MAX_SETPOINT, MIN_SETPOINT};
use crate::session::{is_empty_payload, ApiRequest, Session};

/// Placeholder returned by string getters before the value is known
pub const UNKNOWN: &str = "?";
/// Temperature returned before a reading is known
///
/// Lower than anything the sensors report, so it never passes for a real
/// reading.
pub const TEMP_UNKNOWN: i64 = -25;

const VALUE_PATH: &str = "api/value";

/// A boolean-or-integer switch value
///
/// The external control keys accept either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag::Bool(value)
    }
}

impl From<i32> for Flag {
    fn from(value: i32) -> Self {
        Flag::Int(value.into())
    }
}

impl From<i64> for Flag {
    fn from(value: i64) -> Self {
        Flag::Int(value)
    }
}

/// Client for one Geyserwala device
///
/// Getters read the local cache only; call [`update`](Self::update) or
/// [`update_status`](Self::update_status) first. Setters validate locally,
/// returning `Ok(false)` without any request when the value is out of range,
/// then PATCH the device and adopt whatever value it echoes back.
///
/// # Example
///
/// ```rust,no_run
/// use geyserwala_api::{ClientConfig, GeyserwalaClient, Mode};
///
/// # async fn run() -> geyserwala_api::Result<()> {
/// let client = GeyserwalaClient::new(ClientConfig::new("192.168.1.20").with_password("secret"));
///
/// client.update_status().await?;
/// println!("{}: {} °C, mode {}", client.name(), client.tank_temp(), client.mode());
///
/// client.set_mode(Mode::Timer).await?;
/// client.set_setpoint(55).await?;
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GeyserwalaClient {
    pub(crate) session: Session,
    pub(crate) cache: StateCache,
    subscribed: RwLock<BTreeSet<String>>,
}

impl GeyserwalaClient {
    /// Create a client with its own pooled HTTP transport
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(RestClient::new()))
    }

    /// Create a client sending requests through `transport`
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            session: Session::new(&config, transport),
            cache: StateCache::new(config.cache_ttl),
            subscribed: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    // ==================== Session ====================

    pub fn authorized(&self) -> bool {
        self.session.authorized()
    }

    pub async fn login(&self, username: impl Into<String>, password: impl Into<Password>) -> bool {
        self.session.login(username, password).await
    }

    pub async fn logout(&self) -> bool {
        self.session.logout().await
    }

    /// Log out if a session is open and drop the client
    pub async fn close(self) {
        if self.session.authorized() && !self.session.logout().await {
            debug!("Logout on close failed");
        }
    }

    // ==================== Refresh ====================

    /// Add keys to the set fetched by [`update`](Self::update)
    pub fn subscribe_keys<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribed.write().extend(keys.into_iter().map(Into::into));
    }

    pub fn unsubscribe_keys<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subscribed = self.subscribed.write();
        for key in keys {
            subscribed.remove(key.as_ref());
        }
    }

    pub fn subscribed_keys(&self) -> Vec<String> {
        self.subscribed.read().iter().cloned().collect()
    }

    /// Fetch `keys` unless the cache is still fresh
    ///
    /// Keys missing from the answer keep their cached values. Returns
    /// `Ok(false)` when the device answers with nothing.
    pub async fn refresh<S: AsRef<str>>(&self, keys: &[S]) -> Result<bool> {
        if self.cache.is_fresh() {
            return Ok(true);
        }
        let filter = keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");

        self.session
            .run_authorized(|| async move {
                let guard = self.session.lock().await;
                // Another caller may have refreshed while we waited for the lock
                if self.cache.is_fresh() {
                    return Ok(true);
                }
                let started = Instant::now();
                let body = guard
                    .send(ApiRequest::get(VALUE_PATH).with_query("f", filter))
                    .await?;
                drop(guard);

                match body {
                    Some(Value::Object(values)) if !values.is_empty() => {
                        self.cache.merge(values);
                        self.cache.mark_updated(started);
                        Ok(true)
                    }
                    Some(body) if !is_empty_payload(&body) => Err(ApiError::Response(format!(
                        "expected an object of values, got {}",
                        body
                    ))),
                    _ => Ok(false),
                }
            })
            .await
    }

    /// Refresh the fixed info, status, manual and integration keys
    pub async fn update_status(&self) -> Result<bool> {
        self.refresh(&keys::base_keys()).await
    }

    /// Refresh the fixed keys plus every subscribed key
    pub async fn update(&self) -> Result<bool> {
        let mut request_keys: Vec<String> = keys::base_keys().into_iter().map(String::from).collect();
        for key in self.subscribed.read().iter() {
            if !request_keys.contains(key) {
                request_keys.push(key.clone());
            }
        }
        self.refresh(&request_keys).await
    }

    // ==================== Generic access ====================

    /// Raw cached value for any key
    pub fn get_key(&self, key: &str) -> Option<Value> {
        self.cache.get(key)
    }

    /// PATCH any key without local validation
    pub async fn set_key(&self, key: &str, value: impl Serialize) -> Result<bool> {
        let value = serde_json::to_value(value).map_err(|e| ApiError::Response(e.to_string()))?;
        self.set_value(key, value).await
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<bool> {
        let mut body = Map::new();
        body.insert(key.to_string(), value.clone());

        self.session
            .run_authorized(|| async move {
                let echoed = self
                    .session
                    .request(ApiRequest::patch(VALUE_PATH, Value::Object(body)))
                    .await?;
                match echoed {
                    Some(Value::Object(values)) if !values.is_empty() => {
                        if values.get(key) != Some(&value) {
                            debug!(key, requested = %value, echoed = ?values.get(key), "device adjusted value");
                        }
                        self.cache.merge(values);
                        Ok(true)
                    }
                    Some(body) if !is_empty_payload(&body) => Err(ApiError::Response(format!(
                        "expected an object echo, got {}",
                        body
                    ))),
                    _ => Ok(false),
                }
            })
            .await
    }

    // ==================== Info ====================

    pub fn id(&self) -> String {
        self.cache.get_str(keys::ID, UNKNOWN)
    }

    pub fn name(&self) -> String {
        self.cache.get_str(keys::NAME, UNKNOWN)
    }

    pub fn version(&self) -> String {
        self.cache.get_str(keys::VERSION, UNKNOWN)
    }

    /// Device clock as "HH:MM"
    pub fn time(&self) -> String {
        self.cache.get_str(keys::TIME, UNKNOWN)
    }

    /// Feature flags the device reports, e.g. `f-collector`
    pub fn features(&self) -> BTreeMap<String, bool> {
        match self.cache.get(keys::FEATURES) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, value)| (name.clone(), as_bool(value).unwrap_or(false)))
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// False when the feature map or the flag is missing
    pub fn has_feature(&self, key: &str) -> bool {
        self.cache.get_nested_bool(keys::FEATURES, key).unwrap_or(false)
    }

    /// Modes this device can be put in, derived from its features
    pub fn modes(&self) -> Vec<Mode> {
        let heat_source = if self.has_feature(keys::FEATURE_COLLECTOR) || self.has_feature(keys::FEATURE_PV_PANEL) {
            Mode::Solar
        } else {
            Mode::Standby
        };
        vec![Mode::Setpoint, Mode::Timer, heat_source, Mode::Holiday]
    }

    // ==================== Status ====================

    pub fn status(&self) -> String {
        self.cache.get_str(keys::STATUS, UNKNOWN)
    }

    /// Tank temperature in °C, rounded to the nearest degree
    ///
    /// The unrounded reading is available from `get_key("tank-temp")`.
    pub fn tank_temp(&self) -> i64 {
        self.cache.get_i64(keys::TANK_TEMP).unwrap_or(TEMP_UNKNOWN)
    }

    /// Collector temperature in °C, rounded to the nearest degree
    pub fn collector_temp(&self) -> i64 {
        self.cache.get_i64(keys::COLLECTOR_TEMP).unwrap_or(TEMP_UNKNOWN)
    }

    pub fn pump_status(&self) -> Option<bool> {
        self.cache.get_bool(keys::PUMP_STATUS)
    }

    pub fn element_demand(&self) -> Option<bool> {
        self.cache.get_bool(keys::ELEMENT_DEMAND)
    }

    /// Seconds the element has been on, when the device reports it
    pub fn element_seconds(&self) -> Option<i64> {
        self.cache.get_i64(keys::ELEMENT_SECONDS)
    }

    // ==================== Manual control ====================

    /// Current mode as reported, or "?" before the first update
    pub fn mode(&self) -> String {
        self.cache.get_str(keys::MODE, UNKNOWN)
    }

    pub async fn set_mode(&self, mode: impl AsRef<str>) -> Result<bool> {
        let Ok(mode) = mode.as_ref().parse::<Mode>() else {
            return Ok(false);
        };
        self.set_value(keys::MODE, Value::from(mode.as_str())).await
    }

    pub fn setpoint(&self) -> Option<i64> {
        self.cache.get_i64(keys::SETPOINT)
    }

    /// Upper setpoint bound: the device's `setpoint-max`, or 65
    ///
    /// A fractional cap rounds down.
    pub fn setpoint_max(&self) -> i64 {
        self.cache
            .get_f64(keys::SETPOINT_MAX)
            .map(|max| max.floor() as i64)
            .unwrap_or(MAX_SETPOINT)
    }

    pub async fn set_setpoint(&self, setpoint: i64) -> Result<bool> {
        if !(MIN_SETPOINT..=self.setpoint_max()).contains(&setpoint) {
            return Ok(false);
        }
        self.set_value(keys::SETPOINT, Value::from(setpoint)).await
    }

    pub fn boost_demand(&self) -> Option<bool> {
        self.cache.get_bool(keys::BOOST_DEMAND)
    }

    pub async fn set_boost_demand(&self, on: bool) -> Result<bool> {
        self.set_value(keys::BOOST_DEMAND, Value::from(on)).await
    }

    pub fn lowpower_enable(&self) -> Option<bool> {
        self.cache.get_bool(keys::LOWPOWER_ENABLE)
    }

    pub async fn set_lowpower_enable(&self, on: bool) -> Result<bool> {
        self.set_value(keys::LOWPOWER_ENABLE, Value::from(on)).await
    }

    // ==================== External control ====================

    pub fn external_setpoint(&self) -> Option<i64> {
        self.cache.get_i64(keys::EXTERNAL_SETPOINT)
    }

    pub async fn set_external_setpoint(&self, setpoint: i64) -> Result<bool> {
        if !(MIN_SETPOINT..=MAX_SETPOINT).contains(&setpoint) {
            return Ok(false);
        }
        self.set_value(keys::EXTERNAL_SETPOINT, Value::from(setpoint)).await
    }

    pub fn external_demand(&self) -> Option<bool> {
        self.cache.get_bool(keys::EXTERNAL_DEMAND)
    }

    pub async fn set_external_demand(&self, on: impl Into<Flag>) -> Result<bool> {
        let flag: Flag = on.into();
        self.set_key(keys::EXTERNAL_DEMAND, flag).await
    }

    pub fn external_disable(&self) -> Option<bool> {
        self.cache.get_bool(keys::EXTERNAL_DISABLE)
    }

    pub async fn set_external_disable(&self, on: impl Into<Flag>) -> Result<bool> {
        let flag: Flag = on.into();
        self.set_key(keys::EXTERNAL_DISABLE, flag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_client() -> GeyserwalaClient {
        GeyserwalaClient::new(ClientConfig::new("127.0.0.1"))
    }

    fn seed(client: &GeyserwalaClient, values: Value) {
        if let Value::Object(map) = values {
            client.cache.merge(map);
        }
    }

    #[test]
    fn test_defaults_before_update() {
        let client = offline_client();
        assert_eq!(client.name(), "?");
        assert_eq!(client.status(), "?");
        assert_eq!(client.mode(), "?");
        assert_eq!(client.tank_temp(), TEMP_UNKNOWN);
        assert_eq!(client.collector_temp(), -25);
        assert_eq!(client.boost_demand(), None);
        assert_eq!(client.pump_status(), None);
        assert_eq!(client.setpoint(), None);
        assert_eq!(client.setpoint_max(), 65);
        assert!(!client.authorized());
    }

    #[test]
    fn test_modes_follow_features() {
        let client = offline_client();
        assert_eq!(client.modes(), vec![Mode::Setpoint, Mode::Timer, Mode::Standby, Mode::Holiday]);

        seed(&client, json!({"features": {"f-pv-panel": true}}));
        assert_eq!(client.modes(), vec![Mode::Setpoint, Mode::Timer, Mode::Solar, Mode::Holiday]);

        seed(&client, json!({"features": {"f-pv-panel": false, "f-collector": false}}));
        assert_eq!(client.modes()[2], Mode::Standby);
    }

    #[test]
    fn test_features_map() {
        let client = offline_client();
        seed(&client, json!({"features": {"f-collector": true, "f-lowpower": 0}}));

        let features = client.features();
        assert_eq!(features.get("f-collector"), Some(&true));
        assert_eq!(features.get("f-lowpower"), Some(&false));
        assert!(client.has_feature("f-collector"));
        assert!(!client.has_feature("f-lowpower"));
        assert!(!client.has_feature("f-missing"));
    }

    #[test]
    fn test_fractional_readings() {
        let client = offline_client();
        seed(&client, json!({"tank-temp": 45.9, "collector-temp": 61.2, "setpoint-max": 62.5}));

        assert_eq!(client.tank_temp(), 46);
        assert_eq!(client.collector_temp(), 61);
        assert_eq!(client.setpoint_max(), 62);
        assert_eq!(client.get_key("tank-temp"), Some(json!(45.9)));
    }

    #[test]
    fn test_flag_serialization() {
        assert_eq!(serde_json::to_value(Flag::from(true)).unwrap(), json!(true));
        assert_eq!(serde_json::to_value(Flag::from(1)).unwrap(), json!(1));
    }

    #[test]
    fn test_subscriptions() {
        let client = offline_client();
        client.subscribe_keys(["element-seconds", "lowpower-enable"]);
        client.subscribe_keys(vec!["element-seconds".to_string()]);
        assert_eq!(client.subscribed_keys(), vec!["element-seconds", "lowpower-enable"]);

        client.unsubscribe_keys(["lowpower-enable"]);
        assert_eq!(client.subscribed_keys(), vec!["element-seconds"]);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected_offline() {
        // Nothing listens on this client's endpoint, so any request would error
        let client = offline_client();
        assert!(!client.set_setpoint(29).await.unwrap());
        assert!(!client.set_setpoint(66).await.unwrap());
        assert!(!client.set_external_setpoint(70).await.unwrap());
        assert!(!client.set_mode("BOOST").await.unwrap());
    }
}
