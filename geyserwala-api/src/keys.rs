//! Device value keys
//!
//! Names used in `GET api/value?f=...` and `PATCH api/value` bodies.

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const VERSION: &str = "version";
pub const FEATURES: &str = "features";
pub const TIME: &str = "time";

pub const STATUS: &str = "status";
pub const TANK_TEMP: &str = "tank-temp";
pub const ELEMENT_DEMAND: &str = "element-demand";
pub const ELEMENT_SECONDS: &str = "element-seconds";
pub const COLLECTOR_TEMP: &str = "collector-temp";
pub const PUMP_STATUS: &str = "pump-status";

pub const MODE: &str = "mode";
pub const SETPOINT: &str = "setpoint";
pub const SETPOINT_MAX: &str = "setpoint-max";
pub const BOOST_DEMAND: &str = "boost-demand";
pub const LOWPOWER_ENABLE: &str = "lowpower-enable";

pub const EXTERNAL_SETPOINT: &str = "external-setpoint";
pub const EXTERNAL_DEMAND: &str = "external-demand";
pub const EXTERNAL_DISABLE: &str = "external-disable";

/// Feature flag reported when a solar collector is fitted
pub const FEATURE_COLLECTOR: &str = "f-collector";
/// Feature flag reported when a PV panel is fitted
pub const FEATURE_PV_PANEL: &str = "f-pv-panel";

pub const INFO_KEYS: &[&str] = &[ID, NAME, VERSION, FEATURES, TIME];
pub const STATUS_KEYS: &[&str] = &[STATUS, TANK_TEMP, ELEMENT_DEMAND, COLLECTOR_TEMP, PUMP_STATUS];
pub const MANUAL_KEYS: &[&str] = &[MODE, SETPOINT, SETPOINT_MAX, BOOST_DEMAND];
pub const INTEGRATION_KEYS: &[&str] = &[EXTERNAL_SETPOINT, EXTERNAL_DEMAND, EXTERNAL_DISABLE];

/// Every key refreshed by `update_status()`, in request order
pub fn base_keys() -> Vec<&'static str> {
    INFO_KEYS
        .iter()
        .chain(STATUS_KEYS)
        .chain(MANUAL_KEYS)
        .chain(INTEGRATION_KEYS)
        .copied()
        .collect()
}
