//! Timer schedules stored on the device
//!
//! Timers live on the device; the client only holds the copies passed in and
//! out of these calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::session::{is_empty_payload, ApiRequest};
use crate::GeyserwalaClient;

const TIMER_PATH: &str = "api/value/timer";

/// A scheduled setpoint override
///
/// `begin` and `end` are `[hour, minute]`. `dow` holds one flag per day,
/// Sunday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Device-assigned id; 0 until the device has stored the timer
    #[serde(default)]
    pub id: u32,
    pub begin: [u8; 2],
    pub end: [u8; 2],
    pub temp: i64,
    pub dow: [bool; 7],
}

impl Timer {
    /// A timer not yet stored on the device
    pub fn new(begin: (u8, u8), end: (u8, u8), temp: i64, dow: [bool; 7]) -> Self {
        Self {
            id: 0,
            begin: [begin.0, begin.1],
            end: [end.0, end.1],
            temp,
            dow,
        }
    }

    /// Whether the timer runs on `day` (0 = Sunday .. 6 = Saturday)
    pub fn runs_on(&self, day: usize) -> bool {
        self.dow.get(day).copied().unwrap_or(false)
    }
}

fn timer_path(id: u32) -> String {
    format!("{}/{}", TIMER_PATH, id)
}

fn decode_timer(body: Value) -> Result<Timer> {
    serde_json::from_value(body).map_err(|e| ApiError::Response(format!("invalid timer: {}", e)))
}

fn response_id(body: &Value) -> Option<u64> {
    body.get("id").and_then(Value::as_u64)
}

impl GeyserwalaClient {
    /// Store a new timer; returns the id the device assigned
    pub async fn add_timer(&self, timer: &Timer) -> Result<u32> {
        let mut timer = timer.clone();
        timer.id = 0;
        let body = serde_json::to_value(&timer).map_err(|e| ApiError::Response(e.to_string()))?;

        self.session
            .run_authorized(|| async move {
                let response = self.session.request(ApiRequest::post(TIMER_PATH, body)).await?;
                let id = response
                    .as_ref()
                    .and_then(response_id)
                    .ok_or_else(|| ApiError::Response("timer response without 'id'".to_string()))?;
                u32::try_from(id).map_err(|_| ApiError::Response(format!("timer id {} out of range", id)))
            })
            .await
    }

    /// All timers stored on the device
    pub async fn list_timers(&self) -> Result<Vec<Timer>> {
        self.session
            .run_authorized(|| async move {
                match self.session.request(ApiRequest::get(TIMER_PATH)).await? {
                    Some(body) if !is_empty_payload(&body) => serde_json::from_value(body)
                        .map_err(|e| ApiError::Response(format!("invalid timer list: {}", e))),
                    _ => Ok(Vec::new()),
                }
            })
            .await
    }

    pub async fn get_timer(&self, id: u32) -> Result<Timer> {
        self.session
            .run_authorized(|| async move {
                match self.session.request(ApiRequest::get(timer_path(id))).await? {
                    Some(body) => decode_timer(body),
                    None => Err(ApiError::Response(format!("no timer returned for id {}", id))),
                }
            })
            .await
    }

    /// Replace the timer with `timer.id`; returns the device's copy
    ///
    /// Devices that answer with `{success, id}` instead of the timer get the
    /// submitted timer back.
    pub async fn update_timer(&self, timer: &Timer) -> Result<Timer> {
        let body = serde_json::to_value(timer).map_err(|e| ApiError::Response(e.to_string()))?;

        self.session
            .run_authorized(|| async move {
                let response = self
                    .session
                    .request(ApiRequest::put(timer_path(timer.id), body))
                    .await?
                    .ok_or_else(|| ApiError::Response("empty timer update response".to_string()))?;

                if response.get("success") == Some(&Value::Bool(true)) && response.get("begin").is_none() {
                    debug!(id = timer.id, "timer update acknowledged");
                    return Ok(timer.clone());
                }
                decode_timer(response)
            })
            .await
    }

    /// Delete a timer; true iff the device confirms deleting this id
    pub async fn delete_timer(&self, id: u32) -> Result<bool> {
        self.session
            .run_authorized(|| async move {
                let response = self.session.request(ApiRequest::delete(timer_path(id))).await?;
                Ok(response.map_or(false, |body| {
                    body.get("success") == Some(&Value::Bool(true))
                        && response_id(&body) == Some(u64::from(id))
                }))
            })
            .await
    }
}
