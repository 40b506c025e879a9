//! Dashboard model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An instantaneous power reading for one station. The latest row by
/// timestamp is the station's "current" reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeReading {
    pub id: i64,
    pub station_id: i64,
    pub current_power_kw: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub temperature_c: f64,
    pub efficiency_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative figures for the current day. Upserted per (station, date) as
/// the day progresses; this type carries the display shape, the station and
/// date keys live at the query boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub total_energy_kwh: f64,
    pub revenue: f64,
    pub co2_offset_ton: f64,
    pub peak_power_kw: f64,
    pub average_efficiency: f64,
}

/// Operating status of an inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InverterStatus {
    Normal,
    Warning,
    Offline,
}

/// A power-conversion device reporting its own telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inverter {
    pub id: i64,
    pub station_id: i64,
    pub inverter_code: String,
    pub model: String,
    pub status: InverterStatus,
    pub current_power_kw: f64,
    pub temperature_c: f64,
    pub efficiency_percent: f64,
    pub last_update: DateTime<Utc>,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
    Error,
}

/// Alert lifecycle state. Alerts transition status but are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub station_id: i64,
    pub level: AlertLevel,
    pub message: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub station_name: Option<String>,
}

/// One hourly bucket of the 24-hour power trend. Derived, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Hour label, `"14:00"` style.
    pub time: String,
    pub value: i64,
}

/// A physical generation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub kind: StationKind,
    pub capacity_mw: f64,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Solar,
    Wind,
}

/// The unified snapshot exposed to the UI.
///
/// `error` is populated only when fetch orchestration itself fails; data
/// access functions self-heal via mock fallback and never surface errors.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub realtime: Option<RealtimeReading>,
    pub summary: Option<DailySummary>,
    pub inverters: Vec<Inverter>,
    pub alerts: Vec<Alert>,
    pub trend: Vec<TrendPoint>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for DashboardData {
    fn default() -> Self {
        Self {
            realtime: None,
            summary: None,
            inverters: Vec::new(),
            alerts: Vec::new(),
            trend: Vec::new(),
            loading: true,
            error: None,
        }
    }
}
