//! Data access functions.
//!
//! One fetch per dashboard entity, all following the same contract: serve
//! generated data immediately when the backend is unconfigured, query the
//! live backend otherwise, and fall back to generated data on any error.
//! These functions always resolve with a value; they cannot fail.

use super::mockgen;
use super::models::*;
use crate::backend::{param, tables, BackendApi, BackendError, Param};

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Queried from the live backend.
    Live,
    /// Generated locally, either because no backend is configured or because
    /// the live query failed.
    Fallback,
}

/// A value that always exists, tagged with its provenance.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Fetched<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            source: Source::Live,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            source: Source::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// Latest realtime reading, optionally scoped to one station.
pub async fn realtime_power(
    backend: &dyn BackendApi,
    station: Option<i64>,
) -> Fetched<Option<RealtimeReading>> {
    if !backend.is_configured() {
        return Fetched::fallback(Some(mockgen::mock_realtime_reading()));
    }

    let mut query = vec![
        param("select", "*"),
        param("order", "timestamp.desc"),
        param("limit", "1"),
    ];
    push_station_filter(&mut query, station);

    match fetch::<RealtimeReading>(backend, tables::REALTIME_READINGS, &query).await {
        Ok(rows) => Fetched::live(rows.into_iter().next()),
        Err(e) => {
            tracing::error!("Realtime query failed, serving generated data: {e}");
            Fetched::fallback(Some(mockgen::mock_realtime_reading()))
        }
    }
}

/// Today's cumulative summary. With no station filter the per-station rows
/// are aggregated: energies, revenue and CO₂ sum, peak power takes the
/// maximum, efficiency averages.
pub async fn today_summary(
    backend: &dyn BackendApi,
    station: Option<i64>,
) -> Fetched<Option<DailySummary>> {
    if !backend.is_configured() {
        return Fetched::fallback(Some(mockgen::mock_daily_summary()));
    }

    let today = Utc::now().date_naive();
    let mut query = vec![param("select", "*"), param("date", format!("eq.{today}"))];
    push_station_filter(&mut query, station);

    match fetch::<DailySummary>(backend, tables::DAILY_SUMMARIES, &query).await {
        Ok(rows) => {
            let value = if station.is_none() && !rows.is_empty() {
                Some(aggregate_summaries(&rows))
            } else {
                rows.into_iter().next()
            };
            Fetched::live(value)
        }
        Err(e) => {
            tracing::error!("Summary query failed, serving generated data: {e}");
            Fetched::fallback(Some(mockgen::mock_daily_summary()))
        }
    }
}

/// Inverter fleet ordered by device code.
pub async fn inverters_status(
    backend: &dyn BackendApi,
    station: Option<i64>,
) -> Fetched<Vec<Inverter>> {
    if !backend.is_configured() {
        return Fetched::fallback(mockgen::mock_inverters());
    }

    let mut query = vec![param("select", "*"), param("order", "inverter_code")];
    push_station_filter(&mut query, station);

    match fetch::<Inverter>(backend, tables::INVERTERS, &query).await {
        Ok(rows) => Fetched::live(rows),
        Err(e) => {
            tracing::error!("Inverter query failed, serving generated data: {e}");
            Fetched::fallback(mockgen::mock_inverters())
        }
    }
}

/// Active alerts, newest first, with the owning station's name embedded.
pub async fn active_alerts(backend: &dyn BackendApi, limit: usize) -> Fetched<Vec<Alert>> {
    if !backend.is_configured() {
        return Fetched::fallback(mockgen::mock_alerts());
    }

    let query = [
        param("select", "*,stations(name)"),
        param("status", "eq.active"),
        param("order", "created_at.desc"),
        param("limit", limit.to_string()),
    ];

    match backend.rows(tables::ALERTS, &query).await.and_then(parse_alerts) {
        Ok(alerts) => Fetched::live(alerts),
        Err(e) => {
            tracing::error!("Alert query failed, serving generated data: {e}");
            Fetched::fallback(mockgen::mock_alerts())
        }
    }
}

/// Power trend over the trailing 24 hours: raw readings re-bucketed by hour
/// of day, averaged per bucket, ascending by hour.
pub async fn trend_24h(backend: &dyn BackendApi, station: Option<i64>) -> Fetched<Vec<TrendPoint>> {
    if !backend.is_configured() {
        return Fetched::fallback(mockgen::mock_trend_24h());
    }

    let since = Utc::now() - Duration::hours(24);
    let mut query = vec![
        param("select", "timestamp,current_power_kw"),
        param("timestamp", format!("gte.{}", since.to_rfc3339())),
        param("order", "timestamp.asc"),
    ];
    push_station_filter(&mut query, station);

    match fetch::<RawSample>(backend, tables::REALTIME_READINGS, &query).await {
        Ok(samples) => Fetched::live(bucket_hourly(&samples)),
        Err(e) => {
            tracing::error!("Trend query failed, serving generated data: {e}");
            Fetched::fallback(mockgen::mock_trend_24h())
        }
    }
}

/// All active stations. Unlike the dashboard fetches this does not fall back
/// to generated data on a live error; an empty list keeps downstream writers
/// from fabricating rows for stations that may not exist.
pub async fn all_stations(backend: &dyn BackendApi) -> Vec<Station> {
    if !backend.is_configured() {
        return mockgen::mock_stations();
    }

    let query = [param("select", "*"), param("status", "eq.active")];
    match fetch::<Station>(backend, tables::STATIONS, &query).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Station query failed: {e}");
            Vec::new()
        }
    }
}

fn push_station_filter(query: &mut Vec<Param>, station: Option<i64>) {
    if let Some(id) = station {
        query.push(param("station_id", format!("eq.{id}")));
    }
}

async fn fetch<T: DeserializeOwned>(
    backend: &dyn BackendApi,
    table: &str,
    query: &[Param],
) -> Result<Vec<T>, BackendError> {
    let rows = backend.rows(table, query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::Decode))
        .collect()
}

fn parse_alerts(rows: Vec<Value>) -> Result<Vec<Alert>, BackendError> {
    rows.into_iter()
        .map(|row| {
            let embedded_name = row
                .get("stations")
                .and_then(|s| s.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let mut alert: Alert = serde_json::from_value(row)?;
            if alert.station_name.is_none() {
                alert.station_name = embedded_name;
            }
            Ok(alert)
        })
        .collect()
}

fn aggregate_summaries(rows: &[DailySummary]) -> DailySummary {
    let count = rows.len() as f64;
    DailySummary {
        total_energy_kwh: rows.iter().map(|r| r.total_energy_kwh).sum(),
        revenue: rows.iter().map(|r| r.revenue).sum(),
        co2_offset_ton: rows.iter().map(|r| r.co2_offset_ton).sum(),
        peak_power_kw: rows.iter().map(|r| r.peak_power_kw).fold(0.0, f64::max),
        average_efficiency: rows.iter().map(|r| r.average_efficiency).sum::<f64>() / count,
    }
}

#[derive(Debug, Deserialize)]
struct RawSample {
    timestamp: DateTime<Utc>,
    current_power_kw: f64,
}

fn bucket_hourly(samples: &[RawSample]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<u32, (f64, u32)> = BTreeMap::new();

    for sample in samples {
        let entry = buckets.entry(sample.timestamp.hour()).or_insert((0.0, 0));
        entry.0 += sample.current_power_kw;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(hour, (sum, n))| TrendPoint {
            time: format!("{hour}:00"),
            value: (sum / n as f64).round() as i64,
        })
        .collect()
}
