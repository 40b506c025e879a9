//! Ingestion writer.
//!
//! Simulates upstream telemetry: for every active station it appends a
//! realtime reading, rolls the day's summary forward, and refreshes the
//! inverter fleet. Runs from the controller's ingestion timer and from the
//! data-initialization endpoint. No-op without a configured backend.

use super::access;
use super::mockgen::MOCK_INVERTER_MODEL;
use super::models::*;
use crate::backend::{param, tables, BackendApi, BackendError};

use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde_json::json;

/// Write one round of synthetic telemetry for every active station.
pub async fn seed_backend_data(backend: &dyn BackendApi) -> Result<(), BackendError> {
    if !backend.is_configured() {
        return Ok(());
    }

    let stations = access::all_stations(backend).await;
    let today = Utc::now().date_naive();

    for station in stations {
        seed_station(backend, &station, today).await?;
    }

    Ok(())
}

async fn seed_station(
    backend: &dyn BackendApi,
    station: &Station,
    today: NaiveDate,
) -> Result<(), BackendError> {
    let reading = synth_reading(station);

    backend
        .insert(
            tables::REALTIME_READINGS,
            json!({
                "station_id": station.id,
                "current_power_kw": reading.power_kw,
                "voltage_v": reading.voltage_v,
                "current_a": reading.current_a,
                "temperature_c": reading.temperature_c,
                "efficiency_percent": reading.efficiency_percent,
                "timestamp": Utc::now(),
            }),
        )
        .await?;

    roll_summary(backend, station, today, &reading).await?;
    refresh_inverters(backend, station).await?;

    Ok(())
}

/// Advance the (station, date) summary row. Read-then-upsert keeps the row
/// unique per day; repeated rounds accumulate energy and track the peak.
async fn roll_summary(
    backend: &dyn BackendApi,
    station: &Station,
    today: NaiveDate,
    reading: &SynthReading,
) -> Result<(), BackendError> {
    let query = [
        param("select", "*"),
        param("station_id", format!("eq.{}", station.id)),
        param("date", format!("eq.{today}")),
    ];

    let existing: Option<DailySummary> = backend
        .rows(tables::DAILY_SUMMARIES, &query)
        .await?
        .into_iter()
        .next()
        .map(serde_json::from_value)
        .transpose()?;

    let prev_energy = existing.as_ref().map_or(0.0, |s| s.total_energy_kwh);
    let prev_peak = existing.as_ref().map_or(0.0, |s| s.peak_power_kw);

    // Readings arrive every 5 minutes in production, so one reading adds
    // power/12 kWh.
    let energy = prev_energy + reading.power_kw / 12.0;

    backend
        .upsert(
            tables::DAILY_SUMMARIES,
            json!({
                "station_id": station.id,
                "date": today,
                "total_energy_kwh": energy,
                "revenue": energy * 0.85,
                "co2_offset_ton": energy * 0.0007,
                "peak_power_kw": prev_peak.max(reading.power_kw),
                "average_efficiency": reading.efficiency_percent,
            }),
            "station_id,date",
        )
        .await
}

/// Create the station's four-inverter fleet on first contact, update each
/// device's telemetry afterwards.
async fn refresh_inverters(
    backend: &dyn BackendApi,
    station: &Station,
) -> Result<(), BackendError> {
    let query = [
        param("select", "*"),
        param("station_id", format!("eq.{}", station.id)),
    ];
    let rows = backend.rows(tables::INVERTERS, &query).await?;

    if rows.is_empty() {
        for i in 1..=4 {
            let telemetry = synth_inverter_telemetry();
            backend
                .insert(
                    tables::INVERTERS,
                    json!({
                        "station_id": station.id,
                        "inverter_code": format!("INV-{}-{i:02}", station.id),
                        "model": MOCK_INVERTER_MODEL,
                        "status": telemetry.status,
                        "current_power_kw": telemetry.power_kw,
                        "temperature_c": telemetry.temperature_c,
                        "efficiency_percent": telemetry.efficiency_percent,
                        "last_update": Utc::now(),
                    }),
                )
                .await?;
        }
        return Ok(());
    }

    for row in rows {
        let inverter: Inverter = serde_json::from_value(row)?;
        let telemetry = synth_inverter_telemetry();
        backend
            .update(
                tables::INVERTERS,
                &[param("id", format!("eq.{}", inverter.id))],
                json!({
                    "status": telemetry.status,
                    "current_power_kw": telemetry.power_kw,
                    "temperature_c": telemetry.temperature_c,
                    "efficiency_percent": telemetry.efficiency_percent,
                    "last_update": Utc::now(),
                }),
            )
            .await?;
    }

    Ok(())
}

struct SynthReading {
    power_kw: f64,
    voltage_v: f64,
    current_a: f64,
    temperature_c: f64,
    efficiency_percent: f64,
}

// Random values are drawn outside the async calls; ThreadRng is not Send.
fn synth_reading(station: &Station) -> SynthReading {
    let mut rng = rand::thread_rng();
    SynthReading {
        power_kw: rng.gen_range(0.0..1.0) * station.capacity_mw * 1000.0 * 0.8,
        voltage_v: 220.0 + rng.gen_range(0.0..20.0),
        current_a: 100.0 + rng.gen_range(0.0..50.0),
        temperature_c: 25.0 + rng.gen_range(0.0..15.0),
        efficiency_percent: 85.0 + rng.gen_range(0.0..10.0),
    }
}

struct SynthTelemetry {
    status: InverterStatus,
    power_kw: f64,
    temperature_c: f64,
    efficiency_percent: f64,
}

fn synth_inverter_telemetry() -> SynthTelemetry {
    let mut rng = rand::thread_rng();
    SynthTelemetry {
        status: if rng.gen_bool(0.9) {
            InverterStatus::Normal
        } else {
            InverterStatus::Warning
        },
        power_kw: rng.gen_range(0.0..100.0),
        temperature_c: 30.0 + rng.gen_range(0.0..20.0),
        efficiency_percent: 90.0 + rng.gen_range(0.0..8.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::StubBackend;
    use crate::backend::MockBackend;
    use serde_json::Value;

    fn station_row() -> Value {
        json!({
            "id": 1,
            "name": "Solar Station 1",
            "kind": "solar",
            "capacity_mw": 50.0,
            "status": "active",
        })
    }

    #[tokio::test]
    async fn test_seed_is_noop_without_backend() {
        let backend = MockBackend::new();
        seed_backend_data(&backend).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_creates_fleet_and_rolls_summary() {
        let backend =
            StubBackend::new().with_rows(tables::STATIONS, vec![station_row()]);

        seed_backend_data(&backend).await.unwrap();

        let inserts = backend.inserts();
        let readings: Vec<_> = inserts
            .iter()
            .filter(|(table, _)| table == tables::REALTIME_READINGS)
            .collect();
        let inverters: Vec<_> = inserts
            .iter()
            .filter(|(table, _)| table == tables::INVERTERS)
            .collect();
        assert_eq!(readings.len(), 1);
        assert_eq!(inverters.len(), 4);
        assert_eq!(
            inverters[0].1["inverter_code"].as_str().unwrap(),
            "INV-1-01"
        );

        let upserts = backend.upserts();
        assert_eq!(upserts.len(), 1);
        let (table, row, on_conflict) = &upserts[0];
        assert_eq!(table, tables::DAILY_SUMMARIES);
        assert_eq!(on_conflict, "station_id,date");

        let power = readings[0].1["current_power_kw"].as_f64().unwrap();
        let energy = row["total_energy_kwh"].as_f64().unwrap();
        assert!((energy - power / 12.0).abs() < 1e-9);
        assert!((row["revenue"].as_f64().unwrap() - energy * 0.85).abs() < 1e-9);
        assert_eq!(row["peak_power_kw"].as_f64().unwrap(), power);
    }

    #[tokio::test]
    async fn test_seed_accumulates_existing_summary() {
        let backend = StubBackend::new()
            .with_rows(tables::STATIONS, vec![station_row()])
            .with_rows(
                tables::DAILY_SUMMARIES,
                vec![json!({
                    "station_id": 1,
                    "date": Utc::now().date_naive(),
                    "total_energy_kwh": 1000.0,
                    "revenue": 850.0,
                    "co2_offset_ton": 0.7,
                    "peak_power_kw": 99_999.0,
                    "average_efficiency": 91.0,
                })],
            );

        seed_backend_data(&backend).await.unwrap();

        let (_, row, _) = &backend.upserts()[0];
        assert!(row["total_energy_kwh"].as_f64().unwrap() > 1000.0);
        assert_eq!(row["peak_power_kw"].as_f64().unwrap(), 99_999.0);
    }

    #[tokio::test]
    async fn test_seed_updates_existing_inverters_in_place() {
        let now = Utc::now();
        let backend = StubBackend::new()
            .with_rows(tables::STATIONS, vec![station_row()])
            .with_rows(
                tables::INVERTERS,
                vec![
                    json!({
                        "id": 11, "station_id": 1, "inverter_code": "INV-1-01",
                        "model": MOCK_INVERTER_MODEL, "status": "normal",
                        "current_power_kw": 10.0, "temperature_c": 35.0,
                        "efficiency_percent": 95.0, "last_update": now,
                    }),
                    json!({
                        "id": 12, "station_id": 1, "inverter_code": "INV-1-02",
                        "model": MOCK_INVERTER_MODEL, "status": "warning",
                        "current_power_kw": 20.0, "temperature_c": 36.0,
                        "efficiency_percent": 94.0, "last_update": now,
                    }),
                ],
            );

        seed_backend_data(&backend).await.unwrap();

        assert_eq!(backend.updates().len(), 2);
        let inverter_inserts = backend
            .inserts()
            .iter()
            .filter(|(table, _)| table == tables::INVERTERS)
            .count();
        assert_eq!(inverter_inserts, 0);
    }
}
