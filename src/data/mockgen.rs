//! Mock data generator.
//!
//! Synthesizes plausible readings when no live backend is available. Values
//! are randomized but shape-identical to live rows, and the 24-hour trend
//! follows a triangular daylight curve so the dashboard still looks like a
//! solar site.

use super::models::*;

use chrono::{Duration, Timelike, Utc};
use rand::Rng;

/// Alert messages the generator picks from.
const ALERT_MESSAGES: [&str; 4] = [
    "Inverter temperature above normal range",
    "Generation efficiency below forecast",
    "Device maintenance due",
    "Weather conditions limiting output",
];

const ALERT_LEVELS: [AlertLevel; 3] = [AlertLevel::Info, AlertLevel::Warning, AlertLevel::Critical];

/// Inverter model reported for generated devices.
pub const MOCK_INVERTER_MODEL: &str = "SUN2000-100KTL";

pub fn mock_realtime_reading() -> RealtimeReading {
    let mut rng = rand::thread_rng();
    RealtimeReading {
        id: Utc::now().timestamp_millis(),
        station_id: 1,
        current_power_kw: rng.gen_range(0.0..100.0),
        voltage_v: 220.0 + rng.gen_range(0.0..20.0),
        current_a: 100.0 + rng.gen_range(0.0..50.0),
        temperature_c: 25.0 + rng.gen_range(0.0..15.0),
        efficiency_percent: 85.0 + rng.gen_range(0.0..10.0),
        timestamp: Utc::now(),
    }
}

/// Independent display placeholders; no cross-field consistency is intended.
pub fn mock_daily_summary() -> DailySummary {
    let mut rng = rand::thread_rng();
    DailySummary {
        total_energy_kwh: rng.gen_range(0.0..10_000.0),
        revenue: rng.gen_range(0.0..8_000.0),
        co2_offset_ton: rng.gen_range(0.0..7.0),
        peak_power_kw: rng.gen_range(0.0..150.0),
        average_efficiency: 85.0 + rng.gen_range(0.0..10.0),
    }
}

pub fn mock_inverters() -> Vec<Inverter> {
    let mut rng = rand::thread_rng();
    (1..=4)
        .map(|i| Inverter {
            id: i,
            station_id: 1,
            inverter_code: format!("INV-{i:03}"),
            model: MOCK_INVERTER_MODEL.to_string(),
            status: if rng.gen_bool(0.8) {
                InverterStatus::Normal
            } else {
                InverterStatus::Warning
            },
            current_power_kw: rng.gen_range(0.0..100.0),
            temperature_c: 30.0 + rng.gen_range(0.0..20.0),
            efficiency_percent: 90.0 + rng.gen_range(0.0..8.0),
            last_update: Utc::now(),
        })
        .collect()
}

pub fn mock_alerts() -> Vec<Alert> {
    let mut rng = rand::thread_rng();
    (1..=3)
        .map(|i| {
            let station = rng.gen_range(1..=4);
            Alert {
                id: i,
                station_id: station,
                level: ALERT_LEVELS[rng.gen_range(0..ALERT_LEVELS.len())],
                message: ALERT_MESSAGES[rng.gen_range(0..ALERT_MESSAGES.len())].to_string(),
                status: AlertStatus::Active,
                created_at: Utc::now() - Duration::seconds(rng.gen_range(0..86_400)),
                station_name: Some(format!("Station {station}")),
            }
        })
        .collect()
}

/// One point per hour of the trailing 24 hours, oldest first. Hour labels
/// wrap across midnight.
pub fn mock_trend_24h() -> Vec<TrendPoint> {
    let mut rng = rand::thread_rng();
    let current_hour = Utc::now().hour() as i64;

    (0..24)
        .map(|i| {
            let hour = (current_hour - 24 + i + 1).rem_euclid(24) as u32;
            let value = daylight_power(hour, rng.gen_range(0.0..1.0));
            TrendPoint {
                time: format!("{hour}:00"),
                value: value.round() as i64,
            }
        })
        .collect()
}

/// Triangular daylight curve with jitter: zero outside 06:00-18:00, peaking
/// at noon. `jitter` is in [0, 1) and scales output between 80% and 100%.
pub fn daylight_power(hour: u32, jitter: f64) -> f64 {
    if !(6..=18).contains(&hour) {
        return 0.0;
    }
    let diff = (hour as f64 - 12.0).abs();
    ((100.0 - diff * 15.0) * (0.8 + 0.2 * jitter)).max(0.0)
}

/// Demo stations shown when no backend is configured.
pub fn mock_stations() -> Vec<Station> {
    vec![
        Station {
            id: 1,
            name: "Solar Station 1".to_string(),
            kind: StationKind::Solar,
            capacity_mw: 50.0,
            status: "active".to_string(),
        },
        Station {
            id: 2,
            name: "Wind Station 2".to_string(),
            kind: StationKind::Wind,
            capacity_mw: 30.0,
            status: "active".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_reading_ranges() {
        for _ in 0..50 {
            let r = mock_realtime_reading();
            assert!((0.0..100.0).contains(&r.current_power_kw));
            assert!((220.0..240.0).contains(&r.voltage_v));
            assert!((100.0..150.0).contains(&r.current_a));
            assert!((25.0..40.0).contains(&r.temperature_c));
            assert!((85.0..95.0).contains(&r.efficiency_percent));
        }
    }

    #[test]
    fn test_inverter_fleet_shape() {
        let inverters = mock_inverters();
        assert_eq!(inverters.len(), 4);
        assert_eq!(inverters[0].inverter_code, "INV-001");
        assert_eq!(inverters[3].inverter_code, "INV-004");
        for inv in &inverters {
            assert_ne!(inv.status, InverterStatus::Offline);
        }
    }

    #[test]
    fn test_alerts_created_within_last_day() {
        let now = Utc::now();
        for alert in mock_alerts() {
            assert_eq!(alert.status, AlertStatus::Active);
            assert!(alert.created_at <= now);
            assert!(now - alert.created_at <= Duration::days(1));
            assert_ne!(alert.level, AlertLevel::Error);
        }
    }

    #[test]
    fn test_daylight_curve_zero_outside_daylight() {
        for hour in [0, 1, 2, 3, 4, 5, 19, 20, 21, 22, 23] {
            assert_eq!(daylight_power(hour, 0.99), 0.0);
        }
        assert!(daylight_power(12, 0.0) > 0.0);
    }

    #[test]
    fn test_trend_covers_trailing_24_hours() {
        let trend = mock_trend_24h();
        assert_eq!(trend.len(), 24);

        // Every hour of the day appears exactly once, labels wrap midnight.
        let mut hours: Vec<u32> = trend
            .iter()
            .map(|p| p.time.trim_end_matches(":00").parse().unwrap())
            .collect();
        hours.sort_unstable();
        assert_eq!(hours, (0..24).collect::<Vec<_>>());

        for p in &trend {
            let hour: u32 = p.time.trim_end_matches(":00").parse().unwrap();
            if !(6..=18).contains(&hour) {
                assert_eq!(p.value, 0, "hour {hour} should be dark");
            }
            if hour == 12 {
                assert!(p.value > 0, "noon must be strictly positive");
            }
        }
    }
}
