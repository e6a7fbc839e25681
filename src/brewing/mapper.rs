//! Normalises whatever a RAPT payload carries into a [`BrewingReading`].
//!
//! All defaults live in [`defaults`]; nothing else in the crate invents
//! placeholder values.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{db::models::BrewingReading, rapt::models::Device};

/// Identifier of the reading served when neither live telemetry nor a stored
/// row is available.
pub const PLACEHOLDER_ID: &str = "fallback-brewing-data";

pub mod defaults {
    /// °C, used when no temperature field is reported anywhere.
    pub const TEMPERATURE: f64 = 20.0;
    /// Malt temperature is derived as temperature + this offset when not reported.
    pub const MALT_OFFSET: f64 = 3.0;
    pub const MODE: &str = "Active";
    /// Watts.
    pub const POWER: i32 = 75;
    pub const BEER_TYPE: &str = "IPA";
    pub const GRAVITY: f64 = 1.045;
    pub const TOTAL: &str = "23L";
    pub const TIME_REMAINING: &str = "5 days";
    pub const PROGRESS: i32 = 85;
}

// ---------------------------------------------------------------------------
// RawTelemetry
// ---------------------------------------------------------------------------

/// The optional fields we understand, pulled tolerantly out of an untyped
/// payload. Numbers sent as strings are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTelemetry {
    pub temperature: Option<f64>,
    pub current_temperature: Option<f64>,
    pub malt_temperature: Option<f64>,
    pub mode: Option<String>,
    pub heater_power: Option<f64>,
    pub gravity: Option<f64>,
    pub beer_style: Option<String>,
    pub batch_size: Option<String>,
    pub time_remaining: Option<String>,
    pub progress: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawTelemetry {
    pub fn from_value(v: &Value) -> Self {
        Self {
            temperature: number(v, &["temperature"]),
            current_temperature: number(v, &["currentTemperature"]),
            malt_temperature: number(v, &["maltTemperature", "maltTemp"]),
            mode: text(v, &["mode", "state", "status"]),
            heater_power: number(v, &["heaterPower", "heaterUtilisation", "heatingUtilisation"]),
            gravity: number(v, &["gravity", "specificGravity"]).map(normalise_gravity),
            beer_style: text(v, &["beerStyle"]),
            batch_size: number(v, &["batchSize"])
                .map(|litres| format!("{litres}L"))
                .or_else(|| text(v, &["batchSize"])),
            time_remaining: text(v, &["timeRemaining"]),
            progress: number(v, &["progress", "fermentationProgress"]),
            timestamp: text(v, &["lastActivityTime", "timestamp"])
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// First key holding a number (or a string that parses as one).
fn number(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match v.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// First key holding a non-empty string.
fn text(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match v.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    })
}

/// Some devices report gravity in points (1045) instead of SG (1.045).
fn normalise_gravity(g: f64) -> f64 {
    if g > 100.0 {
        g / 1000.0
    } else {
        g
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Build a reading from a payload fetched for `device`.
///
/// Temperature preference: `temperature`, then `currentTemperature`, then the
/// device's inline temperature, then [`defaults::TEMPERATURE`].
pub fn map_to_reading(raw: &RawTelemetry, device: &Device, now: DateTime<Utc>) -> BrewingReading {
    let temperature = raw
        .temperature
        .or(raw.current_temperature)
        .or(device.temperature)
        .unwrap_or(defaults::TEMPERATURE);

    let updated_at = raw.timestamp.unwrap_or(now);

    BrewingReading {
        id: format!("rapt-{}", device.id),
        kettle_temperature: temperature,
        malt_temperature: raw
            .malt_temperature
            .unwrap_or(temperature + defaults::MALT_OFFSET),
        mode: raw.mode.clone().unwrap_or_else(|| defaults::MODE.to_owned()),
        power: raw
            .heater_power
            .map(|p| p.round() as i32)
            .filter(|p| *p >= 0)
            .unwrap_or(defaults::POWER),
        time_gmt: updated_at.format("%H:%M:%S").to_string(),
        fermenter_beer_type: raw
            .beer_style
            .clone()
            .unwrap_or_else(|| defaults::BEER_TYPE.to_owned()),
        fermenter_temperature: temperature,
        fermenter_gravity: raw.gravity.unwrap_or(defaults::GRAVITY),
        fermenter_total: raw
            .batch_size
            .clone()
            .unwrap_or_else(|| defaults::TOTAL.to_owned()),
        fermenter_time_remaining: raw
            .time_remaining
            .clone()
            .unwrap_or_else(|| defaults::TIME_REMAINING.to_owned()),
        fermenter_progress: raw
            .progress
            .map(|p| p.round().clamp(0.0, 100.0) as i32)
            .unwrap_or(defaults::PROGRESS),
        updated_at,
    }
}

impl BrewingReading {
    /// Last-resort reading when nothing live or stored is available.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            id: PLACEHOLDER_ID.to_owned(),
            kettle_temperature: defaults::TEMPERATURE,
            malt_temperature: defaults::TEMPERATURE + defaults::MALT_OFFSET,
            mode: defaults::MODE.to_owned(),
            power: defaults::POWER,
            time_gmt: now.format("%H:%M:%S").to_string(),
            fermenter_beer_type: defaults::BEER_TYPE.to_owned(),
            fermenter_temperature: defaults::TEMPERATURE,
            fermenter_gravity: defaults::GRAVITY,
            fermenter_total: defaults::TOTAL.to_owned(),
            fermenter_time_remaining: defaults::TIME_REMAINING.to_owned(),
            fermenter_progress: defaults::PROGRESS,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn probe(temp: Option<f64>) -> Device {
        let mut raw = json!({"id": "p1", "deviceType": "BLETemperature"});
        if let Some(t) = temp {
            raw["temperature"] = json!(t);
        }
        Device::try_from(raw).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 5).unwrap()
    }

    #[test]
    fn inline_probe_scenario() {
        let device = probe(Some(18.7));
        let raw = RawTelemetry::from_value(&device.raw);
        let reading = map_to_reading(&raw, &device, now());

        assert_eq!(reading.id, "rapt-p1");
        assert_eq!(reading.fermenter_temperature, 18.7);
        assert_eq!(reading.kettle_temperature, 18.7);
        assert_eq!(reading.malt_temperature, 18.7 + defaults::MALT_OFFSET);
        assert_eq!(reading.updated_at, now());
        assert_eq!(reading.time_gmt, "14:30:05");
    }

    #[test]
    fn temperature_preference_order() {
        let device = probe(Some(10.0));

        let both = RawTelemetry::from_value(&json!({"temperature": 21.0, "currentTemperature": 22.0}));
        assert_eq!(map_to_reading(&both, &device, now()).fermenter_temperature, 21.0);

        let current = RawTelemetry::from_value(&json!({"currentTemperature": 22.0}));
        assert_eq!(map_to_reading(&current, &device, now()).fermenter_temperature, 22.0);

        let none = RawTelemetry::default();
        assert_eq!(map_to_reading(&none, &device, now()).fermenter_temperature, 10.0);

        let nothing = map_to_reading(&none, &probe(None), now());
        assert_eq!(nothing.fermenter_temperature, defaults::TEMPERATURE);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let reading = map_to_reading(&RawTelemetry::default(), &probe(None), now());
        assert_eq!(reading.mode, defaults::MODE);
        assert_eq!(reading.power, defaults::POWER);
        assert_eq!(reading.fermenter_gravity, defaults::GRAVITY);
        assert_eq!(reading.fermenter_beer_type, defaults::BEER_TYPE);
        assert_eq!(reading.fermenter_total, defaults::TOTAL);
        assert_eq!(reading.fermenter_time_remaining, defaults::TIME_REMAINING);
        assert_eq!(reading.fermenter_progress, defaults::PROGRESS);
    }

    #[test]
    fn reported_fields_are_mapped() {
        let raw = RawTelemetry::from_value(&json!({
            "temperature": "64.5",
            "maltTemperature": 63.0,
            "state": "Mashing",
            "heaterUtilisation": 1800.4,
            "specificGravity": 1052,
            "beerStyle": "Stout",
            "batchSize": 30,
            "timeRemaining": "45 min",
            "progress": 140,
            "lastActivityTime": "2025-03-01T10:15:00Z"
        }));
        let reading = map_to_reading(&raw, &probe(None), now());

        assert_eq!(reading.kettle_temperature, 64.5);
        assert_eq!(reading.malt_temperature, 63.0);
        assert_eq!(reading.mode, "Mashing");
        assert_eq!(reading.power, 1800);
        assert!((reading.fermenter_gravity - 1.052).abs() < 1e-9);
        assert_eq!(reading.fermenter_beer_type, "Stout");
        assert_eq!(reading.fermenter_total, "30L");
        assert_eq!(reading.fermenter_time_remaining, "45 min");
        assert_eq!(reading.fermenter_progress, 100);
        assert_eq!(
            reading.updated_at,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap()
        );
        assert_eq!(reading.time_gmt, "10:15:00");
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let raw = RawTelemetry::from_value(&json!({"timestamp": "yesterday"}));
        assert!(raw.timestamp.is_none());
        assert_eq!(map_to_reading(&raw, &probe(None), now()).updated_at, now());
    }

    #[test]
    fn negative_progress_is_clamped() {
        let raw = RawTelemetry::from_value(&json!({"fermentationProgress": -3}));
        assert_eq!(map_to_reading(&raw, &probe(None), now()).fermenter_progress, 0);
    }

    #[test]
    fn placeholder_uses_sentinel_id_and_defaults() {
        let p = BrewingReading::placeholder(now());
        assert_eq!(p.id, PLACEHOLDER_ID);
        assert_eq!(p.fermenter_progress, defaults::PROGRESS);
        assert!((0..=100).contains(&p.fermenter_progress));
    }
}
