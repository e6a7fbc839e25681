use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Token: POST https://id.rapt.io/connect/token  (password grant)
// ---------------------------------------------------------------------------

/// Fixed OAuth client identifier the RAPT identity server expects.
pub const CLIENT_ID: &str = "rapt-user";

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub grant_type: &'a str,
    pub username: &'a str,
    /// The account's API secret, sent as the grant password.
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Validity period in **seconds**.
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

// ---------------------------------------------------------------------------
// DeviceType
// ---------------------------------------------------------------------------

/// Device categories exposed by the bonded-devices listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    /// BLE temperature probe; carries its reading inline.
    BleTemperature,
    TemperatureController,
    FermentationChamber,
    Hydrometer,
    /// BrewZilla kettle controller.
    BrewZilla,
    Unknown(String),
}

impl DeviceType {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::BleTemperature => "BLETemperature",
            DeviceType::TemperatureController => "TemperatureController",
            DeviceType::FermentationChamber => "FermentationChamber",
            DeviceType::Hydrometer => "Hydrometer",
            DeviceType::BrewZilla => "BrewZilla",
            DeviceType::Unknown(other) => other,
        }
    }

    /// Path (without base URL) of the telemetry endpoint for a device of this
    /// category, looked up in [`TELEMETRY_ENDPOINTS`].
    pub fn telemetry_path(&self, device_id: &str) -> String {
        let prefix = TELEMETRY_ENDPOINTS
            .iter()
            .find(|(name, _)| *name == self.as_str())
            .map(|(_, prefix)| *prefix)
            .unwrap_or(GENERIC_TELEMETRY_ENDPOINT);
        let id: String = url::form_urlencoded::byte_serialize(device_id.as_bytes()).collect();
        format!("{prefix}{id}")
    }
}

impl From<String> for DeviceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "BLETemperature" => DeviceType::BleTemperature,
            "TemperatureController" => DeviceType::TemperatureController,
            "FermentationChamber" => DeviceType::FermentationChamber,
            "Hydrometer" => DeviceType::Hydrometer,
            "BrewZilla" => DeviceType::BrewZilla,
            _ => DeviceType::Unknown(s),
        }
    }
}

impl From<DeviceType> for String {
    fn from(t: DeviceType) -> Self {
        t.as_str().to_owned()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category telemetry endpoints; the device id is appended.
pub const TELEMETRY_ENDPOINTS: &[(&str, &str)] = &[
    (
        "BLETemperature",
        "/api/BondedDevices/GetBondedDevice?bondedDeviceId=",
    ),
    (
        "TemperatureController",
        "/api/TemperatureControllers/GetTemperatureController?temperatureControllerId=",
    ),
    (
        "FermentationChamber",
        "/api/FermentationChambers/GetFermentationChamber?fermentationChamberId=",
    ),
    ("Hydrometer", "/api/Hydrometers/GetHydrometer?hydrometerId="),
    ("BrewZilla", "/api/BrewZillas/GetBrewZilla?brewZillaId="),
];

/// Used for categories missing from [`TELEMETRY_ENDPOINTS`].
pub const GENERIC_TELEMETRY_ENDPOINT: &str = "/api/BondedDevices/GetBondedDevice?bondedDeviceId=";

/// Listing of every device bonded to the account.
pub const BONDED_DEVICES_PATH: &str = "/api/BondedDevices/GetBondedDevices";

// ---------------------------------------------------------------------------
// Device: GET /api/BondedDevices/GetBondedDevices
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceFields {
    id: Value,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    device_type: DeviceType,
    #[serde(default)]
    temperature: Option<f64>,
}

/// A bonded device. Keeps the raw record so it can double as a telemetry
/// payload for categories that report inline.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub mac_address: Option<String>,
    pub name: Option<String>,
    pub device_type: DeviceType,
    /// Inline current temperature, when the listing carries one.
    pub temperature: Option<f64>,
    pub raw: Value,
}

impl TryFrom<Value> for Device {
    type Error = serde_json::Error;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let fields = DeviceFields::deserialize(&raw)?;
        let id = match fields.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Self {
            id,
            mac_address: fields.mac_address,
            name: fields.name,
            device_type: fields.device_type,
            temperature: fields.temperature,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn device_type_known_names_roundtrip() {
        for name in [
            "BLETemperature",
            "TemperatureController",
            "FermentationChamber",
            "Hydrometer",
            "BrewZilla",
        ] {
            let t = DeviceType::from(name.to_owned());
            assert!(!matches!(t, DeviceType::Unknown(_)), "{name} should be known");
            assert_eq!(t.as_str(), name);
        }
    }

    #[test]
    fn device_type_unknown_keeps_name() {
        let t: DeviceType = serde_json::from_value(json!("CanBridge")).unwrap();
        assert_eq!(t, DeviceType::Unknown("CanBridge".to_owned()));
        assert_eq!(t.to_string(), "CanBridge");
    }

    #[test]
    fn telemetry_path_uses_table_then_generic() {
        assert_eq!(
            DeviceType::Hydrometer.telemetry_path("h1"),
            "/api/Hydrometers/GetHydrometer?hydrometerId=h1"
        );
        assert_eq!(
            DeviceType::BrewZilla.telemetry_path("b1"),
            "/api/BrewZillas/GetBrewZilla?brewZillaId=b1"
        );
        assert_eq!(
            DeviceType::Unknown("CanBridge".to_owned()).telemetry_path("x"),
            "/api/BondedDevices/GetBondedDevice?bondedDeviceId=x"
        );
    }

    #[test]
    fn telemetry_path_encodes_device_id() {
        assert_eq!(
            DeviceType::Hydrometer.telemetry_path("a&b=c#d?e f"),
            "/api/Hydrometers/GetHydrometer?hydrometerId=a%26b%3Dc%23d%3Fe+f"
        );
    }

    #[test]
    fn device_parses_listing_record() {
        let raw = json!({
            "id": "2b1e",
            "macAddress": "AA:BB:CC:DD:EE:FF",
            "name": "Probe",
            "deviceType": "BLETemperature",
            "temperature": 18.7,
            "battery": 90
        });
        let device = Device::try_from(raw.clone()).unwrap();
        assert_eq!(device.id, "2b1e");
        assert_eq!(device.mac_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(device.device_type, DeviceType::BleTemperature);
        assert_eq!(device.temperature, Some(18.7));
        assert_eq!(device.raw, raw);
    }

    #[test]
    fn device_numeric_id_is_stringified() {
        let device = Device::try_from(json!({"id": 42, "deviceType": "Hydrometer"})).unwrap();
        assert_eq!(device.id, "42");
        assert!(device.mac_address.is_none());
    }

    #[test]
    fn device_without_type_is_rejected() {
        assert!(Device::try_from(json!({"id": "x"})).is_err());
    }

    #[test]
    fn token_response_deserializes() {
        let t: TokenResponse = serde_json::from_value(json!({
            "access_token": "abc",
            "expires_in": 3600,
            "token_type": "Bearer"
        }))
        .unwrap();
        assert_eq!(t.access_token, "abc");
        assert_eq!(t.expires_in, 3600);
        assert_eq!(t.token_type.as_deref(), Some("Bearer"));
    }
}
