//! Payload records carried by JSON-envelope messages.
//!
//! Field names follow the middleware's camelCase JSON. Missing fields fall
//! back to their defaults so newer middleware versions can add fields.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{ActuationPoint, HandSide, MiddlewareStatus};

// ============================================================================
// Sensor Samples
// ============================================================================

/// Accelerometer sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerometerData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Gyroscope sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GyroscopeData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Time-of-flight distance sample. Not present on TouchDiver Pro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TofData {
    pub distance: u32,
}

/// IMU and distance readings of one thimble (`RAW_DATA`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorData {
    pub accelerometer: AccelerometerData,
    pub gyroscope: GyroscopeData,
    pub time_of_flight: TofData,
}

/// Analog readings of one thimble (`RAW_SENSOR_ON_MASK`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalogSensorRawData {
    /// Raw NTC thermistor reading.
    pub ntc_temperature_raw: f64,
    /// NTC reading converted to degrees Celsius.
    pub ntc_temperature_converted: f64,
    /// Raw force sensor reading.
    pub force_sensing_raw: f64,
    /// Force reading after conversion.
    pub force_sensing_converted: f64,
}

/// Per-thimble readings for one hand, stamped with the message time.
///
/// On the wire the readings are flattened next to `handSide`:
///
/// ```json
/// {"handSide":"RIGHT","index":{...},"thumb":{...}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReadings<T> {
    /// Message timestamp in epoch milliseconds.
    pub timestamp: u64,
    /// Hand the readings come from.
    pub hand_side: HandSide,
    /// Readings keyed by thimble.
    pub sensors: BTreeMap<ActuationPoint, T>,
}

impl<T> SensorReadings<T> {
    /// Creates an empty reading set.
    #[must_use]
    pub fn new(timestamp: u64, hand_side: HandSide) -> Self {
        Self {
            timestamp,
            hand_side,
            sensors: BTreeMap::new(),
        }
    }

    /// Adds a reading for `point`.
    #[must_use]
    pub fn with_sensor(mut self, point: ActuationPoint, sample: T) -> Self {
        self.sensors.insert(point, sample);
        self
    }

    /// Returns the reading for `point`, if present.
    #[inline]
    #[must_use]
    pub fn sensor(&self, point: ActuationPoint) -> Option<&T> {
        self.sensors.get(&point)
    }
}

impl<T> Default for SensorReadings<T> {
    fn default() -> Self {
        Self::new(0, HandSide::Right)
    }
}

/// IMU readings message payload.
pub type RawSensorsData = SensorReadings<SensorData>;

/// Analog readings message payload.
pub type AnalogSensorsData = SensorReadings<AnalogSensorRawData>;

// ============================================================================
// Middleware Status
// ============================================================================

/// Device known to the middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareConnectedDevice {
    pub mac_address: String,
    pub hand_side: HandSide,
}

/// Body of `MW_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiddlewareStatusData {
    pub status: MiddlewareStatus,
    pub version: String,
    pub status_code: i32,
    pub error_desc: String,
    pub actuations_enabled: bool,
    pub connected_devices: Vec<MiddlewareConnectedDevice>,
}

// ============================================================================
// Device Status
// ============================================================================

/// Status of one thimble on a TouchDiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThimbleStatus {
    pub id: ActuationPoint,
    pub connected: bool,
    pub status_code: i32,
    pub error_desc: String,
}

impl Default for ThimbleStatus {
    fn default() -> Self {
        Self {
            id: ActuationPoint::Palm,
            connected: false,
            status_code: 0,
            error_desc: String::new(),
        }
    }
}

/// Entry of `DEVICES_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectedDeviceStatus {
    pub mac_address: String,
    pub hand_side: HandSide,
    /// Battery charge, 0–100.
    pub battery_level: i32,
    pub charging: bool,
    pub thimbles: Vec<ThimbleStatus>,
}

impl Default for ConnectedDeviceStatus {
    fn default() -> Self {
        Self {
            mac_address: String::new(),
            hand_side: HandSide::Left,
            battery_level: 0,
            charging: false,
            thimbles: Vec::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middleware_status_from_json() {
        let json = r#"{
            "status": "RUNNING",
            "version": "2.1.0",
            "statusCode": 0,
            "errorDesc": "",
            "actuationsEnabled": true,
            "connectedDevices": [{"macAddress": "AA:BB", "handSide": "LEFT"}]
        }"#;

        let data: MiddlewareStatusData = serde_json::from_str(json).expect("parse");
        assert_eq!(data.status, MiddlewareStatus::Running);
        assert!(data.actuations_enabled);
        assert_eq!(data.connected_devices[0].hand_side, HandSide::Left);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let data: MiddlewareStatusData = serde_json::from_str(r#"{"status":"IDLE"}"#).expect("parse");
        assert_eq!(data.status, MiddlewareStatus::Idle);
        assert!(data.connected_devices.is_empty());

        let thimble: ThimbleStatus = serde_json::from_str(r#"{"connected":true}"#).expect("parse");
        assert_eq!(thimble.id, ActuationPoint::Palm);
    }

    #[test]
    fn test_device_status_field_names() {
        let device = ConnectedDeviceStatus {
            mac_address: "01:02".into(),
            hand_side: HandSide::Right,
            battery_level: 80,
            charging: true,
            thimbles: vec![ThimbleStatus::default()],
        };
        let json = serde_json::to_value(&device).expect("serialize");
        assert_eq!(json["macAddress"], "01:02");
        assert_eq!(json["handSide"], "RIGHT");
        assert_eq!(json["batteryLevel"], 80);
        assert_eq!(json["thimbles"][0]["id"], "PALM");
    }

    #[test]
    fn test_sensor_readings_lookup() {
        let readings = RawSensorsData::new(10, HandSide::Left)
            .with_sensor(ActuationPoint::Index, SensorData::default());
        assert!(readings.sensor(ActuationPoint::Index).is_some());
        assert!(readings.sensor(ActuationPoint::Thumb).is_none());
    }
}
