//! JSON envelope wire format.
//!
//! ```json
//! {"type":"MW_STATUS","ts":1700000000000,"data":{"status":"RUNNING",...}}
//! ```
//!
//! `data` is omitted for parameterless requests. Sensor payloads flatten
//! per-thimble objects next to `handSide`, keyed by the lowercase point name.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

use super::data::{ConnectedDeviceStatus, SensorReadings};
use super::message::{DevicesStatusMessage, Message, MessageKind, MiddlewareStatusMessage};
use super::types::{ActuationPoint, HandSide};

// ============================================================================
// Envelope
// ============================================================================

/// Outer object of every JSON frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type identifier.
    #[serde(rename = "type")]
    pub type_id: String,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub ts: u64,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Accepts integer or fractional epoch milliseconds. Fractions are truncated.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    if let Some(ts) = number.as_u64() {
        return Ok(ts);
    }
    match number.as_f64() {
        Some(ts) if ts >= 0.0 => Ok(ts as u64),
        _ => Err(de::Error::custom(format_args!("invalid timestamp {number}"))),
    }
}

#[derive(Serialize, Deserialize)]
struct DevicesBody {
    #[serde(default)]
    devices: Vec<ConnectedDeviceStatus>,
}

const HAND_SIDE_KEY: &str = "handSide";

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a JSON-format message, without terminator.
///
/// # Errors
///
/// Returns [`Error::FormatMismatch`] for text-format kinds.
pub fn encode(message: &Message) -> Result<String> {
    let type_id = message.type_id();
    let ts = message.timestamp().ok_or_else(|| Error::format_mismatch(type_id))?;

    let data = match message {
        Message::RawSensorsData(readings) => Some(readings_to_value(readings)?),
        Message::AnalogSensorsData(readings) => Some(readings_to_value(readings)?),
        Message::MiddlewareStatus(status) => Some(serde_json::to_value(&status.data)?),
        Message::DevicesStatus(status) => Some(serde_json::to_value(DevicesBody {
            devices: status.devices.clone(),
        })?),
        _ => None,
    };

    let envelope = Envelope {
        type_id: type_id.to_string(),
        ts,
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

fn readings_to_value<T: Serialize>(readings: &SensorReadings<T>) -> Result<Value> {
    let mut map = Map::new();
    map.insert(HAND_SIDE_KEY.to_string(), serde_json::to_value(readings.hand_side)?);
    for (point, sample) in &readings.sensors {
        map.insert(point.key().to_string(), serde_json::to_value(sample)?);
    }
    Ok(Value::Object(map))
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes an envelope whose type identifier resolved to `kind`.
///
/// # Errors
///
/// Returns [`Error::Json`] if `data` does not match the kind's shape, and
/// [`Error::FormatMismatch`] for text-format kinds.
pub fn decode(kind: MessageKind, envelope: Envelope) -> Result<Message> {
    let timestamp = envelope.ts;

    let message = match kind {
        MessageKind::RawDataOn => Message::RawDataOn { timestamp },
        MessageKind::RawDataOff => Message::RawDataOff { timestamp },
        MessageKind::GetMiddlewareStatus => Message::GetMiddlewareStatus { timestamp },
        MessageKind::GetDevicesStatus => Message::GetDevicesStatus { timestamp },
        MessageKind::RawSensorsData => {
            Message::RawSensorsData(readings_from_value(kind, timestamp, envelope.data)?)
        }
        MessageKind::AnalogSensorsData => {
            Message::AnalogSensorsData(readings_from_value(kind, timestamp, envelope.data)?)
        }
        MessageKind::MiddlewareStatus => Message::MiddlewareStatus(MiddlewareStatusMessage {
            timestamp,
            data: serde_json::from_value(envelope.data.unwrap_or(Value::Null))?,
        }),
        MessageKind::DevicesStatus => {
            let body: DevicesBody = serde_json::from_value(envelope.data.unwrap_or(Value::Null))?;
            Message::DevicesStatus(DevicesStatusMessage {
                timestamp,
                devices: body.devices,
            })
        }
        _ => return Err(Error::format_mismatch(kind.type_id())),
    };

    Ok(message)
}

fn readings_from_value<T: DeserializeOwned>(
    kind: MessageKind,
    timestamp: u64,
    data: Option<Value>,
) -> Result<SensorReadings<T>> {
    let Some(Value::Object(mut map)) = data else {
        return Err(Error::invalid_field(kind.type_id(), "data", "expected object"));
    };

    let hand_side: HandSide = match map.remove(HAND_SIDE_KEY) {
        Some(value) => serde_json::from_value(value)?,
        None => return Err(Error::invalid_field(kind.type_id(), "hand side", "missing")),
    };

    let mut sensors = BTreeMap::new();
    for point in ActuationPoint::ALL {
        if let Some(value) = map.remove(point.key()) {
            sensors.insert(point, serde_json::from_value(value)?);
        }
    }

    Ok(SensorReadings {
        timestamp,
        hand_side,
        sensors,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::data::{
        AccelerometerData, AnalogSensorRawData, MiddlewareStatusData, SensorData, ThimbleStatus,
    };
    use crate::protocol::types::MiddlewareStatus;

    fn decode_str(frame: &str) -> Result<Message> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        let kind = MessageKind::from_type_id(&envelope.type_id).unwrap();
        decode(kind, envelope)
    }

    #[test]
    fn test_request_omits_data() {
        let msg = Message::GetMiddlewareStatus { timestamp: 42 };
        assert_eq!(encode(&msg).unwrap(), r#"{"type":"MW_GET_STATUS","ts":42}"#);
    }

    #[test]
    fn test_decode_raw_sensor_data() {
        let frame = r#"{"type":"RAW_DATA","ts":7,"data":{
            "handSide":"LEFT",
            "index":{"accelerometer":{"x":1.0,"y":2.0,"z":3.0},"gyroscope":{"x":0,"y":0,"z":0},"timeOfFlight":{"distance":12}}
        }}"#;

        let Message::RawSensorsData(readings) = decode_str(frame).unwrap() else {
            panic!("expected raw sensor data");
        };
        assert_eq!(readings.timestamp, 7);
        assert_eq!(readings.hand_side, HandSide::Left);
        let index = readings.sensor(ActuationPoint::Index).unwrap();
        assert_eq!(index.accelerometer.y, 2.0);
        assert_eq!(index.time_of_flight.distance, 12);
        assert!(readings.sensor(ActuationPoint::Thumb).is_none());
    }

    #[test]
    fn test_decode_devices_status() {
        let frame = r#"{"type":"DEVICES_STATUS","ts":1,"data":{"devices":[
            {"macAddress":"AA","handSide":"RIGHT","batteryLevel":55,"charging":false,
             "thimbles":[{"id":"THUMB","connected":true,"statusCode":0,"errorDesc":""}]}
        ]}}"#;

        let Message::DevicesStatus(status) = decode_str(frame).unwrap() else {
            panic!("expected devices status");
        };
        assert_eq!(status.devices.len(), 1);
        assert_eq!(status.devices[0].battery_level, 55);
        assert_eq!(status.devices[0].thimbles[0].id, ActuationPoint::Thumb);
    }

    #[test]
    fn test_fractional_timestamp_is_accepted() {
        let frame = r#"{"type":"MW_GET_STATUS","ts":1700000000000.75}"#;
        let Message::GetMiddlewareStatus { timestamp } = decode_str(frame).unwrap() else {
            panic!("expected status request");
        };
        assert_eq!(timestamp, 1_700_000_000_000);

        let envelope: Envelope = serde_json::from_str(r#"{"type":"MW_STATUS"}"#).unwrap();
        assert_eq!(envelope.ts, 0);
        assert!(serde_json::from_str::<Envelope>(r#"{"type":"MW_STATUS","ts":-1}"#).is_err());
        assert!(serde_json::from_str::<Envelope>(r#"{"type":"MW_STATUS","ts":"now"}"#).is_err());
    }

    #[test]
    fn test_sensor_data_without_hand_side_fails() {
        let err = decode_str(r#"{"type":"RAW_SENSOR_ON_MASK","ts":1,"data":{}}"#).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_text_kind_is_rejected() {
        let envelope = Envelope {
            type_id: "force".into(),
            ts: 0,
            data: None,
        };
        assert!(matches!(
            decode(MessageKind::SetForce, envelope),
            Err(Error::FormatMismatch { type_id: "force" })
        ));
        assert!(encode(&Message::StopFromClient).is_err());
    }

    #[test]
    fn test_json_round_trips() {
        let messages = [
            Message::RawDataOn { timestamp: 1 },
            Message::RawDataOff { timestamp: 2 },
            Message::GetDevicesStatus { timestamp: 3 },
            Message::RawSensorsData(
                SensorReadings::new(4, HandSide::Right).with_sensor(
                    ActuationPoint::Middle,
                    SensorData {
                        accelerometer: AccelerometerData { x: 0.5, y: -1.0, z: 9.81 },
                        ..Default::default()
                    },
                ),
            ),
            Message::AnalogSensorsData(SensorReadings::new(5, HandSide::Left).with_sensor(
                ActuationPoint::Thumb,
                AnalogSensorRawData {
                    ntc_temperature_raw: 512.0,
                    ntc_temperature_converted: 31.5,
                    force_sensing_raw: 12.0,
                    force_sensing_converted: 0.25,
                },
            )),
            Message::MiddlewareStatus(MiddlewareStatusMessage {
                timestamp: 6,
                data: MiddlewareStatusData {
                    status: MiddlewareStatus::Running,
                    version: "2.1.0".into(),
                    actuations_enabled: true,
                    ..Default::default()
                },
            }),
            Message::DevicesStatus(DevicesStatusMessage {
                timestamp: 7,
                devices: vec![ConnectedDeviceStatus {
                    mac_address: "AA:BB".into(),
                    thimbles: vec![ThimbleStatus::default()],
                    ..Default::default()
                }],
            }),
        ];

        for msg in messages {
            let encoded = encode(&msg).unwrap();
            assert_eq!(decode_str(&encoded).unwrap(), msg, "{encoded}");
        }
    }
}
