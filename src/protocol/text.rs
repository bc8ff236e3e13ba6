//! Positional-text wire format.
//!
//! A frame is the type identifier followed by `:`-separated fields:
//!
//! ```text
//! temperature:0.7:LEFT:INDEX
//! texture:3:0.5:0:0.5:100:RIGHT:THUMB
//! CalibrationStatus:1:2
//! ```
//!
//! Field counts are fixed per kind. A count mismatch is reported as
//! [`Error::FieldCount`] rather than silently truncated.

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use crate::error::{Error, Result};

use super::message::{
    CalibrationResultMessage, CalibrationStatusMessage, HandTracking, Message, MessageKind,
    SDK_TYPE, SDK_VERSION, SetForce, SetTemperature, SetTexture, StartFromClient, TrackingMessage,
};
use super::types::{
    ActuationPoint, CalibrationResult, CalibrationStatus, HandSide, HapticTarget, TrackingType,
};

// ============================================================================
// Constants
// ============================================================================

/// Separator between the type identifier and each field.
pub const FIELD_SEPARATOR: &str = ":";

const TRACKING_FIELDS: usize = 9;

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a text-format message, without terminator.
///
/// # Errors
///
/// Returns [`Error::FormatMismatch`] for JSON-format kinds.
pub fn encode(message: &Message) -> Result<String> {
    let mut fields: Vec<String> = Vec::with_capacity(10);
    fields.push(message.type_id().to_string());

    match message {
        Message::StartFromClient(start) => {
            if start.tracking_type == TrackingType::WeArtHand {
                fields.push(SDK_TYPE.to_string());
                fields.push(SDK_VERSION.to_string());
                fields.push(start.tracking_type.as_str().to_string());
            }
        }
        Message::StopFromClient | Message::StartCalibration | Message::StopCalibration => {}
        Message::CalibrationStatus(status) => {
            fields.push(status.hand_side.calibration_token().to_string());
            fields.push(status.status.as_str().to_string());
        }
        Message::CalibrationResult(result) => {
            fields.push(result.hand_side.calibration_token().to_string());
            fields.push(result.result.as_str().to_string());
        }
        Message::Tracking(tracking) => {
            fields.push(tracking.tracking_type.as_str().to_string());
            for hand in [&tracking.right, &tracking.left] {
                fields.extend(tracking_values(tracking.tracking_type, hand).map(|v| v.to_string()));
            }
        }
        Message::SetTemperature(temperature) => {
            fields.push(temperature.value.to_string());
            push_target(&mut fields, temperature.target);
        }
        Message::SetForce(force) => {
            fields.extend(force.values.iter().map(f32::to_string));
            push_target(&mut fields, force.target);
        }
        Message::SetTexture(texture) => {
            fields.push(texture.wire_index().to_string());
            fields.extend(texture.velocity.iter().map(f32::to_string));
            fields.push(texture.volume.to_string());
            push_target(&mut fields, texture.target);
        }
        Message::StopTemperature(target) | Message::StopForce(target) | Message::StopTexture(target) => {
            push_target(&mut fields, *target);
        }
        Message::RawDataOn { .. }
        | Message::RawDataOff { .. }
        | Message::RawSensorsData(_)
        | Message::AnalogSensorsData(_)
        | Message::GetMiddlewareStatus { .. }
        | Message::MiddlewareStatus(_)
        | Message::GetDevicesStatus { .. }
        | Message::DevicesStatus(_) => return Err(Error::format_mismatch(message.type_id())),
    }

    Ok(fields.join(FIELD_SEPARATOR))
}

fn push_target(fields: &mut Vec<String>, target: HapticTarget) {
    fields.push(target.hand_side.as_str().to_string());
    fields.push(target.actuation_point.as_str().to_string());
}

/// Per-hand values in wire order for a tracking layout.
fn tracking_values(tracking_type: TrackingType, hand: &HandTracking) -> [u8; 4] {
    match tracking_type {
        TrackingType::WeArtHand => [
            hand.index_closure,
            hand.thumb_closure,
            hand.thumb_abduction,
            hand.middle_closure,
        ],
        TrackingType::Default => [
            hand.thumb_closure,
            hand.index_closure,
            hand.middle_closure,
            hand.palm_closure,
        ],
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes the fields following the type identifier of a text-format kind.
///
/// # Errors
///
/// Returns [`Error::FieldCount`] or [`Error::InvalidField`] when the fields
/// do not match the kind's shape, and [`Error::FormatMismatch`] for
/// JSON-format kinds.
pub fn decode(kind: MessageKind, fields: &[&str]) -> Result<Message> {
    let type_id = kind.type_id();

    let message = match kind {
        MessageKind::StartFromClient => {
            let tracking_type = match fields.len() {
                0 => TrackingType::Default,
                3 => TrackingType::from_token(fields[2]),
                n => return Err(Error::field_count(type_id, 3, n)),
            };
            Message::StartFromClient(StartFromClient { tracking_type })
        }
        // Parameterless; trailing fields are ignored.
        MessageKind::StopFromClient | MessageKind::StartCalibration | MessageKind::StopCalibration => {
            kind.instantiate()
        }
        MessageKind::CalibrationStatus => {
            expect_fields(type_id, fields, 2)?;
            Message::CalibrationStatus(CalibrationStatusMessage {
                hand_side: parse_calibration_hand(type_id, fields[0])?,
                status: CalibrationStatus::from_token(fields[1])
                    .map_err(|_| Error::invalid_field(type_id, "status", fields[1]))?,
            })
        }
        MessageKind::CalibrationResult => {
            expect_fields(type_id, fields, 2)?;
            Message::CalibrationResult(CalibrationResultMessage {
                hand_side: parse_calibration_hand(type_id, fields[0])?,
                result: CalibrationResult::from_token(fields[1])
                    .map_err(|_| Error::invalid_field(type_id, "result", fields[1]))?,
            })
        }
        MessageKind::Tracking => {
            expect_fields(type_id, fields, TRACKING_FIELDS)?;
            let tracking_type = TrackingType::from_token(fields[0]);
            let mut values = [0u8; 8];
            for (slot, raw) in values.iter_mut().zip(&fields[1..]) {
                *slot = parse(type_id, "tracking value", raw)?;
            }
            Message::Tracking(TrackingMessage {
                tracking_type,
                right: hand_tracking(tracking_type, &values[..4]),
                left: hand_tracking(tracking_type, &values[4..]),
            })
        }
        MessageKind::SetTemperature => {
            expect_fields(type_id, fields, 3)?;
            Message::SetTemperature(SetTemperature {
                value: parse(type_id, "temperature", fields[0])?,
                target: parse_target(type_id, &fields[1..])?,
            })
        }
        MessageKind::SetForce => {
            expect_fields(type_id, fields, 5)?;
            Message::SetForce(SetForce {
                values: [
                    parse(type_id, "force", fields[0])?,
                    parse(type_id, "force", fields[1])?,
                    parse(type_id, "force", fields[2])?,
                ],
                target: parse_target(type_id, &fields[3..])?,
            })
        }
        MessageKind::SetTexture => {
            expect_fields(type_id, fields, 7)?;
            Message::SetTexture(SetTexture {
                index: parse(type_id, "texture index", fields[0])?,
                velocity: [
                    parse(type_id, "velocity", fields[1])?,
                    parse(type_id, "velocity", fields[2])?,
                    parse(type_id, "velocity", fields[3])?,
                ],
                volume: parse(type_id, "volume", fields[4])?,
                target: parse_target(type_id, &fields[5..])?,
            })
        }
        MessageKind::StopTemperature => {
            expect_fields(type_id, fields, 2)?;
            Message::StopTemperature(parse_target(type_id, fields)?)
        }
        MessageKind::StopForce => {
            expect_fields(type_id, fields, 2)?;
            Message::StopForce(parse_target(type_id, fields)?)
        }
        MessageKind::StopTexture => {
            expect_fields(type_id, fields, 2)?;
            Message::StopTexture(parse_target(type_id, fields)?)
        }
        MessageKind::RawDataOn
        | MessageKind::RawDataOff
        | MessageKind::RawSensorsData
        | MessageKind::AnalogSensorsData
        | MessageKind::GetMiddlewareStatus
        | MessageKind::MiddlewareStatus
        | MessageKind::GetDevicesStatus
        | MessageKind::DevicesStatus => return Err(Error::format_mismatch(type_id)),
    };

    Ok(message)
}

fn expect_fields(type_id: &'static str, fields: &[&str], expected: usize) -> Result<()> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(Error::field_count(type_id, expected, fields.len()))
    }
}

fn parse<T: FromStr>(type_id: &'static str, field: &'static str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_field(type_id, field, raw))
}

fn parse_calibration_hand(type_id: &'static str, raw: &str) -> Result<HandSide> {
    HandSide::from_calibration_token(raw).map_err(|_| Error::invalid_field(type_id, "hand side", raw))
}

/// Parses a trailing `HAND:POINT` pair.
fn parse_target(type_id: &'static str, fields: &[&str]) -> Result<HapticTarget> {
    let hand_side: HandSide = parse(type_id, "hand side", fields[0])?;
    let actuation_point: ActuationPoint = parse(type_id, "actuation point", fields[1])?;
    Ok(HapticTarget::new(hand_side, actuation_point))
}

fn hand_tracking(tracking_type: TrackingType, values: &[u8]) -> HandTracking {
    match tracking_type {
        TrackingType::WeArtHand => HandTracking {
            index_closure: values[0],
            thumb_closure: values[1],
            thumb_abduction: values[2],
            middle_closure: values[3],
            palm_closure: 0,
        },
        TrackingType::Default => HandTracking {
            thumb_closure: values[0],
            index_closure: values[1],
            middle_closure: values[2],
            palm_closure: values[3],
            thumb_abduction: 0,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(frame: &str) -> Result<Message> {
        let mut parts = frame.split(FIELD_SEPARATOR);
        let kind = MessageKind::from_type_id(parts.next().unwrap()).unwrap();
        let fields: Vec<&str> = parts.collect();
        decode(kind, &fields)
    }

    fn left_index() -> HapticTarget {
        HapticTarget::new(HandSide::Left, ActuationPoint::Index)
    }

    #[test]
    fn test_encode_temperature() {
        let msg = Message::SetTemperature(SetTemperature {
            value: 0.7,
            target: left_index(),
        });
        assert_eq!(encode(&msg).unwrap(), "temperature:0.7:LEFT:INDEX");
    }

    #[test]
    fn test_encode_start_variants() {
        assert_eq!(
            encode(&Message::start(TrackingType::WeArtHand)).unwrap(),
            "StartFromClient:SdkLLPY:2.0.0:TrackType1"
        );
        assert_eq!(encode(&Message::start(TrackingType::Default)).unwrap(), "StartFromClient");
    }

    #[test]
    fn test_encode_texture_has_seven_fields() {
        let msg = Message::SetTexture(SetTexture {
            index: 3,
            velocity: [0.5, 0.0, 0.25],
            volume: 100.0,
            target: left_index(),
        });
        let encoded = encode(&msg).unwrap();
        assert_eq!(encoded, "texture:3:0.5:0:0.25:100:LEFT:INDEX");
        assert_eq!(encoded.split(FIELD_SEPARATOR).count(), 8);
    }

    #[test]
    fn test_out_of_range_texture_uses_null_index() {
        let msg = Message::SetTexture(SetTexture {
            index: 40,
            ..SetTexture::default()
        });
        assert!(encode(&msg).unwrap().starts_with("texture:255:"));
    }

    #[test]
    fn test_decode_calibration_status() {
        let msg = decode_str("CalibrationStatus:1:2").unwrap();
        assert_eq!(
            msg,
            Message::CalibrationStatus(CalibrationStatusMessage {
                hand_side: HandSide::Right,
                status: CalibrationStatus::Running,
            })
        );
    }

    #[test]
    fn test_decode_tracking_weart_hand_layout() {
        let msg = decode_str("Tracking:TrackType1:10:20:30:40:50:60:70:80").unwrap();
        let Message::Tracking(tracking) = msg else {
            panic!("expected tracking");
        };
        assert_eq!(tracking.tracking_type, TrackingType::WeArtHand);
        assert_eq!(tracking.right.index_closure, 10);
        assert_eq!(tracking.right.thumb_closure, 20);
        assert_eq!(tracking.right.thumb_abduction, 30);
        assert_eq!(tracking.right.middle_closure, 40);
        assert_eq!(tracking.left.index_closure, 50);
        assert_eq!(tracking.left.middle_closure, 80);
    }

    #[test]
    fn test_decode_tracking_default_layout() {
        let msg = decode_str("Tracking::1:2:3:4:5:6:7:8").unwrap();
        let Message::Tracking(tracking) = msg else {
            panic!("expected tracking");
        };
        assert_eq!(tracking.tracking_type, TrackingType::Default);
        assert_eq!(tracking.right.thumb_closure, 1);
        assert_eq!(tracking.right.palm_closure, 4);
        assert_eq!(tracking.left.palm_closure, 8);
    }

    #[test]
    fn test_field_count_mismatch() {
        let err = decode_str("temperature:0.5:LEFT").unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCount {
                type_id: "temperature",
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_invalid_field() {
        let err = decode_str("stopForce:UP:INDEX").unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "hand side", .. }));

        let err = decode_str("Tracking:TrackType1:1:2:3:4:5:6:7:300").unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "tracking value", .. }));
    }

    #[test]
    fn test_json_kind_is_rejected() {
        let err = encode(&Message::get_devices_status()).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { type_id: "DEVICES_GET_STATUS" }));
        assert!(decode(MessageKind::RawDataOn, &[]).is_err());
    }

    #[test]
    fn test_text_round_trips() {
        let target = HapticTarget::new(HandSide::Right, ActuationPoint::Palm);
        let messages = [
            Message::start(TrackingType::WeArtHand),
            Message::start(TrackingType::Default),
            Message::StopFromClient,
            Message::StartCalibration,
            Message::StopCalibration,
            Message::CalibrationResult(CalibrationResultMessage {
                hand_side: HandSide::Left,
                result: CalibrationResult::Success,
            }),
            Message::SetForce(SetForce {
                values: [0.8, 0.0, 0.0],
                target,
            }),
            Message::SetTexture(SetTexture {
                index: 12,
                velocity: [0.5, 0.0, 0.3],
                volume: 42.5,
                target,
            }),
            Message::StopTemperature(target),
            Message::StopTexture(target),
        ];

        for msg in messages {
            let encoded = encode(&msg).unwrap();
            assert_eq!(decode_str(&encoded).unwrap(), msg, "{encoded}");
        }
    }
}
