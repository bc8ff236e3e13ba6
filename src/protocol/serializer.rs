//! Format-agnostic encode and decode.
//!
//! Outgoing messages are encoded in the format bound to their kind. Incoming
//! frames are tried as a JSON envelope first, then as positional text.
//!
//! | Frame | Result |
//! |-------|--------|
//! | Known JSON kind in an envelope | `Ok(Some(message))` |
//! | Known text kind as positional text | `Ok(Some(message))` |
//! | Unknown type identifier (either format) | `Ok(None)` |
//! | Known kind, wrong shape or wrong format | `Err(..)` |

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use crate::error::{Error, Result};

use super::json::{self, Envelope};
use super::message::{Message, MessageKind, WireFormat};
use super::text::{self, FIELD_SEPARATOR};

// ============================================================================
// Serializer
// ============================================================================

/// Encodes `message` without the frame terminator.
///
/// # Errors
///
/// Returns [`Error::Json`] if a JSON body fails to serialize.
pub fn encode(message: &Message) -> Result<String> {
    match message.kind().format() {
        WireFormat::Text => text::encode(message),
        WireFormat::Json => json::encode(message),
    }
}

/// Decodes one frame.
///
/// Returns `Ok(None)` for frames whose type identifier is not registered.
///
/// # Errors
///
/// Returns a decode error (see [`Error::is_decode_error`]) when a registered
/// kind arrives malformed or in the other wire format.
pub fn decode(frame: &str) -> Result<Option<Message>> {
    if let Ok(envelope) = serde_json::from_str::<Envelope>(frame) {
        let Some(kind) = MessageKind::from_type_id(&envelope.type_id) else {
            trace!(type_id = %envelope.type_id, "Unrecognized JSON message type");
            return Ok(None);
        };
        if kind.format() != WireFormat::Json {
            return Err(Error::format_mismatch(kind.type_id()));
        }
        return json::decode(kind, envelope).map(Some);
    }

    let mut parts = frame.split(FIELD_SEPARATOR);
    let type_id = parts.next().unwrap_or_default();
    let Some(kind) = MessageKind::from_type_id(type_id) else {
        trace!(type_id, "Unrecognized message type");
        return Ok(None);
    };
    if kind.format() != WireFormat::Text {
        return Err(Error::format_mismatch(kind.type_id()));
    }

    let fields: Vec<&str> = parts.collect();
    text::decode(kind, &fields).map(Some)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::types::{ActuationPoint, HandSide, HapticTarget, TrackingType};

    #[test]
    fn test_every_default_message_round_trips() {
        for kind in MessageKind::ALL {
            let msg = kind.instantiate();
            let encoded = encode(&msg).unwrap();
            assert_eq!(decode(&encoded).unwrap(), Some(msg), "{kind}: {encoded}");
        }
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        assert_eq!(decode("SomethingNew:1:2").unwrap(), None);
        assert_eq!(decode(r#"{"type":"FUTURE_MESSAGE","ts":1}"#).unwrap(), None);
        assert_eq!(decode("").unwrap(), None);
    }

    #[test]
    fn test_malformed_json_falls_back_to_text() {
        assert_eq!(decode(r#"{"type":"MW_STATUS""#).unwrap(), None);
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let err = decode(r#"{"type":"temperature","ts":1}"#).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { type_id: "temperature" }));

        let err = decode("MW_STATUS:RUNNING").unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { type_id: "MW_STATUS" }));
    }

    #[test]
    fn test_start_message() {
        let msg = Message::start(TrackingType::WeArtHand);
        assert_eq!(encode(&msg).unwrap(), "StartFromClient:SdkLLPY:2.0.0:TrackType1");
    }

    #[test]
    fn test_decode_stop_texture() {
        let msg = decode("stopTexture:RIGHT:MIDDLE").unwrap();
        assert_eq!(
            msg,
            Some(Message::StopTexture(HapticTarget::new(HandSide::Right, ActuationPoint::Middle)))
        );
    }
}
