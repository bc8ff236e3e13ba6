//! Middleware wire protocol.
//!
//! This module defines the frames exchanged between the client and the
//! WeArt middleware over a single TCP stream.
//!
//! # Protocol Overview
//!
//! | Layer | Responsibility |
//! |-------|----------------|
//! | Framing | Each payload is followed by `~` |
//! | Text format | `TYPE:field:field...` for session and actuation messages |
//! | JSON format | `{"type","ts","data"}` for sensor and status messages |
//!
//! # Type Identifiers
//!
//! Identifiers are case-sensitive and select both kind and format:
//!
//! - `temperature`, `force`, `texture` and their `stop*` counterparts
//! - `StartFromClient`, `StopFromClient`, `Tracking`, calibration messages
//! - `RAW_DATA`, `MW_STATUS`, `DEVICES_STATUS` and their requests
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Frame splitting and terminator handling |
//! | `data` | JSON payload records |
//! | `json` | JSON envelope format |
//! | `message` | Message enum and type registry |
//! | `serializer` | Format dispatch for encode and decode |
//! | `text` | Positional-text format |
//! | `types` | Hand sides, actuation points and other wire enums |

// ============================================================================
// Submodules
// ============================================================================

/// Frame codec.
pub mod codec;

/// JSON payload records.
pub mod data;

/// JSON envelope format.
pub mod json;

/// Message model and registry.
pub mod message;

/// Format-agnostic serializer.
pub mod serializer;

/// Positional-text format.
pub mod text;

/// Wire enums.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{DEFAULT_MAX_FRAME_LENGTH, FRAME_TERMINATOR, FrameCodec, encode_frame};
pub use data::{
    AccelerometerData, AnalogSensorRawData, AnalogSensorsData, ConnectedDeviceStatus,
    GyroscopeData, MiddlewareConnectedDevice, MiddlewareStatusData, RawSensorsData, SensorData,
    SensorReadings, ThimbleStatus, TofData,
};
pub use message::{
    CalibrationResultMessage, CalibrationStatusMessage, DEFAULT_ABDUCTION, DEFAULT_CLOSURE,
    DevicesStatusMessage, HandTracking, Message, MessageKind, MiddlewareStatusMessage, SDK_TYPE,
    SDK_VERSION, SetForce, SetTemperature, SetTexture, StartFromClient, TrackingMessage,
    WireFormat, now_millis,
};
pub use types::{
    ActuationPoint, ActuationPointFlags, CalibrationResult, CalibrationStatus, HandSide,
    HandSideFlags, HapticTarget, MiddlewareStatus, ParseTokenError, TextureType, TrackingType,
};
