//! Message model and type registry.
//!
//! Every frame carries a type identifier that selects both the message kind
//! and the wire format it travels in:
//!
//! | Format | Kinds |
//! |--------|-------|
//! | Positional text | session control, calibration, tracking, actuation commands |
//! | JSON envelope | raw sensor streams, middleware and device status |
//!
//! [`MessageKind::from_type_id`] looks identifiers up in a table built once
//! on first use; unknown identifiers yield `None`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;

use super::data::{AnalogSensorsData, ConnectedDeviceStatus, MiddlewareStatusData, RawSensorsData};
use super::types::{
    ActuationPoint, CalibrationResult, CalibrationStatus, HandSide, HapticTarget, TextureType,
    TrackingType,
};

// ============================================================================
// Constants
// ============================================================================

/// SDK type announced in `StartFromClient`.
pub const SDK_TYPE: &str = "SdkLLPY";

/// SDK version announced in `StartFromClient`.
pub const SDK_VERSION: &str = "2.0.0";

/// Closure reported before any tracking data arrives.
pub const DEFAULT_CLOSURE: f32 = 0.0;

/// Abduction reported before any tracking data arrives, and for points
/// without an abduction sensor.
pub const DEFAULT_ABDUCTION: f32 = 0.442;

/// Full-scale value of tracking bytes.
const TRACKING_FULL_SCALE: f32 = 255.0;

/// Current time in epoch milliseconds, as stamped on JSON envelopes.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// ============================================================================
// WireFormat
// ============================================================================

/// Encoding used for a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// `TYPE:field1:field2:...`
    Text,
    /// `{"type":ID,"ts":millis,"data":{...}}`
    Json,
}

// ============================================================================
// MessageKind
// ============================================================================

/// Discriminant of [`Message`], one per type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    StartFromClient,
    StopFromClient,
    StartCalibration,
    StopCalibration,
    CalibrationStatus,
    CalibrationResult,
    Tracking,
    SetTemperature,
    StopTemperature,
    SetForce,
    StopForce,
    SetTexture,
    StopTexture,
    RawDataOn,
    RawDataOff,
    RawSensorsData,
    AnalogSensorsData,
    GetMiddlewareStatus,
    MiddlewareStatus,
    GetDevicesStatus,
    DevicesStatus,
}

static REGISTRY: LazyLock<FxHashMap<&'static str, MessageKind>> = LazyLock::new(|| {
    MessageKind::ALL
        .iter()
        .map(|kind| (kind.type_id(), *kind))
        .collect()
});

impl MessageKind {
    /// Every registered kind.
    pub const ALL: [MessageKind; 21] = [
        Self::StartFromClient,
        Self::StopFromClient,
        Self::StartCalibration,
        Self::StopCalibration,
        Self::CalibrationStatus,
        Self::CalibrationResult,
        Self::Tracking,
        Self::SetTemperature,
        Self::StopTemperature,
        Self::SetForce,
        Self::StopForce,
        Self::SetTexture,
        Self::StopTexture,
        Self::RawDataOn,
        Self::RawDataOff,
        Self::RawSensorsData,
        Self::AnalogSensorsData,
        Self::GetMiddlewareStatus,
        Self::MiddlewareStatus,
        Self::GetDevicesStatus,
        Self::DevicesStatus,
    ];

    /// Returns the wire type identifier.
    #[must_use]
    pub const fn type_id(self) -> &'static str {
        match self {
            Self::StartFromClient => "StartFromClient",
            Self::StopFromClient => "StopFromClient",
            Self::StartCalibration => "StartCalibration",
            Self::StopCalibration => "StopCalibration",
            Self::CalibrationStatus => "CalibrationStatus",
            Self::CalibrationResult => "CalibrationResult",
            Self::Tracking => "Tracking",
            Self::SetTemperature => "temperature",
            Self::StopTemperature => "stopTemperature",
            Self::SetForce => "force",
            Self::StopForce => "stopForce",
            Self::SetTexture => "texture",
            Self::StopTexture => "stopTexture",
            Self::RawDataOn => "RAW_DATA_ON",
            Self::RawDataOff => "RAW_DATA_OFF",
            Self::RawSensorsData => "RAW_DATA",
            Self::AnalogSensorsData => "RAW_SENSOR_ON_MASK",
            Self::GetMiddlewareStatus => "MW_GET_STATUS",
            Self::MiddlewareStatus => "MW_STATUS",
            Self::GetDevicesStatus => "DEVICES_GET_STATUS",
            Self::DevicesStatus => "DEVICES_STATUS",
        }
    }

    /// Returns the wire format this kind travels in.
    #[must_use]
    pub const fn format(self) -> WireFormat {
        match self {
            Self::RawDataOn
            | Self::RawDataOff
            | Self::RawSensorsData
            | Self::AnalogSensorsData
            | Self::GetMiddlewareStatus
            | Self::MiddlewareStatus
            | Self::GetDevicesStatus
            | Self::DevicesStatus => WireFormat::Json,
            _ => WireFormat::Text,
        }
    }

    /// Looks up a kind by wire type identifier. Case-sensitive.
    #[must_use]
    pub fn from_type_id(type_id: &str) -> Option<Self> {
        REGISTRY.get(type_id).copied()
    }

    /// Creates a message of this kind with default contents.
    ///
    /// JSON kinds are stamped with timestamp `0`.
    #[must_use]
    pub fn instantiate(self) -> Message {
        match self {
            Self::StartFromClient => Message::StartFromClient(StartFromClient::default()),
            Self::StopFromClient => Message::StopFromClient,
            Self::StartCalibration => Message::StartCalibration,
            Self::StopCalibration => Message::StopCalibration,
            Self::CalibrationStatus => Message::CalibrationStatus(CalibrationStatusMessage::default()),
            Self::CalibrationResult => Message::CalibrationResult(CalibrationResultMessage::default()),
            Self::Tracking => Message::Tracking(TrackingMessage::default()),
            Self::SetTemperature => Message::SetTemperature(SetTemperature::default()),
            Self::StopTemperature => Message::StopTemperature(HapticTarget::default()),
            Self::SetForce => Message::SetForce(SetForce::default()),
            Self::StopForce => Message::StopForce(HapticTarget::default()),
            Self::SetTexture => Message::SetTexture(SetTexture::default()),
            Self::StopTexture => Message::StopTexture(HapticTarget::default()),
            Self::RawDataOn => Message::RawDataOn { timestamp: 0 },
            Self::RawDataOff => Message::RawDataOff { timestamp: 0 },
            Self::RawSensorsData => Message::RawSensorsData(RawSensorsData::default()),
            Self::AnalogSensorsData => Message::AnalogSensorsData(AnalogSensorsData::default()),
            Self::GetMiddlewareStatus => Message::GetMiddlewareStatus { timestamp: 0 },
            Self::MiddlewareStatus => Message::MiddlewareStatus(MiddlewareStatusMessage::default()),
            Self::GetDevicesStatus => Message::GetDevicesStatus { timestamp: 0 },
            Self::DevicesStatus => Message::DevicesStatus(DevicesStatusMessage::default()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_id())
    }
}

// ============================================================================
// Message
// ============================================================================

/// A decoded or outgoing middleware message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Starts a session, optionally announcing the SDK and tracking layout.
    StartFromClient(StartFromClient),
    /// Stops the session.
    StopFromClient,
    /// Starts finger-tracking calibration.
    StartCalibration,
    /// Stops finger-tracking calibration.
    StopCalibration,
    /// Calibration progress for one hand.
    CalibrationStatus(CalibrationStatusMessage),
    /// Calibration outcome for one hand.
    CalibrationResult(CalibrationResultMessage),
    /// Closure and abduction values for both hands.
    Tracking(TrackingMessage),
    /// Sets temperature on one channel.
    SetTemperature(SetTemperature),
    /// Stops temperature on one channel.
    StopTemperature(HapticTarget),
    /// Sets force on one channel.
    SetForce(SetForce),
    /// Stops force on one channel.
    StopForce(HapticTarget),
    /// Sets texture on one channel.
    SetTexture(SetTexture),
    /// Stops texture on one channel.
    StopTexture(HapticTarget),
    /// Enables the raw sensor stream.
    RawDataOn {
        /// Epoch milliseconds.
        timestamp: u64,
    },
    /// Disables the raw sensor stream.
    RawDataOff {
        /// Epoch milliseconds.
        timestamp: u64,
    },
    /// IMU and time-of-flight readings.
    RawSensorsData(RawSensorsData),
    /// Analog NTC and force readings.
    AnalogSensorsData(AnalogSensorsData),
    /// Requests a `MW_STATUS` reply.
    GetMiddlewareStatus {
        /// Epoch milliseconds.
        timestamp: u64,
    },
    /// Middleware status report.
    MiddlewareStatus(MiddlewareStatusMessage),
    /// Requests a `DEVICES_STATUS` reply.
    GetDevicesStatus {
        /// Epoch milliseconds.
        timestamp: u64,
    },
    /// Connected device report.
    DevicesStatus(DevicesStatusMessage),
}

impl Message {
    /// Returns the kind of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::StartFromClient(_) => MessageKind::StartFromClient,
            Self::StopFromClient => MessageKind::StopFromClient,
            Self::StartCalibration => MessageKind::StartCalibration,
            Self::StopCalibration => MessageKind::StopCalibration,
            Self::CalibrationStatus(_) => MessageKind::CalibrationStatus,
            Self::CalibrationResult(_) => MessageKind::CalibrationResult,
            Self::Tracking(_) => MessageKind::Tracking,
            Self::SetTemperature(_) => MessageKind::SetTemperature,
            Self::StopTemperature(_) => MessageKind::StopTemperature,
            Self::SetForce(_) => MessageKind::SetForce,
            Self::StopForce(_) => MessageKind::StopForce,
            Self::SetTexture(_) => MessageKind::SetTexture,
            Self::StopTexture(_) => MessageKind::StopTexture,
            Self::RawDataOn { .. } => MessageKind::RawDataOn,
            Self::RawDataOff { .. } => MessageKind::RawDataOff,
            Self::RawSensorsData(_) => MessageKind::RawSensorsData,
            Self::AnalogSensorsData(_) => MessageKind::AnalogSensorsData,
            Self::GetMiddlewareStatus { .. } => MessageKind::GetMiddlewareStatus,
            Self::MiddlewareStatus(_) => MessageKind::MiddlewareStatus,
            Self::GetDevicesStatus { .. } => MessageKind::GetDevicesStatus,
            Self::DevicesStatus(_) => MessageKind::DevicesStatus,
        }
    }

    /// Returns the wire type identifier.
    #[inline]
    #[must_use]
    pub const fn type_id(&self) -> &'static str {
        self.kind().type_id()
    }

    /// Returns the envelope timestamp of JSON messages.
    #[must_use]
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Self::RawDataOn { timestamp }
            | Self::RawDataOff { timestamp }
            | Self::GetMiddlewareStatus { timestamp }
            | Self::GetDevicesStatus { timestamp } => Some(*timestamp),
            Self::RawSensorsData(data) => Some(data.timestamp),
            Self::AnalogSensorsData(data) => Some(data.timestamp),
            Self::MiddlewareStatus(status) => Some(status.timestamp),
            Self::DevicesStatus(status) => Some(status.timestamp),
            _ => None,
        }
    }

    /// Returns the channel addressed by an actuation command.
    #[must_use]
    pub const fn target(&self) -> Option<HapticTarget> {
        match self {
            Self::SetTemperature(SetTemperature { target, .. })
            | Self::SetForce(SetForce { target, .. })
            | Self::SetTexture(SetTexture { target, .. })
            | Self::StopTemperature(target)
            | Self::StopForce(target)
            | Self::StopTexture(target) => Some(*target),
            _ => None,
        }
    }

    /// Re-addresses an actuation command. Other messages are returned unchanged.
    #[must_use]
    pub fn with_target(mut self, new_target: HapticTarget) -> Self {
        match &mut self {
            Self::SetTemperature(SetTemperature { target, .. })
            | Self::SetForce(SetForce { target, .. })
            | Self::SetTexture(SetTexture { target, .. })
            | Self::StopTemperature(target)
            | Self::StopForce(target)
            | Self::StopTexture(target) => *target = new_target,
            _ => {}
        }
        self
    }

    /// `StartFromClient` announcing this SDK.
    #[must_use]
    pub fn start(tracking_type: TrackingType) -> Self {
        Self::StartFromClient(StartFromClient { tracking_type })
    }

    /// `RAW_DATA_ON` stamped with the current time.
    #[must_use]
    pub fn raw_data_on() -> Self {
        Self::RawDataOn {
            timestamp: now_millis(),
        }
    }

    /// `RAW_DATA_OFF` stamped with the current time.
    #[must_use]
    pub fn raw_data_off() -> Self {
        Self::RawDataOff {
            timestamp: now_millis(),
        }
    }

    /// `MW_GET_STATUS` stamped with the current time.
    #[must_use]
    pub fn get_middleware_status() -> Self {
        Self::GetMiddlewareStatus {
            timestamp: now_millis(),
        }
    }

    /// `DEVICES_GET_STATUS` stamped with the current time.
    #[must_use]
    pub fn get_devices_status() -> Self {
        Self::GetDevicesStatus {
            timestamp: now_millis(),
        }
    }
}

// ============================================================================
// Session Payloads
// ============================================================================

/// Body of `StartFromClient`.
///
/// [`TrackingType::WeArtHand`] sends `SdkLLPY:2.0.0:TrackType1`;
/// [`TrackingType::Default`] sends no fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartFromClient {
    /// Tracking layout requested for the session.
    pub tracking_type: TrackingType,
}

/// Body of `CalibrationStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationStatusMessage {
    pub hand_side: HandSide,
    pub status: CalibrationStatus,
}

impl Default for CalibrationStatusMessage {
    fn default() -> Self {
        Self {
            hand_side: HandSide::Left,
            status: CalibrationStatus::Idle,
        }
    }
}

/// Body of `CalibrationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResultMessage {
    pub hand_side: HandSide,
    pub result: CalibrationResult,
}

impl Default for CalibrationResultMessage {
    fn default() -> Self {
        Self {
            hand_side: HandSide::Left,
            result: CalibrationResult::Failure,
        }
    }
}

// ============================================================================
// Tracking
// ============================================================================

/// Raw tracking bytes of one hand, 0–255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandTracking {
    pub thumb_closure: u8,
    pub index_closure: u8,
    pub middle_closure: u8,
    /// Only reported by the [`TrackingType::Default`] layout.
    pub palm_closure: u8,
    /// Only reported by the [`TrackingType::WeArtHand`] layout.
    pub thumb_abduction: u8,
}

/// Body of `Tracking`.
///
/// The eight values after the layout token are ordered per layout:
///
/// | Layout | Right hand | Left hand |
/// |--------|------------|-----------|
/// | `TrackType1` | index, thumb, thumb abduction, middle | same |
/// | default | thumb, index, middle, palm | same |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingMessage {
    pub tracking_type: TrackingType,
    pub right: HandTracking,
    pub left: HandTracking,
}

impl TrackingMessage {
    /// Returns the raw values of one hand.
    #[inline]
    #[must_use]
    pub const fn hand(&self, hand_side: HandSide) -> &HandTracking {
        match hand_side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    /// Returns the closure of a point, normalized to [0, 1].
    ///
    /// Points without a closure sensor report `0.0`.
    #[must_use]
    pub fn closure(&self, hand_side: HandSide, point: ActuationPoint) -> f32 {
        let hand = self.hand(hand_side);
        let raw = match point {
            ActuationPoint::Thumb => hand.thumb_closure,
            ActuationPoint::Index => hand.index_closure,
            ActuationPoint::Middle => hand.middle_closure,
            ActuationPoint::Palm => hand.palm_closure,
            ActuationPoint::Annular | ActuationPoint::Pinky => return DEFAULT_CLOSURE,
        };
        f32::from(raw) / TRACKING_FULL_SCALE
    }

    /// Returns the abduction of a point, normalized to [0, 1].
    ///
    /// Only the thumb reports abduction; other points return
    /// [`DEFAULT_ABDUCTION`].
    #[must_use]
    pub fn abduction(&self, hand_side: HandSide, point: ActuationPoint) -> f32 {
        match point {
            ActuationPoint::Thumb => f32::from(self.hand(hand_side).thumb_abduction) / TRACKING_FULL_SCALE,
            _ => DEFAULT_ABDUCTION,
        }
    }
}

// ============================================================================
// Actuation Commands
// ============================================================================

/// Body of `temperature`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetTemperature {
    /// Temperature in [0, 1]; 0.5 is neutral.
    pub value: f32,
    pub target: HapticTarget,
}

impl Default for SetTemperature {
    fn default() -> Self {
        Self {
            value: 0.5,
            target: HapticTarget::default(),
        }
    }
}

/// Body of `force`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetForce {
    /// Force components; the middleware reads the first.
    pub values: [f32; 3],
    pub target: HapticTarget,
}

/// Body of `texture`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetTexture {
    /// Requested texture index. Anything above 21 is sent as 255.
    pub index: u8,
    /// Velocity components; the middleware reads the third.
    pub velocity: [f32; 3],
    /// Volume in [0, 100].
    pub volume: f32,
    pub target: HapticTarget,
}

impl SetTexture {
    /// Index written to the wire.
    #[inline]
    #[must_use]
    pub const fn wire_index(&self) -> u8 {
        if self.index > TextureType::MAX_INDEX {
            TextureType::NULL_INDEX
        } else {
            self.index
        }
    }

    /// Returns the texture, or `None` for the null index.
    #[must_use]
    pub fn texture(&self) -> Option<TextureType> {
        TextureType::from_index(self.index)
    }
}

impl Default for SetTexture {
    fn default() -> Self {
        Self {
            index: TextureType::ClickNormal.index(),
            velocity: [0.5, 0.0, 0.0],
            volume: 100.0,
            target: HapticTarget::default(),
        }
    }
}

// ============================================================================
// Status Payloads
// ============================================================================

/// Body of `MW_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MiddlewareStatusMessage {
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub data: MiddlewareStatusData,
}

/// Body of `DEVICES_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DevicesStatusMessage {
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub devices: Vec<ConnectedDeviceStatus>,
}

// ============================================================================
// Tests
// ============================================================================
