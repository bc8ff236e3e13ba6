//! Domain enums shared by the wire formats.
//!
//! Every enum that appears on the wire owns exactly one token table.
//! Encoding and decoding both read from that table, so the two paths cannot
//! drift apart.
//!
//! | Type | Text token | JSON token |
//! |------|------------|------------|
//! | [`HandSide`] | `LEFT` / `RIGHT` | same; matched exactly on input |
//! | [`ActuationPoint`] | `THUMB` … `PALM` | same; lowercase as sensor keys |
//! | [`TrackingType`] | `""` / `TrackType1` | - |
//! | [`CalibrationStatus`] | `0` / `1` / `2` | - |
//! | [`MiddlewareStatus`] | - | `IDLE`, `RUNNING`, … |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// ParseTokenError
// ============================================================================

/// A wire token did not match any entry of its enum's table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} token '{token}'")]
pub struct ParseTokenError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected token.
    pub token: String,
}

impl ParseTokenError {
    fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

/// Looks up `token` in a `(value, token)` table. Matching is exact.
fn lookup<T: Copy>(table: &[(T, &str)], kind: &'static str, token: &str) -> Result<T, ParseTokenError> {
    table
        .iter()
        .find(|(_, t)| *t == token)
        .map(|(v, _)| *v)
        .ok_or_else(|| ParseTokenError::new(kind, token))
}

/// Reverse lookup; the tables are exhaustive so this never misses.
fn token_of<T: Copy + PartialEq>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, t)| *t)
        .unwrap_or_default()
}

/// Implements `Display`, `FromStr`, `Serialize` and `Deserialize` from a token table.
macro_rules! token_enum {
    ($ty:ident, $table:ident, $kind:literal) => {
        impl $ty {
            /// Returns the canonical wire token.
            #[inline]
            #[must_use]
            pub fn as_str(self) -> &'static str {
                token_of($table, self)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseTokenError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                lookup($table, $kind, s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let token = String::deserialize(deserializer)?;
                token.parse().map_err(de::Error::custom)
            }
        }
    };
}

// ============================================================================
// HandSide
// ============================================================================

/// Which hand a device or command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandSide {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

const HAND_SIDE_TOKENS: &[(HandSide, &str)] = &[(HandSide::Left, "LEFT"), (HandSide::Right, "RIGHT")];

/// Calibration messages number the hands instead of naming them.
const CALIBRATION_HAND_TOKENS: &[(HandSide, &str)] = &[(HandSide::Left, "0"), (HandSide::Right, "1")];

token_enum!(HandSide, HAND_SIDE_TOKENS, "hand side");

impl HandSide {
    /// Both hands in canonical order.
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    /// Bit used by [`HandSideFlags`].
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Left => 1 << 0,
            Self::Right => 1 << 1,
        }
    }

    /// Token used by calibration messages (`0` left, `1` right).
    #[inline]
    #[must_use]
    pub fn calibration_token(self) -> &'static str {
        token_of(CALIBRATION_HAND_TOKENS, self)
    }

    /// Parses a calibration hand token.
    pub fn from_calibration_token(token: &str) -> Result<Self, ParseTokenError> {
        lookup(CALIBRATION_HAND_TOKENS, "calibration hand", token)
    }
}

// ============================================================================
// ActuationPoint
// ============================================================================

/// A location on the hand that can be actuated or tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActuationPoint {
    /// Thumb thimble.
    Thumb,
    /// Index finger thimble.
    Index,
    /// Middle finger thimble.
    Middle,
    /// Ring finger thimble.
    Annular,
    /// Little finger thimble.
    Pinky,
    /// Palm.
    Palm,
}

const ACTUATION_POINT_TOKENS: &[(ActuationPoint, &str)] = &[
    (ActuationPoint::Thumb, "THUMB"),
    (ActuationPoint::Index, "INDEX"),
    (ActuationPoint::Middle, "MIDDLE"),
    (ActuationPoint::Annular, "ANNULAR"),
    (ActuationPoint::Pinky, "PINKY"),
    (ActuationPoint::Palm, "PALM"),
];

/// Keys used for per-point objects inside sensor payloads.
const ACTUATION_POINT_KEYS: &[(ActuationPoint, &str)] = &[
    (ActuationPoint::Thumb, "thumb"),
    (ActuationPoint::Index, "index"),
    (ActuationPoint::Middle, "middle"),
    (ActuationPoint::Annular, "annular"),
    (ActuationPoint::Pinky, "pinky"),
    (ActuationPoint::Palm, "palm"),
];

token_enum!(ActuationPoint, ACTUATION_POINT_TOKENS, "actuation point");

impl ActuationPoint {
    /// All points in canonical order.
    pub const ALL: [ActuationPoint; 6] = [
        ActuationPoint::Thumb,
        ActuationPoint::Index,
        ActuationPoint::Middle,
        ActuationPoint::Annular,
        ActuationPoint::Pinky,
        ActuationPoint::Palm,
    ];

    /// Bit used by [`ActuationPointFlags`].
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Thumb => 1 << 0,
            Self::Index => 1 << 1,
            Self::Middle => 1 << 2,
            Self::Annular => 1 << 3,
            Self::Pinky => 1 << 4,
            Self::Palm => 1 << 5,
        }
    }

    /// Lowercase key used in sensor payload objects.
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        token_of(ACTUATION_POINT_KEYS, self)
    }
}

// ============================================================================
// Flag Sets
// ============================================================================

/// A set of hand sides, iterated in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandSideFlags(u8);

impl HandSideFlags {
    /// Empty set.
    pub const NONE: Self = Self(0);
    /// Left hand only.
    pub const LEFT: Self = Self(HandSide::Left.bit());
    /// Right hand only.
    pub const RIGHT: Self = Self(HandSide::Right.bit());
    /// Both hands.
    pub const BOTH: Self = Self(HandSide::Left.bit() | HandSide::Right.bit());

    /// Returns `true` if `side` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, side: HandSide) -> bool {
        self.0 & side.bit() != 0
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = HandSide> {
        HandSide::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl From<HandSide> for HandSideFlags {
    fn from(side: HandSide) -> Self {
        Self(side.bit())
    }
}

impl BitOr for HandSideFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr for HandSide {
    type Output = HandSideFlags;

    fn bitor(self, rhs: Self) -> HandSideFlags {
        HandSideFlags(self.bit() | rhs.bit())
    }
}

/// A set of actuation points, iterated in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActuationPointFlags(u8);

impl ActuationPointFlags {
    /// Empty set.
    pub const NONE: Self = Self(0);
    /// Every actuation point.
    pub const ALL: Self = Self(0b0011_1111);

    /// Returns `true` if `point` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, point: ActuationPoint) -> bool {
        self.0 & point.bit() != 0
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = ActuationPoint> {
        ActuationPoint::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<ActuationPoint> for ActuationPointFlags {
    fn from(point: ActuationPoint) -> Self {
        Self(point.bit())
    }
}

impl BitOr for ActuationPointFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ActuationPoint> for ActuationPointFlags {
    type Output = Self;

    fn bitor(self, rhs: ActuationPoint) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for ActuationPoint {
    type Output = ActuationPointFlags;

    fn bitor(self, rhs: Self) -> ActuationPointFlags {
        ActuationPointFlags(self.bit() | rhs.bit())
    }
}

// ============================================================================
// HapticTarget
// ============================================================================

/// One physical channel: a hand side and an actuation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HapticTarget {
    /// Hand the channel belongs to.
    pub hand_side: HandSide,
    /// Point on that hand.
    pub actuation_point: ActuationPoint,
}

impl HapticTarget {
    /// Creates a target.
    #[inline]
    #[must_use]
    pub const fn new(hand_side: HandSide, actuation_point: ActuationPoint) -> Self {
        Self {
            hand_side,
            actuation_point,
        }
    }
}

impl Default for HapticTarget {
    fn default() -> Self {
        Self::new(HandSide::Right, ActuationPoint::Index)
    }
}

impl fmt::Display for HapticTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hand_side, self.actuation_point)
    }
}

// ============================================================================
// TrackingType
// ============================================================================

/// Tracking protocol requested when starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingType {
    /// Legacy layout: eight closures, no abduction.
    Default,
    /// TouchDiver layout with thumb abduction.
    #[default]
    WeArtHand,
}

const TRACKING_TYPE_TOKENS: &[(TrackingType, &str)] =
    &[(TrackingType::Default, ""), (TrackingType::WeArtHand, "TrackType1")];

impl TrackingType {
    /// Returns the canonical wire token.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        token_of(TRACKING_TYPE_TOKENS, self)
    }

    /// Parses a tracking token; anything unrecognized is the legacy layout.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        lookup(TRACKING_TYPE_TOKENS, "tracking type", token).unwrap_or(Self::Default)
    }
}

// ============================================================================
// CalibrationStatus / CalibrationResult
// ============================================================================

/// Progress of the finger-tracking calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationStatus {
    /// Calibration requested but not started.
    #[default]
    Idle,
    /// Hand must be kept still.
    Calibrating,
    /// Calibration finished; tracking is running.
    Running,
}

const CALIBRATION_STATUS_TOKENS: &[(CalibrationStatus, &str)] = &[
    (CalibrationStatus::Idle, "0"),
    (CalibrationStatus::Calibrating, "1"),
    (CalibrationStatus::Running, "2"),
];

impl CalibrationStatus {
    /// Returns the numeric wire token.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        token_of(CALIBRATION_STATUS_TOKENS, self)
    }

    /// Parses a numeric wire token.
    pub fn from_token(token: &str) -> Result<Self, ParseTokenError> {
        lookup(CALIBRATION_STATUS_TOKENS, "calibration status", token)
    }
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationResult {
    /// Calibration succeeded.
    Success,
    /// Calibration failed.
    Failure,
}

const CALIBRATION_RESULT_TOKENS: &[(CalibrationResult, &str)] =
    &[(CalibrationResult::Success, "0"), (CalibrationResult::Failure, "1")];

impl CalibrationResult {
    /// Returns the numeric wire token (`0` success).
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        token_of(CALIBRATION_RESULT_TOKENS, self)
    }

    /// Parses a numeric wire token.
    pub fn from_token(token: &str) -> Result<Self, ParseTokenError> {
        lookup(CALIBRATION_RESULT_TOKENS, "calibration result", token)
    }

    /// Returns `true` for [`CalibrationResult::Success`].
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

// ============================================================================
// MiddlewareStatus
// ============================================================================

/// State reported by the middleware in `MW_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MiddlewareStatus {
    /// No device connected.
    #[default]
    Disconnected,
    /// Idle.
    Idle,
    /// Starting devices.
    Starting,
    /// Running.
    Running,
    /// Stopping devices.
    Stopping,
    /// Uploading textures to devices.
    UploadingTextures,
    /// Connecting to a device.
    ConnectingDevice,
    /// Calibrating.
    Calibration,
}

const MIDDLEWARE_STATUS_TOKENS: &[(MiddlewareStatus, &str)] = &[
    (MiddlewareStatus::Disconnected, "DISCONNECTED"),
    (MiddlewareStatus::Idle, "IDLE"),
    (MiddlewareStatus::Starting, "STARTING"),
    (MiddlewareStatus::Running, "RUNNING"),
    (MiddlewareStatus::Stopping, "STOPPING"),
    (MiddlewareStatus::UploadingTextures, "UPLOADING_TEXTURES"),
    (MiddlewareStatus::ConnectingDevice, "CONNECTING_DEVICE"),
    (MiddlewareStatus::Calibration, "CALIBRATION"),
];

token_enum!(MiddlewareStatus, MIDDLEWARE_STATUS_TOKENS, "middleware status");

// ============================================================================
// TextureType
// ============================================================================

/// Vibrotactile texture library, indexed 0–21 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum TextureType {
    #[default]
    ClickNormal = 0,
    ClickSoft = 1,
    DoubleClick = 2,
    AluminiumFineMeshSlow = 3,
    AluminiumFineMeshFast = 4,
    PlasticMeshSlow = 5,
    ProfiledAluminiumMeshMedium = 6,
    ProfiledAluminiumMeshFast = 7,
    RhombAluminiumMeshMedium = 8,
    TextileMeshMedium = 9,
    CrushedRock = 10,
    VenetianGranite = 11,
    SilverOak = 12,
    LaminatedWood = 13,
    ProfiledRubberSlow = 14,
    VelcroHooks = 15,
    VelcroLoops = 16,
    PlasticFoil2 = 17,
    Leather = 18,
    Cotton1 = 19,
    Aluminium = 20,
    DoubleSidedTape = 21,
}

impl TextureType {
    /// Lowest valid wire index.
    pub const MIN_INDEX: u8 = 0;
    /// Highest valid wire index.
    pub const MAX_INDEX: u8 = 21;
    /// Index sent when the requested texture is out of range.
    pub const NULL_INDEX: u8 = 255;

    const ALL: [TextureType; 22] = [
        Self::ClickNormal,
        Self::ClickSoft,
        Self::DoubleClick,
        Self::AluminiumFineMeshSlow,
        Self::AluminiumFineMeshFast,
        Self::PlasticMeshSlow,
        Self::ProfiledAluminiumMeshMedium,
        Self::ProfiledAluminiumMeshFast,
        Self::RhombAluminiumMeshMedium,
        Self::TextileMeshMedium,
        Self::CrushedRock,
        Self::VenetianGranite,
        Self::SilverOak,
        Self::LaminatedWood,
        Self::ProfiledRubberSlow,
        Self::VelcroHooks,
        Self::VelcroLoops,
        Self::PlasticFoil2,
        Self::Leather,
        Self::Cotton1,
        Self::Aluminium,
        Self::DoubleSidedTape,
    ];

    /// Returns the wire index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up a texture by wire index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Looks up a texture, clamping out-of-range indices to the nearest end.
    #[must_use]
    pub fn from_index_clamped(index: i64) -> Self {
        let clamped = index.clamp(i64::from(Self::MIN_INDEX), i64::from(Self::MAX_INDEX));
        Self::ALL[clamped as usize]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_side_tokens() {
        assert_eq!(HandSide::Left.as_str(), "LEFT");
        assert_eq!("RIGHT".parse::<HandSide>().unwrap(), HandSide::Right);
        assert!("UP".parse::<HandSide>().is_err());
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        let err = "right".parse::<HandSide>().unwrap_err();
        assert_eq!(err.token, "right");
        assert!("Thumb".parse::<ActuationPoint>().is_err());
        assert!(serde_json::from_str::<MiddlewareStatus>("\"running\"").is_err());
    }

    #[test]
    fn test_every_actuation_point_round_trips() {
        for point in ActuationPoint::ALL {
            assert_eq!(point.as_str().parse::<ActuationPoint>().unwrap(), point);
            assert_eq!(point.key(), point.as_str().to_ascii_lowercase());
        }
    }

    #[test]
    fn test_calibration_hand_tokens() {
        assert_eq!(HandSide::Right.calibration_token(), "1");
        assert_eq!(HandSide::from_calibration_token("0").unwrap(), HandSide::Left);
        assert!(HandSide::from_calibration_token("2").is_err());
    }

    #[test]
    fn test_flag_iteration_order() {
        let hands = HandSide::Right | HandSide::Left;
        assert_eq!(hands.iter().collect::<Vec<_>>(), vec![HandSide::Left, HandSide::Right]);

        let points = ActuationPoint::Palm | ActuationPoint::Thumb;
        assert_eq!(
            points.iter().collect::<Vec<_>>(),
            vec![ActuationPoint::Thumb, ActuationPoint::Palm]
        );
        assert_eq!(ActuationPointFlags::ALL.iter().count(), 6);
        assert!(HandSideFlags::NONE.is_empty());
    }

    #[test]
    fn test_tracking_type_tokens() {
        assert_eq!(TrackingType::WeArtHand.as_str(), "TrackType1");
        assert_eq!(TrackingType::from_token("TrackType1"), TrackingType::WeArtHand);
        assert_eq!(TrackingType::from_token("whatever"), TrackingType::Default);
    }

    #[test]
    fn test_middleware_status_serde() {
        let json = serde_json::to_string(&MiddlewareStatus::UploadingTextures).unwrap();
        assert_eq!(json, "\"UPLOADING_TEXTURES\"");
        let parsed: MiddlewareStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(parsed, MiddlewareStatus::Running);
    }

    #[test]
    fn test_texture_index_lookup() {
        assert_eq!(TextureType::from_index(21), Some(TextureType::DoubleSidedTape));
        assert_eq!(TextureType::from_index(22), None);
        assert_eq!(TextureType::from_index_clamped(-4), TextureType::ClickNormal);
        assert_eq!(TextureType::from_index_clamped(99), TextureType::DoubleSidedTape);
    }
}
