//! Finger-tracking calibration tracking.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::protocol::{CalibrationResult, CalibrationStatus, HandSide, Message, MessageKind};
use crate::transport::MessageListener;

use super::Callbacks;

// ============================================================================
// TrackingCalibration
// ============================================================================

#[derive(Default)]
struct CalibrationState {
    current_hand: Option<HandSide>,
    statuses: FxHashMap<HandSide, CalibrationStatus>,
    results: FxHashMap<HandSide, CalibrationResult>,
    last_result: Option<CalibrationResult>,
}

/// Tracks `CalibrationStatus` and `CalibrationResult`.
///
/// The middleware calibrates one hand at a time; [`current_hand`](Self::current_hand)
/// is the hand named by the latest message.
#[derive(Default)]
pub struct TrackingCalibration {
    state: Mutex<CalibrationState>,
    status_callbacks: Callbacks<(HandSide, CalibrationStatus)>,
    result_callbacks: Callbacks<(HandSide, CalibrationResult)>,
}

impl TrackingCalibration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand named by the latest calibration message.
    #[must_use]
    pub fn current_hand(&self) -> Option<HandSide> {
        self.state.lock().current_hand
    }

    /// Latest status of the current hand.
    #[must_use]
    pub fn status(&self) -> Option<CalibrationStatus> {
        let state = self.state.lock();
        state.current_hand.and_then(|hand| state.statuses.get(&hand).copied())
    }

    /// Latest status reported for `hand_side`.
    #[must_use]
    pub fn status_of(&self, hand_side: HandSide) -> Option<CalibrationStatus> {
        self.state.lock().statuses.get(&hand_side).copied()
    }

    /// Latest result, for any hand.
    #[must_use]
    pub fn result(&self) -> Option<CalibrationResult> {
        self.state.lock().last_result
    }

    /// Latest result reported for `hand_side`.
    #[must_use]
    pub fn result_of(&self, hand_side: HandSide) -> Option<CalibrationResult> {
        self.state.lock().results.get(&hand_side).copied()
    }

    /// Returns `true` if the latest result was a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result().is_some_and(CalibrationResult::is_success)
    }

    /// Registers a callback for status changes.
    pub fn add_status_callback<F>(&self, callback: F)
    where
        F: Fn(HandSide, CalibrationStatus) + Send + Sync + 'static,
    {
        self.status_callbacks
            .add(move |(hand, status): &(HandSide, CalibrationStatus)| callback(*hand, *status));
    }

    /// Registers a callback for results.
    pub fn add_result_callback<F>(&self, callback: F)
    where
        F: Fn(HandSide, CalibrationResult) + Send + Sync + 'static,
    {
        self.result_callbacks
            .add(move |(hand, result): &(HandSide, CalibrationResult)| callback(*hand, *result));
    }
}

impl MessageListener for TrackingCalibration {
    fn accepts(&self, kind: MessageKind) -> bool {
        matches!(kind, MessageKind::CalibrationStatus | MessageKind::CalibrationResult)
    }

    fn on_message(&self, message: &Message) {
        match message {
            Message::CalibrationStatus(msg) => {
                {
                    let mut state = self.state.lock();
                    state.current_hand = Some(msg.hand_side);
                    state.statuses.insert(msg.hand_side, msg.status);
                }
                debug!(hand = %msg.hand_side, status = ?msg.status, "Calibration status");
                self.status_callbacks.invoke(&(msg.hand_side, msg.status));
            }
            Message::CalibrationResult(msg) => {
                {
                    let mut state = self.state.lock();
                    state.current_hand = Some(msg.hand_side);
                    state.results.insert(msg.hand_side, msg.result);
                    state.last_result = Some(msg.result);
                }
                info!(hand = %msg.hand_side, success = msg.result.is_success(), "Calibration finished");
                self.result_callbacks.invoke(&(msg.hand_side, msg.result));
            }
            _ => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
