//! Closure and abduction of a single thimble.

use parking_lot::Mutex;
use tracing::trace;

use crate::protocol::{
    ActuationPoint, DEFAULT_ABDUCTION, DEFAULT_CLOSURE, HandSide, Message, MessageKind,
};
use crate::transport::MessageListener;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Reading {
    closure: f32,
    abduction: f32,
}

/// Follows `Tracking` messages for one hand and actuation point.
///
/// Values are normalized to `[0, 1]`. Until the first message arrives the
/// closure is `0.0` and the abduction is [`DEFAULT_ABDUCTION`].
#[derive(Debug)]
pub struct ThimbleTrackingObject {
    hand_side: HandSide,
    actuation_point: ActuationPoint,
    reading: Mutex<Reading>,
}

impl ThimbleTrackingObject {
    #[must_use]
    pub fn new(hand_side: HandSide, actuation_point: ActuationPoint) -> Self {
        Self {
            hand_side,
            actuation_point,
            reading: Mutex::new(Reading {
                closure: DEFAULT_CLOSURE,
                abduction: DEFAULT_ABDUCTION,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub const fn hand_side(&self) -> HandSide {
        self.hand_side
    }

    #[inline]
    #[must_use]
    pub const fn actuation_point(&self) -> ActuationPoint {
        self.actuation_point
    }

    /// Latest closure, `0.0` open to `1.0` closed.
    #[must_use]
    pub fn closure(&self) -> f32 {
        self.reading.lock().closure
    }

    /// Latest abduction. Only the thumb reports one.
    #[must_use]
    pub fn abduction(&self) -> f32 {
        self.reading.lock().abduction
    }
}

impl MessageListener for ThimbleTrackingObject {
    fn accepts(&self, kind: MessageKind) -> bool {
        kind == MessageKind::Tracking
    }

    fn on_message(&self, message: &Message) {
        let Message::Tracking(tracking) = message else {
            return;
        };

        let reading = Reading {
            closure: tracking.closure(self.hand_side, self.actuation_point),
            abduction: tracking.abduction(self.hand_side, self.actuation_point),
        };
        *self.reading.lock() = reading;

        trace!(
            hand = %self.hand_side,
            point = self.actuation_point.key(),
            closure = reading.closure,
            abduction = reading.abduction,
            "Tracking updated"
        );
    }
}
