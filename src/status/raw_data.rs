//! Raw sensor samples of a single thimble.
//!
//! Both trackers ignore readings for the other hand and readings that do
//! not carry their actuation point.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::trace;

use crate::protocol::{
    ActuationPoint, AnalogSensorRawData, HandSide, Message, MessageKind, SensorData,
    SensorReadings,
};
use crate::transport::MessageListener;

use super::Callbacks;

// ============================================================================
// Sample
// ============================================================================

/// One timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample<T> {
    /// Epoch milliseconds from the envelope.
    pub timestamp: u64,
    pub data: T,
}

fn extract<T: Copy>(
    readings: &SensorReadings<T>,
    hand_side: HandSide,
    point: ActuationPoint,
) -> Option<Sample<T>> {
    if readings.hand_side != hand_side {
        return None;
    }
    readings.sensor(point).map(|data| Sample {
        timestamp: readings.timestamp,
        data: *data,
    })
}

// ============================================================================
// TrackingRawData
// ============================================================================

/// Keeps the most recent `RAW_DATA` samples of one thimble.
pub struct TrackingRawData {
    hand_side: HandSide,
    actuation_point: ActuationPoint,
    samples: Mutex<VecDeque<Sample<SensorData>>>,
    callbacks: Callbacks<Sample<SensorData>>,
}

impl TrackingRawData {
    /// Number of samples kept.
    pub const CAPACITY: usize = 3;

    #[must_use]
    pub fn new(hand_side: HandSide, actuation_point: ActuationPoint) -> Self {
        Self {
            hand_side,
            actuation_point,
            samples: Mutex::new(VecDeque::with_capacity(Self::CAPACITY)),
            callbacks: Callbacks::new(),
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

    /// Newest sample, if any arrived.
    #[must_use]
    pub fn last_sample(&self) -> Option<Sample<SensorData>> {
        self.samples.lock().back().copied()
    }

    /// Kept samples, oldest first.
    #[must_use]
    pub fn samples(&self) -> Vec<Sample<SensorData>> {
        self.samples.lock().iter().copied().collect()
    }

    /// Registers a callback for every accepted sample.
    pub fn add_sample_callback<F>(&self, callback: F)
    where
        F: Fn(&Sample<SensorData>) + Send + Sync + 'static,
    {
        self.callbacks.add(callback);
    }
}

impl MessageListener for TrackingRawData {
    fn accepts(&self, kind: MessageKind) -> bool {
        kind == MessageKind::RawSensorsData
    }

    fn on_message(&self, message: &Message) {
        let Message::RawSensorsData(readings) = message else {
            return;
        };
        let Some(sample) = extract(readings, self.hand_side, self.actuation_point) else {
            return;
        };

        {
            let mut samples = self.samples.lock();
            if samples.len() == Self::CAPACITY {
                samples.pop_front();
            }
            samples.push_back(sample);
        }

        trace!(hand = %self.hand_side, point = self.actuation_point.key(), ts = sample.timestamp, "Raw sample");
        self.callbacks.invoke(&sample);
    }
}

// ============================================================================
// AnalogSensorData
// ============================================================================

/// Keeps the latest `RAW_SENSOR_ON_MASK` sample of one thimble.
pub struct AnalogSensorData {
    hand_side: HandSide,
    actuation_point: ActuationPoint,
    last: Mutex<Option<Sample<AnalogSensorRawData>>>,
    callbacks: Callbacks<Sample<AnalogSensorRawData>>,
}

impl AnalogSensorData {
    #[must_use]
    pub fn new(hand_side: HandSide, actuation_point: ActuationPoint) -> Self {
        Self {
            hand_side,
            actuation_point,
            last: Mutex::new(None),
            callbacks: Callbacks::new(),
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

    #[must_use]
    pub fn last_sample(&self) -> Option<Sample<AnalogSensorRawData>> {
        *self.last.lock()
    }

    pub fn add_sample_callback<F>(&self, callback: F)
    where
        F: Fn(&Sample<AnalogSensorRawData>) + Send + Sync + 'static,
    {
        self.callbacks.add(callback);
    }
}

impl MessageListener for AnalogSensorData {
    fn accepts(&self, kind: MessageKind) -> bool {
        kind == MessageKind::AnalogSensorsData
    }

    fn on_message(&self, message: &Message) {
        let Message::AnalogSensorsData(readings) = message else {
            return;
        };
        let Some(sample) = extract(readings, self.hand_side, self.actuation_point) else {
            return;
        };

        *self.last.lock() = Some(sample);
        trace!(hand = %self.hand_side, point = self.actuation_point.key(), ts = sample.timestamp, "Analog sample");
        self.callbacks.invoke(&sample);
    }
}

// ============================================================================
// Tests
// ============================================================================
