//! Listeners that track middleware state.
//!
//! Each tracker is a [`MessageListener`](crate::MessageListener): register
//! it on a connection and it caches the latest decoded state and runs its
//! callbacks, on the receive task, for every accepted message.
//!
//! | Tracker | Accepts | Keeps |
//! |---------|---------|-------|
//! | [`MiddlewareStatusListener`] | `MW_STATUS`, `DEVICES_STATUS` | Merged status |
//! | [`DeviceStatusListener`] | `DEVICES_STATUS` | Device list |
//! | [`TrackingCalibration`] | `CalibrationStatus`, `CalibrationResult` | Per-hand status and result |
//! | [`ThimbleTrackingObject`] | `Tracking` | Closure and abduction of one thimble |
//! | [`TrackingRawData`] | `RAW_DATA` | Last three samples of one thimble |
//! | [`AnalogSensorData`] | `RAW_SENSOR_ON_MASK` | Last sample of one thimble |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;

// ============================================================================
// Submodules
// ============================================================================

/// Calibration tracking.
pub mod calibration;

/// Device status tracking.
pub mod device;

/// Middleware status tracking.
pub mod middleware;

/// Raw and analog sensor samples.
pub mod raw_data;

/// Finger tracking.
pub mod tracking;

// ============================================================================
// Re-exports
// ============================================================================

pub use calibration::TrackingCalibration;
pub use device::{DeviceStatusListener, DeviceStatusUpdate};
pub use middleware::{MiddlewareStatusListener, MiddlewareStatusUpdate};
pub use raw_data::{AnalogSensorData, Sample, TrackingRawData};
pub use tracking::ThimbleTrackingObject;

// ============================================================================
// Callbacks
// ============================================================================

/// Ordered callbacks invoked synchronously with a borrowed value.
pub(crate) struct Callbacks<T> {
    entries: RwLock<Vec<Arc<dyn Fn(&T) + Send + Sync>>>,
}

impl<T> Callbacks<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.entries.write().push(Arc::new(callback));
    }

    /// Runs every callback. The registration lock is not held meanwhile.
    pub(crate) fn invoke(&self, value: &T) {
        let snapshot = self.entries.read().clone();
        for callback in snapshot {
            callback(value);
        }
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}
