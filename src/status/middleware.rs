//! Middleware status tracking.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::{ConnectedDeviceStatus, Message, MessageKind, MiddlewareStatus};
use crate::transport::MessageListener;

use super::Callbacks;

// ============================================================================
// MiddlewareStatusUpdate
// ============================================================================

/// Middleware status merged with the latest device list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MiddlewareStatusUpdate {
    /// Timestamp of the most recent contributing message.
    pub timestamp: u64,
    pub status: MiddlewareStatus,
    pub version: String,
    pub status_code: i32,
    pub error_desc: String,
    pub actuations_enabled: bool,
    pub devices: Vec<ConnectedDeviceStatus>,
}

// ============================================================================
// MiddlewareStatusListener
// ============================================================================

/// Tracks `MW_STATUS` and `DEVICES_STATUS`.
///
/// A status message updates everything except the device list; a device
/// message updates only the device list. Either one notifies callbacks
/// with the merged result.
#[derive(Default)]
pub struct MiddlewareStatusListener {
    last: Mutex<MiddlewareStatusUpdate>,
    callbacks: Callbacks<MiddlewareStatusUpdate>,
}

impl MiddlewareStatusListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for every update.
    pub fn add_status_callback<F>(&self, callback: F)
    where
        F: Fn(&MiddlewareStatusUpdate) + Send + Sync + 'static,
    {
        self.callbacks.add(callback);
    }

    /// Returns the latest merged status.
    #[must_use]
    pub fn last_status(&self) -> MiddlewareStatusUpdate {
        self.last.lock().clone()
    }
}

impl MessageListener for MiddlewareStatusListener {
    fn accepts(&self, kind: MessageKind) -> bool {
        matches!(kind, MessageKind::MiddlewareStatus | MessageKind::DevicesStatus)
    }

    fn on_message(&self, message: &Message) {
        let update = {
            let mut last = self.last.lock();
            match message {
                Message::MiddlewareStatus(status) => {
                    let data = &status.data;
                    last.timestamp = status.timestamp;
                    last.status = data.status;
                    last.version.clone_from(&data.version);
                    last.status_code = data.status_code;
                    last.error_desc.clone_from(&data.error_desc);
                    last.actuations_enabled = data.actuations_enabled;
                }
                Message::DevicesStatus(status) => {
                    last.timestamp = status.timestamp;
                    last.devices.clone_from(&status.devices);
                }
                _ => return,
            }
            last.clone()
        };

        debug!(status = %update.status, devices = update.devices.len(), "Middleware status updated");
        self.callbacks.invoke(&update);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::protocol::{DevicesStatusMessage, HandSide, MiddlewareStatusData, MiddlewareStatusMessage};

    fn status_message(ts: u64, status: MiddlewareStatus) -> Message {
        Message::MiddlewareStatus(MiddlewareStatusMessage {
            timestamp: ts,
            data: MiddlewareStatusData {
                status,
                version: "2.1.0".into(),
                status_code: 3,
                actuations_enabled: true,
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_accepts_status_kinds() {
        let listener = MiddlewareStatusListener::new();
        assert!(listener.accepts(MessageKind::MiddlewareStatus));
        assert!(listener.accepts(MessageKind::DevicesStatus));
        assert!(!listener.accepts(MessageKind::Tracking));
    }

    #[test]
    fn test_merges_status_and_devices() {
        let listener = MiddlewareStatusListener::new();
        listener.on_message(&status_message(10, MiddlewareStatus::Running));
        listener.on_message(&Message::DevicesStatus(DevicesStatusMessage {
            timestamp: 11,
            devices: vec![ConnectedDeviceStatus {
                hand_side: HandSide::Right,
                ..Default::default()
            }],
        }));

        let last = listener.last_status();
        assert_eq!(last.timestamp, 11);
        assert_eq!(last.status, MiddlewareStatus::Running);
        assert_eq!(last.version, "2.1.0");
        assert_eq!(last.status_code, 3);
        assert_eq!(last.devices.len(), 1);

        listener.on_message(&status_message(12, MiddlewareStatus::Idle));
        assert_eq!(listener.last_status().devices.len(), 1);
    }

    #[test]
    fn test_callbacks_receive_updates() {
        let listener = MiddlewareStatusListener::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        listener.add_status_callback(move |update| sink.lock().push(update.status));

        listener.on_message(&status_message(1, MiddlewareStatus::Starting));
        listener.on_message(&status_message(2, MiddlewareStatus::Running));

        assert_eq!(*seen.lock(), vec![MiddlewareStatus::Starting, MiddlewareStatus::Running]);
    }
}
