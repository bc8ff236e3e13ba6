//! Device status tracking.

use parking_lot::Mutex;
use tracing::debug;

use crate::protocol::{ConnectedDeviceStatus, HandSide, Message, MessageKind};
use crate::transport::MessageListener;

use super::Callbacks;

/// Latest `DEVICES_STATUS` contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceStatusUpdate {
    pub timestamp: u64,
    pub devices: Vec<ConnectedDeviceStatus>,
}

impl DeviceStatusUpdate {
    /// Returns the device worn on `hand_side`, if connected.
    #[must_use]
    pub fn device(&self, hand_side: HandSide) -> Option<&ConnectedDeviceStatus> {
        self.devices.iter().find(|d| d.hand_side == hand_side)
    }
}

/// Tracks `DEVICES_STATUS`.
#[derive(Default)]
pub struct DeviceStatusListener {
    last: Mutex<DeviceStatusUpdate>,
    callbacks: Callbacks<DeviceStatusUpdate>,
}

impl DeviceStatusListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_status_callback<F>(&self, callback: F)
    where
        F: Fn(&DeviceStatusUpdate) + Send + Sync + 'static,
    {
        self.callbacks.add(callback);
    }

    #[must_use]
    pub fn last_status(&self) -> DeviceStatusUpdate {
        self.last.lock().clone()
    }
}

impl MessageListener for DeviceStatusListener {
    fn accepts(&self, kind: MessageKind) -> bool {
        kind == MessageKind::DevicesStatus
    }

    fn on_message(&self, message: &Message) {
        let Message::DevicesStatus(status) = message else {
            return;
        };

        let update = DeviceStatusUpdate {
            timestamp: status.timestamp,
            devices: status.devices.clone(),
        };
        *self.last.lock() = update.clone();

        debug!(devices = update.devices.len(), "Device status updated");
        self.callbacks.invoke(&update);
    }
}
