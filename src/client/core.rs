//! WeArt client façade.
//!
//! The [`Client`] owns one middleware [`Connection`] and offers the session
//! commands of the SDK on top of it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use weart_client::{ActuationPoint, Client, HandSide, ThimbleTrackingObject, TrackingType};
//!
//! # async fn example() -> weart_client::Result<()> {
//! let client = Client::builder().build()?;
//! client.connect().await?;
//! client.start(TrackingType::WeArtHand).await?;
//!
//! let thumb = Arc::new(ThimbleTrackingObject::new(HandSide::Right, ActuationPoint::Thumb));
//! client.add_thimble_tracking(Arc::clone(&thumb));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::effect::HapticObject;
use crate::error::{Error, ErrorType, Result};
use crate::protocol::{ActuationPointFlags, HandSideFlags, Message, TrackingType};
use crate::status::ThimbleTrackingObject;
use crate::transport::{Connection, ConnectionState, ListenerId, MessageListener};

use super::builder::ClientBuilder;
use super::options::ConnectionOptions;

// ============================================================================
// Types
// ============================================================================

type ThimbleEntry = (ListenerId, Arc<ThimbleTrackingObject>);

/// Internal shared state for the client.
struct ClientInner {
    connection: Connection,

    /// Registered tracking objects with their listener handles.
    thimbles: Mutex<Vec<ThimbleEntry>>,
}

// ============================================================================
// Client
// ============================================================================

/// WeArt middleware client.
///
/// Cloning is cheap; clones share the connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.options().address())
            .field("state", &self.state())
            .field("thimble_tracking_count", &self.thimble_tracking_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a disconnected client. Options are not validated here; use
    /// [`Client::builder`] for that.
    #[must_use]
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                connection: Connection::new(options),
                thimbles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        self.inner.connection.options()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Connects to the middleware.
    ///
    /// # Errors
    ///
    /// See [`Connection::connect`].
    pub async fn connect(&self) -> Result<()> {
        self.inner.connection.connect().await
    }

    /// Closes the connection. Registered listeners stay registered.
    pub async fn close(&self) {
        self.inner.connection.close().await;
    }
}

// ============================================================================
// Client - Session Commands
// ============================================================================

impl Client {
    /// Starts the middleware session and announces the SDK identity.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if not connected
    /// - [`Error::SendMessage`] if the write fails
    pub async fn start(&self, tracking_type: TrackingType) -> Result<()> {
        info!(tracking = ?tracking_type, "Starting session");
        self.send(&Message::start(tracking_type)).await
    }

    /// Stops the middleware session.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping session");
        self.send(&Message::StopFromClient).await
    }

    /// Starts finger-tracking calibration.
    ///
    /// Progress arrives as `CalibrationStatus` and `CalibrationResult`;
    /// register a [`TrackingCalibration`](crate::TrackingCalibration) to
    /// follow it.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn start_calibration(&self) -> Result<()> {
        self.send(&Message::StartCalibration).await
    }

    /// Stops finger-tracking calibration.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn stop_calibration(&self) -> Result<()> {
        self.send(&Message::StopCalibration).await
    }

    /// Enables the raw sensor stream.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn start_raw_data(&self) -> Result<()> {
        self.send(&Message::raw_data_on()).await
    }

    /// Disables the raw sensor stream.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn stop_raw_data(&self) -> Result<()> {
        self.send(&Message::raw_data_off()).await
    }

    /// Asks the middleware for a `MW_STATUS` report.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn request_middleware_status(&self) -> Result<()> {
        self.send(&Message::get_middleware_status()).await
    }

    /// Asks the middleware for a `DEVICES_STATUS` report.
    ///
    /// # Errors
    ///
    /// See [`Client::start`].
    pub async fn request_devices_status(&self) -> Result<()> {
        self.send(&Message::get_devices_status()).await
    }

    /// Sends any message.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn send(&self, message: &Message) -> Result<()> {
        self.inner.connection.send(message).await
    }
}

// ============================================================================
// Client - Tracking and Effects
// ============================================================================

impl Client {
    /// Registers a tracking object. Returns `false` if it was already
    /// registered.
    pub fn add_thimble_tracking(&self, thimble: Arc<ThimbleTrackingObject>) -> bool {
        let mut thimbles = self.inner.thimbles.lock();
        if thimbles.iter().any(|(_, t)| Arc::ptr_eq(t, &thimble)) {
            return false;
        }

        let id = self.inner.connection.add_listener(Arc::clone(&thimble) as Arc<dyn MessageListener>);
        debug!(
            hand = %thimble.hand_side(),
            point = thimble.actuation_point().key(),
            %id,
            "Thimble tracking added"
        );
        thimbles.push((id, thimble));
        true
    }

    /// Unregisters a tracking object. Returns `false` if it was not
    /// registered.
    pub fn remove_thimble_tracking(&self, thimble: &Arc<ThimbleTrackingObject>) -> bool {
        let mut thimbles = self.inner.thimbles.lock();
        let Some(index) = thimbles.iter().position(|(_, t)| Arc::ptr_eq(t, thimble)) else {
            return false;
        };

        let (id, _) = thimbles.remove(index);
        self.inner.connection.remove_listener(id)
    }

    #[must_use]
    pub fn thimble_tracking_count(&self) -> usize {
        self.inner.thimbles.lock().len()
    }

    /// Creates a haptic object that sends through this client's connection.
    pub fn haptic_object(
        &self,
        hand_sides: impl Into<HandSideFlags>,
        actuation_points: impl Into<ActuationPointFlags>,
    ) -> HapticObject {
        HapticObject::new(
            Arc::new(self.inner.connection.clone()),
            hand_sides,
            actuation_points,
        )
    }
}

// ============================================================================
// Client - Listeners and Observers
// ============================================================================

impl Client {
    /// Registers a message listener.
    pub fn add_listener(&self, listener: Arc<dyn MessageListener>) -> ListenerId {
        self.inner.connection.add_listener(listener)
    }

    /// Unregisters a message listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.connection.remove_listener(id)
    }

    /// Registers a connection status observer.
    pub fn add_connection_status_callback<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.connection.add_connection_status_callback(callback);
    }

    /// Registers an error observer.
    pub fn add_error_callback<F>(&self, callback: F)
    where
        F: Fn(ErrorType) + Send + Sync + 'static,
    {
        self.inner.connection.add_error_callback(callback);
    }

    /// Registers a callback for frames that fail to decode.
    pub fn add_decode_error_callback<F>(&self, callback: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.inner.connection.add_decode_error_callback(callback);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::{ActuationPoint, HandSide};

    fn client() -> Client {
        Client::new(ConnectionOptions::default())
    }

    #[test]
    fn test_thimble_tracking_registration() {
        let client = client();
        let thumb = Arc::new(ThimbleTrackingObject::new(HandSide::Right, ActuationPoint::Thumb));

        assert!(client.add_thimble_tracking(Arc::clone(&thumb)));
        assert!(!client.add_thimble_tracking(Arc::clone(&thumb)));
        assert_eq!(client.thimble_tracking_count(), 1);
        assert_eq!(client.connection().listener_count(), 1);

        assert!(client.remove_thimble_tracking(&thumb));
        assert!(!client.remove_thimble_tracking(&thumb));
        assert_eq!(client.thimble_tracking_count(), 0);
        assert_eq!(client.connection().listener_count(), 0);
    }

    #[tokio::test]
    async fn test_commands_fail_when_disconnected() {
        let client = client();
        let err = client.start(TrackingType::WeArtHand).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(client.request_devices_status().await.is_err());
    }

    #[test]
    fn test_haptic_object_covers_requested_targets() {
        let client = client();
        let object = client.haptic_object(HandSideFlags::BOTH, ActuationPoint::Index);
        assert_eq!(object.targets().count(), 2);
    }

    #[test]
    fn test_debug_shows_state() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("Disconnected"));
    }
}
