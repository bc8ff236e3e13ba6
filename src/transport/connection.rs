//! TCP connection and receive loop.
//!
//! This module handles the TCP connection to the WeArt middleware, including
//! framing, decoding and listener dispatch of incoming messages.
//!
//! # Receive Loop
//!
//! A successful [`Connection::connect`] spawns one tokio task that:
//!
//! - Reads the stream through [`FrameCodec`]
//! - Decodes each frame and dispatches it to listeners
//! - Reports decode failures to decode-error callbacks and keeps going
//! - Stops on a shutdown command from [`Connection::close`]
//!
//! Sends happen on the caller's task; the write half sits behind an async
//! mutex so concurrent senders never interleave frames.
//!
//! # States
//!
//! | State | Entered when |
//! |-------|--------------|
//! | `Disconnected` | Created, or a send failed |
//! | `Connecting` | `connect` in progress |
//! | `Connected` | Stream open, receive loop running |
//! | `Closed` | `close` called |
//! | `Faulted` | Connect failed, or the stream ended unexpectedly |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace, warn};

use crate::client::ConnectionOptions;
use crate::error::{Error, ErrorType, Result};
use crate::protocol::{FrameCodec, Message, encode_frame, serializer};

use super::listener::{ListenerId, ListenerRegistry, MessageListener};
use super::observer::{
    ConnectionStatusCallback, DecodeErrorCallback, ErrorCallback, Observers, saturating_millis,
};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Opening the stream.
    Connecting,
    /// Stream open.
    Connected,
    /// Closed by the caller.
    Closed,
    /// Ended by a transport failure.
    Faulted,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the receive loop.
enum ConnectionCommand {
    /// Stop reading and exit.
    Shutdown,
}

// ============================================================================
// ConnectionInner
// ============================================================================

/// State shared between handles and the receive loop.
struct ConnectionInner {
    options: ConnectionOptions,
    state: Mutex<ConnectionState>,
    /// Set before an intentional shutdown so the loop exits quietly.
    closing: AtomicBool,
    /// `true` between the `true` and `false` status notifications.
    online: AtomicBool,
    writer: AsyncMutex<Option<OwnedWriteHalf>>,
    command_tx: Mutex<Option<mpsc::UnboundedSender<ConnectionCommand>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    listeners: ListenerRegistry,
    status_observers: Observers<bool>,
    error_observers: Observers<ErrorType>,
    decode_error_callbacks: RwLock<Vec<DecodeErrorCallback>>,
}

impl ConnectionInner {
    fn set_state(&self, state: ConnectionState) {
        let previous = std::mem::replace(&mut *self.state.lock(), state);
        if previous != state {
            debug!(?previous, current = ?state, "Connection state changed");
        }
    }

    async fn report_error(&self, error_type: ErrorType) {
        self.error_observers
            .notify(error_type, self.options.observer_timeout)
            .await;
    }

    async fn report_online(&self) {
        if !self.online.swap(true, Ordering::SeqCst) {
            self.status_observers
                .notify(true, self.options.observer_timeout)
                .await;
        }
    }

    async fn report_offline(&self) {
        if self.online.swap(false, Ordering::SeqCst) {
            self.status_observers
                .notify(false, self.options.observer_timeout)
                .await;
        }
    }

    fn stop_receive_loop(&self) {
        if let Some(tx) = self.command_tx.lock().take() {
            let _ = tx.send(ConnectionCommand::Shutdown);
        }
    }

    /// Decodes one frame and routes the result.
    fn handle_frame(&self, frame: &str) {
        match serializer::decode(frame) {
            Ok(Some(message)) => {
                let delivered = self.listeners.dispatch(&message);
                trace!(type_id = message.type_id(), delivered, "Message dispatched");
            }
            Ok(None) => {
                trace!(frame, "Ignoring unrecognized frame");
            }
            Err(e) => {
                warn!(error = %e, frame, "Failed to decode frame");
                let callbacks = self.decode_error_callbacks.read().clone();
                for callback in callbacks {
                    callback(&e);
                }
            }
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// TCP connection to the WeArt middleware.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; clones share the same
/// stream, listeners and observers.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Creates a disconnected connection.
    #[must_use]
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                options,
                state: Mutex::new(ConnectionState::Disconnected),
                closing: AtomicBool::new(false),
                online: AtomicBool::new(false),
                writer: AsyncMutex::new(None),
                command_tx: Mutex::new(None),
                task: Mutex::new(None),
                listeners: ListenerRegistry::new(),
                status_observers: Observers::new("connection status"),
                error_observers: Observers::new("error"),
                decode_error_callbacks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Returns the options this connection was created with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Returns `true` if the stream is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens the stream and starts the receive loop.
    ///
    /// On failure error observers receive [`ErrorType::Connection`] and the
    /// connection is left [`ConnectionState::Faulted`]; there is no retry.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if already connected or the peer refuses
    /// - [`Error::ConnectionTimeout`] if the connect timeout elapses
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if matches!(*state, ConnectionState::Connecting | ConnectionState::Connected) {
                return Err(Error::connection("already connected"));
            }
            *state = ConnectionState::Connecting;
        }

        // A loop left over from the previous session must not see the reset flag.
        self.join_receive_loop().await;

        let address = self.inner.options.address.clone();
        let connect_timeout = self.inner.options.connect_timeout;
        debug!(%address, "Connecting to middleware");

        let stream = match timeout(connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return self
                    .fail_connect(Error::connection(format!("{address}: {e}")))
                    .await;
            }
            Err(_) => {
                return self
                    .fail_connect(Error::connection_timeout(saturating_millis(connect_timeout)))
                    .await;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(error = %e, "Failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        *self.inner.writer.lock().await = Some(write_half);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        *self.inner.command_tx.lock() = Some(command_tx);
        self.inner.closing.store(false, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Connected);

        info!(%address, "Connected to middleware");
        self.inner.report_online().await;

        let reader = FramedRead::new(
            read_half,
            FrameCodec::with_max_length(self.inner.options.max_frame_length),
        );
        let handle = tokio::spawn(Self::run_receive_loop(
            Arc::clone(&self.inner),
            reader,
            command_rx,
        ));
        *self.inner.task.lock() = Some(handle);

        Ok(())
    }

    async fn fail_connect(&self, err: Error) -> Result<()> {
        error!(error = %err, "Connection to middleware failed");
        self.inner.set_state(ConnectionState::Faulted);
        self.inner.report_error(ErrorType::Connection).await;
        Err(err)
    }

    /// Closes the connection.
    ///
    /// Idempotent. Connection status observers receive `false` once if the
    /// connection was open.
    pub async fn close(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner.stop_receive_loop();

        let writer = self.inner.writer.lock().await.take();
        if let Some(mut writer) = writer
            && let Err(e) = writer.shutdown().await
        {
            debug!(error = %e, "Error shutting down write half");
        }

        let was_open = {
            let mut state = self.inner.state.lock();
            let was_open = *state == ConnectionState::Connected;
            *state = ConnectionState::Closed;
            was_open
        };
        if was_open {
            info!("Connection closed");
        }

        self.join_receive_loop().await;
        self.inner.report_offline().await;
    }

    /// Waits for the receive task of the current or previous session to exit.
    async fn join_receive_loop(&self) {
        let handle = self.inner.task.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Receive loop task failed");
        }
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Serializes, frames and writes one message.
    ///
    /// A failed write reports [`ErrorType::SendMessage`], notifies status
    /// `false` and leaves the connection [`ConnectionState::Disconnected`].
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if not connected; the transport is untouched
    /// - [`Error::SendMessage`] if the write fails
    /// - [`Error::InvalidPayload`] if the encoded message contains the terminator
    pub async fn send(&self, message: &Message) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::ConnectionClosed);
        }

        let type_id = message.type_id();
        let payload = serializer::encode(message)?;
        let frame = encode_frame(&payload)?;

        let mut writer = self.inner.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(Error::ConnectionClosed);
        };

        match stream.write_all(&frame).await {
            Ok(()) => {
                trace!(type_id, bytes = frame.len(), "Message sent");
                Ok(())
            }
            Err(e) => {
                writer.take();
                drop(writer);
                self.fail_send(type_id, e.to_string()).await
            }
        }
    }

    async fn fail_send(&self, type_id: &'static str, reason: String) -> Result<()> {
        error!(type_id, error = %reason, "Failed to send message");
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner.stop_receive_loop();
        self.inner.set_state(ConnectionState::Disconnected);
        self.inner.report_error(ErrorType::SendMessage).await;
        self.inner.report_offline().await;
        Err(Error::send_message(type_id, reason))
    }

    // ========================================================================
    // Listeners and Observers
    // ========================================================================

    /// Registers a message listener.
    pub fn add_listener(&self, listener: Arc<dyn MessageListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Unregisters a message listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Registers a connection status observer.
    pub fn add_connection_status_callback<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let callback: ConnectionStatusCallback = Arc::new(callback);
        self.inner.status_observers.add(callback);
    }

    /// Registers an error observer.
    pub fn add_error_callback<F>(&self, callback: F)
    where
        F: Fn(ErrorType) + Send + Sync + 'static,
    {
        let callback: ErrorCallback = Arc::new(callback);
        self.inner.error_observers.add(callback);
    }

    /// Registers a callback for frames that fail to decode.
    ///
    /// Runs on the receive task, like listeners.
    pub fn add_decode_error_callback<F>(&self, callback: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        let callback: DecodeErrorCallback = Arc::new(callback);
        self.inner.decode_error_callbacks.write().push(callback);
    }

    // ========================================================================
    // Receive Loop
    // ========================================================================

    async fn run_receive_loop(
        inner: Arc<ConnectionInner>,
        mut reader: FramedRead<OwnedReadHalf, FrameCodec>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    ) {
        let fault = loop {
            tokio::select! {
                frame = reader.next() => {
                    match frame {
                        Some(Ok(frame)) => inner.handle_frame(&frame),
                        Some(Err(e)) => break Some(e.to_string()),
                        None => break Some("stream ended".to_string()),
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                        }
                        None => {
                            debug!("Command channel closed");
                        }
                    }
                    break None;
                }
            }
        };

        if let Some(reason) = fault
            && !inner.closing.load(Ordering::SeqCst)
        {
            let err = Error::receive_message(reason);
            error!(error = %err, "Receive loop terminated");
            inner.writer.lock().await.take();
            inner.set_state(ConnectionState::Faulted);
            inner.report_error(ErrorType::ReceiveMessage).await;
            inner.report_offline().await;
        }

        debug!("Receive loop terminated");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.inner.options.address)
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .field("status_observers", &self.inner.status_observers.len())
            .field("error_observers", &self.inner.error_observers.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::protocol::{ActuationPoint, HandSide, HapticTarget, MessageKind};
    use crate::transport::CallbackListener;

    async fn bind() -> (TcpListener, ConnectionOptions) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let options = ConnectionOptions::new()
            .with_address(address)
            .with_observer_timeout(Duration::from_secs(1));
        (listener, options)
    }

    #[tokio::test]
    async fn test_send_before_connect_is_rejected() {
        let connection = Connection::new(ConnectionOptions::new());
        let result = connection.send(&Message::StopFromClient).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_refused_faults() {
        let (listener, options) = bind().await;
        drop(listener);

        let connection = Connection::new(options);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        connection.add_error_callback(move |e| sink.lock().push(e));

        assert!(connection.connect().await.is_err());
        assert_eq!(connection.state(), ConnectionState::Faulted);
        assert_eq!(*errors.lock(), vec![ErrorType::Connection]);
    }

    #[tokio::test]
    async fn test_send_writes_terminated_frame() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        connection.connect().await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();

        let target = HapticTarget::new(HandSide::Left, ActuationPoint::Thumb);
        connection.send(&Message::StopForce(target)).await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"stopForce:LEFT:THUMB~");

        connection.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_reports_once() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        connection.add_connection_status_callback(move |s| sink.lock().push(s));

        connection.connect().await.unwrap();
        let _peer = listener.accept().await.unwrap();

        connection.close().await;
        connection.close().await;

        assert_eq!(*statuses.lock(), vec![true, false]);
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(matches!(
            connection.send(&Message::StopFromClient).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_reconnect_after_close_is_not_faulted_by_old_loop() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        connection.add_error_callback(move |e| sink.lock().push(e));
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        connection.add_connection_status_callback(move |s| sink.lock().push(s));

        connection.connect().await.unwrap();
        let (first_peer, _) = listener.accept().await.unwrap();

        connection.close().await;
        assert!(connection.inner.task.lock().is_none());

        connection.connect().await.unwrap();
        let (mut second_peer, _) = listener.accept().await.unwrap();
        drop(first_peer);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(connection.state(), ConnectionState::Connected);
        assert!(errors.lock().is_empty());
        assert_eq!(*statuses.lock(), vec![true, false, true]);

        connection.send(&Message::StopFromClient).await.unwrap();
        let mut buf = vec![0u8; 32];
        let n = second_peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"StopFromClient~");

        connection.close().await;
    }

    #[tokio::test]
    async fn test_failed_write_disconnects_and_notifies() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        connection.add_error_callback(move |e| sink.lock().push(e));
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        connection.add_connection_status_callback(move |s| sink.lock().push(s));

        connection.connect().await.unwrap();
        let _peer = listener.accept().await.unwrap();

        // Shutting down our own write direction makes the next write fail.
        connection
            .inner
            .writer
            .lock()
            .await
            .as_mut()
            .unwrap()
            .shutdown()
            .await
            .unwrap();

        let result = connection.send(&Message::StopFromClient).await;
        match result {
            Err(Error::SendMessage { type_id, .. }) => assert_eq!(type_id, "StopFromClient"),
            other => panic!("expected send error, got {other:?}"),
        }
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(*errors.lock(), vec![ErrorType::SendMessage]);
        assert_eq!(*statuses.lock(), vec![true, false]);

        // The receive loop stops quietly instead of faulting.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(errors.lock().len(), 1);
        assert!(matches!(
            connection.send(&Message::StopFromClient).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_received_frames_reach_listeners() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        let received = Arc::new(AtomicUsize::new(0));
        let decode_errors = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&received);
        connection.add_listener(Arc::new(CallbackListener::new(
            [MessageKind::StopTemperature],
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )));
        let counter = Arc::clone(&decode_errors);
        connection.add_decode_error_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        connection.connect().await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();
        peer.write_all(b"stopTemperature:RIGHT:INDEX~temperature:0.5~Unknown~stopTemp")
            .await
            .unwrap();
        peer.write_all(b"erature:LEFT:PALM~").await.unwrap();

        for _ in 0..100 {
            if received.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(received.load(Ordering::SeqCst), 2);
        assert_eq!(decode_errors.load(Ordering::SeqCst), 1);

        connection.close().await;
    }

    #[tokio::test]
    async fn test_peer_disconnect_faults() {
        let (listener, options) = bind().await;
        let connection = Connection::new(options);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        connection.add_error_callback(move |e| sink.lock().push(e));

        connection.connect().await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        for _ in 0..100 {
            if connection.state() == ConnectionState::Faulted {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(connection.state(), ConnectionState::Faulted);
        for _ in 0..100 {
            if !errors.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*errors.lock(), vec![ErrorType::ReceiveMessage]);
    }
}
