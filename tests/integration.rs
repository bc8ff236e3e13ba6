//! End-to-end tests against a fake middleware on a local TCP listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_test::assert_ok;
use tokio_util::codec::FramedRead;
use tracing_subscriber::EnvFilter;

use weart_client::protocol::{FrameCodec, encode_frame, serializer};
use weart_client::status::MiddlewareStatusListener;
use weart_client::{
    ActuationPoint, CallbackListener, Client, ConnectionState, Force, HandSide, Message,
    MessageKind, MiddlewareStatus, Temperature, Texture, TextureType, ThimbleTrackingObject,
    TouchEffect, TrackingType,
};

// ============================================================================
// Fake Middleware
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

struct Middleware {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: OwnedWriteHalf,
}

impl Middleware {
    async fn next_frame(&mut self) -> Result<String> {
        match timeout(WAIT, self.reader.next()).await? {
            Some(frame) => Ok(frame?),
            None => bail!("client closed the stream"),
        }
    }

    async fn next_message(&mut self) -> Result<Message> {
        let frame = self.next_frame().await?;
        serializer::decode(&frame)?.with_context(|| format!("unknown frame: {frame}"))
    }

    async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn send_frame(&mut self, payload: &str) -> Result<()> {
        let frame = encode_frame(payload)?;
        self.send_raw(&frame).await
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

async fn connected_pair() -> Result<(Client, Middleware)> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    let client = Client::builder().address(address).build()?;

    let (accepted, connected) = tokio::join!(listener.accept(), client.connect());
    connected?;
    let (stream, _) = accepted?;
    let (read_half, write_half) = stream.into_split();

    Ok((
        client,
        Middleware {
            reader: FramedRead::new(read_half, FrameCodec::new()),
            writer: write_half,
        },
    ))
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Result<T> {
    timeout(WAIT, rx.recv()).await?.context("channel closed")
}

// ============================================================================
// Session Commands
// ============================================================================

#[tokio::test]
async fn test_start_and_stop_session() -> Result<()> {
    let (client, mut middleware) = connected_pair().await?;

    assert_ok!(client.start(TrackingType::WeArtHand).await);
    assert_eq!(middleware.next_frame().await?, "StartFromClient:SdkLLPY:2.0.0:TrackType1");

    assert_ok!(client.start_calibration().await);
    assert_eq!(middleware.next_frame().await?, "StartCalibration");

    assert_ok!(client.stop().await);
    assert_eq!(middleware.next_frame().await?, "StopFromClient");

    client.close().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    Ok(())
}

#[tokio::test]
async fn test_raw_data_requests_use_json_envelope() -> Result<()> {
    let (client, mut middleware) = connected_pair().await?;

    client.start_raw_data().await?;
    let frame = middleware.next_frame().await?;
    assert!(frame.starts_with(r#"{"type":"RAW_DATA_ON""#), "{frame}");

    client.stop_raw_data().await?;
    assert_eq!(middleware.next_message().await?.kind(), MessageKind::RawDataOff);

    client.close().await;
    Ok(())
}

// ============================================================================
// Status Replies
// ============================================================================

#[tokio::test]
async fn test_middleware_status_reaches_tracker() -> Result<()> {
    let (client, mut middleware) = connected_pair().await?;

    let tracker = Arc::new(MiddlewareStatusListener::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    tracker.add_status_callback(move |update| {
        let _ = tx.send(update.clone());
    });
    client.add_listener(tracker.clone());

    client.request_middleware_status().await?;
    assert_eq!(middleware.next_message().await?.kind(), MessageKind::GetMiddlewareStatus);

    // Split the reply inside the payload and right before the terminator.
    let reply = r#"{"type":"MW_STATUS","ts":1700000000000,"data":{"status":"RUNNING","version":"2.1.0","statusCode":0,"errorDesc":"","actuationsEnabled":true,"connectedDevices":[]}}"#;
    let (head, tail) = reply.split_at(20);
    middleware.send_raw(head.as_bytes()).await?;
    middleware.send_raw(tail.as_bytes()).await?;
    middleware.send_raw(b"~").await?;

    let update = recv(&mut rx).await?;
    assert_eq!(update.timestamp, 1_700_000_000_000);
    assert_eq!(update.status, MiddlewareStatus::Running);
    assert!(update.actuations_enabled);
    assert_eq!(tracker.last_status(), update);

    client.close().await;
    Ok(())
}

#[tokio::test]
async fn test_bad_frames_do_not_stop_the_loop() -> Result<()> {
    let (client, mut middleware) = connected_pair().await?;

    let decode_errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&decode_errors);
    client.add_decode_error_callback(move |err| {
        assert!(err.is_decode_error());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let thumb = Arc::new(ThimbleTrackingObject::new(HandSide::Right, ActuationPoint::Thumb));
    assert!(client.add_thimble_tracking(Arc::clone(&thumb)));

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.add_listener(Arc::new(CallbackListener::new([MessageKind::Tracking], move |_| {
        let _ = tx.send(());
    })));

    middleware.send_frame("Tracking:TrackType1:1:2").await?;
    middleware.send_frame("NotAMessage:1:2:3").await?;
    middleware.send_frame("Tracking:TrackType1:120:51:200:90:10:255:0:77").await?;

    recv(&mut rx).await?;
    assert_eq!(decode_errors.load(Ordering::SeqCst), 1);
    assert!((thumb.closure() - 0.2).abs() < 1e-6);
    assert!(client.is_connected());

    client.close().await;
    Ok(())
}

// ============================================================================
// Haptic Composition
// ============================================================================

#[tokio::test]
async fn test_haptic_object_over_connection() -> Result<()> {
    let (client, mut middleware) = connected_pair().await?;
    let index = client.haptic_object(HandSide::Right, ActuationPoint::Index);

    let effect: Arc<dyn weart_client::Effect> = Arc::new(TouchEffect::new(
        Temperature::new(0.8),
        Force::new(0.6),
        Texture::new(TextureType::CrushedRock),
    ));
    assert!(index.add_effect(Arc::clone(&effect)).await?);

    assert_eq!(middleware.next_frame().await?, "temperature:0.8:RIGHT:INDEX");
    assert_eq!(middleware.next_frame().await?, "force:0.6:0:0:RIGHT:INDEX");
    let texture = middleware.next_message().await?;
    let Message::SetTexture(texture) = texture else {
        bail!("expected texture, got {texture:?}");
    };
    assert_eq!(texture.texture(), Some(TextureType::CrushedRock));

    assert!(index.remove_effect(&effect).await?);
    assert_eq!(middleware.next_frame().await?, "stopTemperature:RIGHT:INDEX");
    assert_eq!(middleware.next_frame().await?, "stopForce:RIGHT:INDEX");
    assert_eq!(middleware.next_frame().await?, "stopTexture:RIGHT:INDEX");

    client.close().await;
    Ok(())
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[tokio::test]
async fn test_peer_close_reports_offline() -> Result<()> {
    let (client, middleware) = connected_pair().await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.add_connection_status_callback(move |online| {
        let _ = tx.send(online);
    });

    drop(middleware);

    assert!(!recv(&mut rx).await?);
    assert_eq!(client.state(), ConnectionState::Faulted);
    assert!(client.stop().await.is_err());
    Ok(())
}
