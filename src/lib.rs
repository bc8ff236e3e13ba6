//! WeArt client - protocol stack for WeArt haptic middleware.
//!
//! This library connects to the WeArt middleware over TCP, sends haptic
//! actuation and session commands, and decodes tracking, sensor and status
//! messages coming back.
//!
//! # Architecture
//!
//! The client follows a single-stream model:
//!
//! - **Framing**: every message is followed by `~`
//! - **Formats**: session and actuation messages use positional text
//!   (`force:0.5:0:0:RIGHT:INDEX`), sensor and status messages use a JSON
//!   envelope (`{"type":"MW_STATUS","ts":..,"data":{..}}`)
//! - **Receive loop**: one task per connection decodes frames and hands
//!   them to registered listeners
//! - **Composition**: a [`HapticObject`] merges a stack of effects and
//!   sends only the settings that changed
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weart_client::{
//!     ActuationPoint, Client, Force, HandSide, Result, Temperature, Texture, TextureType,
//!     TouchEffect, TrackingType,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder().build()?;
//!     client.connect().await?;
//!     client.start(TrackingType::WeArtHand).await?;
//!
//!     let index = client.haptic_object(HandSide::Right, ActuationPoint::Index);
//!     let effect = Arc::new(TouchEffect::new(
//!         Temperature::new(0.8),
//!         Force::new(0.6),
//!         Texture::new(TextureType::CrushedRock),
//!     ));
//!     index.add_effect(effect).await?;
//!
//!     client.stop().await?;
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`] façade and configuration |
//! | [`effect`] | Effects and the [`HapticObject`] composer |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Messages, wire formats and frame codec |
//! | [`status`] | Listeners that track middleware state |
//! | [`transport`] | TCP connection, listeners and observers |

// ============================================================================
// Modules
// ============================================================================

/// Client façade and configuration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Effects and haptic composition.
pub mod effect;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Middleware wire protocol.
pub mod protocol;

/// Middleware state trackers.
pub mod status;

/// TCP transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ConnectionOptions};

// Effect types
pub use effect::{
    Effect, EffectSnapshot, Force, HapticObject, MessageSink, Temperature, Texture, TouchEffect,
};

// Error types
pub use error::{Error, ErrorType, Result};

// Protocol types
pub use protocol::{
    ActuationPoint, ActuationPointFlags, CalibrationResult, CalibrationStatus, HandSide,
    HandSideFlags, HapticTarget, Message, MessageKind, MiddlewareStatus, TextureType,
    TrackingType,
};

// Status trackers
pub use status::{
    AnalogSensorData, DeviceStatusListener, MiddlewareStatusListener, ThimbleTrackingObject,
    TrackingCalibration, TrackingRawData,
};

// Transport types
pub use transport::{CallbackListener, Connection, ConnectionState, ListenerId, MessageListener};
