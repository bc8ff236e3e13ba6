//! TCP transport layer.
//!
//! This module handles communication between the client and the WeArt
//! middleware over a single TCP stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │            TCP               │  WeArt          │
//! │                 │                              │  Middleware     │
//! │  Connection     │◄────────────────────────────►│                 │
//! │  → Listeners    │      127.0.0.1:13031         │  (frames end    │
//! │                 │                              │   with '~')     │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::new` - Create with [`ConnectionOptions`](crate::ConnectionOptions)
//! 2. `Connection::connect` - Open the stream, start the receive loop
//! 3. `Connection::send` - Write messages; listeners receive decoded frames
//! 4. `Connection::close` - Stop the loop and close the stream
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | TCP connection and receive loop |
//! | `listener` | Listener trait and dispatch |
//! | `observer` | Status and error observer fan-out |

// ============================================================================
// Submodules
// ============================================================================

/// TCP connection and receive loop.
pub mod connection;

/// Message listeners.
pub mod listener;

/// Connection status and error observers.
pub mod observer;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionState};
pub use listener::{CallbackListener, ListenerId, MessageListener};
pub use observer::{ConnectionStatusCallback, DecodeErrorCallback, ErrorCallback};
