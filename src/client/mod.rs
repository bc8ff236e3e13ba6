//! WeArt client module.
//!
//! This module provides the main entry point for talking to the middleware.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Session commands over one connection |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ConnectionOptions`] | Address, timeouts and frame limit |
//!
//! # Example
//!
//! ```no_run
//! use weart_client::{Client, Result, TrackingType};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder().address("127.0.0.1:13031").build()?;
//! client.connect().await?;
//! client.start(TrackingType::WeArtHand).await?;
//! client.request_middleware_status().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Connection options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::Client;
pub use options::{
    ConnectionOptions, DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT, DEFAULT_OBSERVER_TIMEOUT,
};
