//! Connection options and configuration.
//!
//! Provides a type-safe interface for configuring how the client reaches the
//! middleware and how long it waits on peers and observers.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use weart_client::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_address("192.168.1.20:13031")
//!     .with_connect_timeout(Duration::from_secs(2));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::protocol::DEFAULT_MAX_FRAME_LENGTH;

// ============================================================================
// Constants
// ============================================================================

/// Address the middleware listens on by default.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:13031";

/// Default bound on opening the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single observer notification round.
pub const DEFAULT_OBSERVER_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Middleware connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Middleware address as `host:port`.
    pub address: String,

    /// Maximum time to wait for the TCP connection to open.
    pub connect_timeout: Duration,

    /// Maximum time a status or error notification waits for observers.
    pub observer_timeout: Duration,

    /// Longest frame accepted from the middleware, terminator excluded.
    pub max_frame_length: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            observer_timeout: DEFAULT_OBSERVER_TIMEOUT,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the middleware address (`host:port`).
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the address from host and port.
    #[inline]
    #[must_use]
    pub fn with_host_port(mut self, host: &str, port: u16) -> Self {
        self.address = format!("{host}:{port}");
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the observer notification timeout.
    #[inline]
    #[must_use]
    pub fn with_observer_timeout(mut self, timeout: Duration) -> Self {
        self.observer_timeout = timeout;
        self
    }

    /// Sets the maximum accepted frame length.
    #[inline]
    #[must_use]
    pub fn with_max_frame_length(mut self, length: usize) -> Self {
        self.max_frame_length = length;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let Some((host, port)) = self.address.rsplit_once(':') else {
            return Err(format!("Address '{}' must be host:port", self.address));
        };
        if host.is_empty() {
            return Err(format!("Address '{}' has an empty host", self.address));
        }
        if port.parse::<u16>().is_err() {
            return Err(format!("Address '{}' has an invalid port", self.address));
        }
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout must be greater than zero".to_string());
        }
        if self.observer_timeout.is_zero() {
            return Err("Observer timeout must be greater than zero".to_string());
        }
        if self.max_frame_length == 0 {
            return Err("Maximum frame length must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Returns the configured address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

// ============================================================================
// Tests
// ============================================================================
