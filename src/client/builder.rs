//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use weart_client::Client;
//!
//! # fn example() -> weart_client::Result<()> {
//! let client = Client::builder()
//!     .address("127.0.0.1:13031")
//!     .connect_timeout(Duration::from_secs(2))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

use super::core::Client;
use super::options::ConnectionOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    options: ConnectionOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the middleware address.
    ///
    /// # Arguments
    ///
    /// * `address` - `host:port`, e.g. "127.0.0.1:13031"
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.options = self.options.with_address(address);
        self
    }

    /// Sets the middleware address from host and port.
    #[inline]
    #[must_use]
    pub fn host_port(mut self, host: &str, port: u16) -> Self {
        self.options = self.options.with_host_port(host, port);
        self
    }

    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_connect_timeout(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn observer_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_observer_timeout(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn max_frame_length(mut self, length: usize) -> Self {
        self.options = self.options.with_max_frame_length(length);
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the client with validation. Does not connect.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    pub fn build(self) -> Result<Client> {
        self.options.validate().map_err(|message| {
            Error::config(format!(
                "{message}\n\
                 Example: Client::builder().address(\"127.0.0.1:13031\")"
            ))
        })?;

        Ok(Client::new(self.options))
    }
}

// ============================================================================
// Tests
// ============================================================================
