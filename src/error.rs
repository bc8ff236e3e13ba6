//! Error types for the WeArt client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use weart_client::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     client.start(Default::default()).await?;
//!     client.start_calibration().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Transfer | [`Error::SendMessage`], [`Error::ReceiveMessage`] |
//! | Framing | [`Error::InvalidPayload`] |
//! | Decoding | [`Error::FieldCount`], [`Error::InvalidField`], [`Error::FormatMismatch`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! Observers registered with
//! [`Connection::add_error_callback`](crate::transport::Connection::add_error_callback)
//! receive the coarser [`ErrorType`] instead.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection to the middleware failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt exceeded the configured timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The connection is not open.
    ///
    /// Returned when sending before `connect` or after `close`.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// Writing a message to the transport failed.
    #[error("Send failed for {type_id}: {message}")]
    SendMessage {
        /// Type identifier of the message being sent.
        type_id: &'static str,
        /// Description of the write failure.
        message: String,
    },

    /// The receive loop faulted unexpectedly.
    #[error("Receive failed: {message}")]
    ReceiveMessage {
        /// Description of the read failure.
        message: String,
    },

    // ========================================================================
    // Framing Errors
    // ========================================================================
    /// Outgoing payload cannot be framed.
    ///
    /// Returned when a payload contains the frame terminator.
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Description of the framing violation.
        message: String,
    },

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Positional message carried the wrong number of fields.
    #[error("{type_id}: expected {expected} fields, got {actual}")]
    FieldCount {
        /// Type identifier of the message.
        type_id: &'static str,
        /// Number of fields the message shape requires.
        expected: usize,
        /// Number of fields received.
        actual: usize,
    },

    /// A field could not be parsed.
    #[error("{type_id}: invalid {field} value '{value}'")]
    InvalidField {
        /// Type identifier of the message.
        type_id: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Raw value received.
        value: String,
    },

    /// Frame used the wrong wire format for its type identifier.
    #[error("{type_id}: unexpected wire format")]
    FormatMismatch {
        /// Type identifier of the message.
        type_id: &'static str,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a send error.
    #[inline]
    pub fn send_message(type_id: &'static str, message: impl Into<String>) -> Self {
        Self::SendMessage {
            type_id,
            message: message.into(),
        }
    }

    /// Creates a receive error.
    #[inline]
    pub fn receive_message(message: impl Into<String>) -> Self {
        Self::ReceiveMessage {
            message: message.into(),
        }
    }

    /// Creates an invalid payload error.
    #[inline]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Creates a field count error.
    #[inline]
    pub fn field_count(type_id: &'static str, expected: usize, actual: usize) -> Self {
        Self::FieldCount {
            type_id,
            expected,
            actual,
        }
    }

    /// Creates an invalid field error.
    #[inline]
    pub fn invalid_field(
        type_id: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            type_id,
            field,
            value: value.into(),
        }
    }

    /// Creates a format mismatch error.
    #[inline]
    pub fn format_mismatch(type_id: &'static str) -> Self {
        Self::FormatMismatch { type_id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this error ended or prevented a session.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::SendMessage { .. }
                | Self::ReceiveMessage { .. }
        )
    }

    /// Returns `true` if this error came from decoding a single frame.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::FieldCount { .. }
                | Self::InvalidField { .. }
                | Self::FormatMismatch { .. }
                | Self::Json(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Decode errors only drop the offending frame; the session stays up.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_decode_error() || matches!(self, Self::ConnectionTimeout { .. })
    }
}

// ============================================================================
// ErrorType
// ============================================================================

/// Error category reported to error observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Opening the connection failed.
    Connection,
    /// A write failed or wrote zero bytes.
    SendMessage,
    /// The receive loop terminated unexpectedly.
    ReceiveMessage,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "ConnectionError",
            Self::SendMessage => "SendMessageError",
            Self::ReceiveMessage => "ReceiveMessageError",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_field_count_display() {
        let err = Error::field_count("temperature", 3, 2);
        assert_eq!(err.to_string(), "temperature: expected 3 fields, got 2");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("x").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::send_message("force", "broken pipe").is_connection_error());
        assert!(!Error::config("x").is_connection_error());
    }

    #[test]
    fn test_decode_errors_are_recoverable() {
        let err = Error::invalid_field("force", "hand side", "UP");
        assert!(err.is_decode_error());
        assert!(err.is_recoverable());
        assert!(!Error::receive_message("reset").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Connection.to_string(), "ConnectionError");
        assert_eq!(ErrorType::SendMessage.to_string(), "SendMessageError");
        assert_eq!(ErrorType::ReceiveMessage.to_string(), "ReceiveMessageError");
    }
}
