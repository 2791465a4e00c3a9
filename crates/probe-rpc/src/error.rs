//! Runtime errors for protocol invocations.
//!
//! Errors are scoped to the failing invocation wherever possible;
//! [`RpcError::ChannelClosed`] is the exception and fans out to every
//! outstanding invocation when the inbound channel dies. The type is
//! `Clone` for exactly that fan-out.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors that can occur while executing invocations over a connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The remote answered the invocation with a protocol-level error.
    ///
    /// Scoped to the one invocation whose response carried the error;
    /// other pending invocations and event subscriptions are unaffected.
    #[error("remote protocol error {code}: {message}")]
    Remote {
        /// Remote error code.
        code: i64,
        /// Remote error message.
        message: String,
    },

    /// The message channel closed while the invocation was outstanding.
    #[error("channel closed with the request outstanding")]
    ChannelClosed,

    /// An inbound message matched neither the response nor the event shape.
    ///
    /// Fatal to the reader loop: the connection is dead once this is
    /// observed, and every outstanding invocation fails.
    #[error("malformed inbound message: {0}")]
    MalformedMessage(String),

    /// The request params failed to encode as JSON.
    #[error("failed to encode request params: {0}")]
    InvalidParams(String),

    /// The response payload did not match the declared output shape.
    ///
    /// Scoped to the one invocation; the reader loop keeps running.
    #[error("response payload did not match the declared output shape: {0}")]
    InvalidResult(String),
}
