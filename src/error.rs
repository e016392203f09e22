//! Error types for the hydrawise-ble crate.

use thiserror::Error;

use crate::gatt::registry::CharacteristicKind;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying host stack rejected a request.
    #[error("Host stack error: {reason}")]
    Stack {
        /// Description of the failure as reported by the stack.
        reason: String,
    },

    /// Advertising could not be (re)started.
    #[error("Failed to start advertising: {reason}")]
    AdvertisingFailed {
        /// Description of why advertising could not start.
        reason: String,
    },

    /// A notification was attempted without an active connection.
    #[error("No active connection")]
    NotConnected,

    /// The host stack did not accept a notification for delivery.
    #[error("Notification not delivered: {reason}")]
    NotifyFailed {
        /// The non-success status reported by the stack.
        reason: String,
    },

    /// Registration did not resolve a runtime handle for this characteristic.
    #[error("Characteristic not registered: {kind}")]
    CharacteristicNotRegistered {
        /// The semantic tag that has no resolved handle.
        kind: CharacteristicKind,
    },

    /// The host stack's event stream was already claimed by another consumer.
    #[error("Host stack event stream already taken")]
    EventStreamTaken,

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
