//! The host-stack boundary.
//!
//! The radio and link layer are an external collaborator. This module
//! defines the narrow surface the peripheral core talks through: outbound
//! calls on the [`HostStack`] trait and inbound [`StackEvent`]s consumed by
//! the event loop. Implement [`HostStack`] to bind the core to a concrete
//! BLE host stack; the crate's [`MockStack`](crate::ble::mock::MockStack)
//! implements it in memory for tests and demos.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::Result;
use crate::gatt::registry::ServiceDef;

/// Opaque identifier for the active connection, assigned by the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionHandle(pub u16);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Opaque attribute handle for a registered characteristic value, assigned
/// by the host stack at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttHandle(pub u16);

impl fmt::Display for AttHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr:{}", self.0)
    }
}

/// Advertisement content broadcast while unconnected.
#[derive(Debug, Clone)]
pub struct Advertisement {
    /// Complete human-readable device name.
    pub device_name: String,
    /// Service identities advertised for companion apps that filter by
    /// service.
    pub service_uuids: Vec<Uuid>,
}

/// Outcome of a connection attempt as reported by the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    /// The link came up.
    Established,
    /// The attempt failed with a stack-specific status code.
    Failed {
        /// Raw status code from the stack.
        code: u8,
    },
}

impl ConnectStatus {
    /// Check if the attempt succeeded.
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Established)
    }
}

/// Inbound event delivered by the host stack.
///
/// Events arrive on a single stream and must be handled without blocking;
/// the stack invokes its callbacks synchronously and expects prompt return.
#[derive(Debug)]
pub enum StackEvent {
    /// A central attempted to connect.
    Connected {
        /// Connection handle (meaningful only on success).
        conn: ConnectionHandle,
        /// Whether the link actually came up.
        status: ConnectStatus,
    },
    /// The active connection went down.
    Disconnected {
        /// The handle that was torn down.
        conn: ConnectionHandle,
    },
    /// The advertising window expired without a connection.
    AdvertisingComplete,
    /// A central is reading a characteristic value. The response payload
    /// must be sent back on `reply`.
    ReadRequest {
        /// The connection issuing the read.
        conn: ConnectionHandle,
        /// The characteristic value handle being read.
        target: AttHandle,
        /// Channel for the response payload.
        reply: oneshot::Sender<Vec<u8>>,
    },
    /// A central wrote a characteristic value. Writes are acknowledged by
    /// the stack itself; the core only applies the side effect.
    WriteRequest {
        /// The connection issuing the write.
        conn: ConnectionHandle,
        /// The characteristic value handle being written.
        target: AttHandle,
        /// The written payload.
        value: Vec<u8>,
    },
}

/// Abstraction over the underlying BLE host stack.
///
/// All methods are fire-and-forget with a status result; none of them may
/// block for link-layer round trips beyond the stack's own queuing.
#[async_trait]
pub trait HostStack: Send + Sync + 'static {
    /// Register the GATT service table, returning the resolved value handle
    /// for each characteristic UUID the stack accepted.
    ///
    /// Characteristics missing from the returned map are treated as
    /// unregistered and their signals are disabled.
    async fn register_services(
        &self,
        services: &[ServiceDef],
    ) -> Result<HashMap<Uuid, AttHandle>>;

    /// Start (or restart) undirected advertising with the given content.
    async fn start_advertising(&self, advertisement: &Advertisement) -> Result<()>;

    /// Push a characteristic value notification to the connected central.
    async fn notify(
        &self,
        conn: ConnectionHandle,
        target: AttHandle,
        payload: &[u8],
    ) -> Result<()>;

    /// Take the inbound event stream.
    ///
    /// There is exactly one consumer; returns `None` if the stream was
    /// already taken.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<StackEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_status() {
        assert!(ConnectStatus::Established.is_established());
        assert!(!ConnectStatus::Failed { code: 0x3e }.is_established());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(format!("{}", ConnectionHandle(7)), "conn:7");
        assert_eq!(format!("{}", AttHandle(0x12)), "attr:18");
    }
}
