//! The host-stack boundary: trait surface, lifecycle state machine, UUID
//! constants, and the in-memory mock.

pub mod connection;
pub mod mock;
pub mod stack;
pub mod uuids;

pub use connection::{LinkController, LinkEvent, LinkState, SharedState};
pub use mock::{MockStack, SentNotification};
pub use stack::{
    Advertisement, AttHandle, ConnectStatus, ConnectionHandle, HostStack, StackEvent,
};
