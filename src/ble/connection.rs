//! Connection/advertising lifecycle management.
//!
//! Owns the single logical connection slot and is the sole authority for
//! restarting advertising. The [`LinkController`] consumes the host stack's
//! event stream and drives the state machine; shared state is read by the
//! notification scheduler between its ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use crate::ble::stack::{
    Advertisement, ConnectionHandle, HostStack, StackEvent,
};
use crate::gatt::dispatch::AccessDispatcher;

/// Lifecycle state of the peripheral's single link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkState {
    /// No connection and not advertising.
    #[default]
    Idle,
    /// Broadcasting discoverability, waiting for a central.
    Advertising,
    /// A central is connected.
    Connected,
}

impl LinkState {
    /// Check if a central is connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if the device is currently discoverable.
    pub fn is_advertising(&self) -> bool {
        matches!(self, Self::Advertising)
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Advertising => write!(f, "Advertising"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// State shared between the event loop and the notifier tasks.
///
/// The event loop is the only writer of the connection slot; the command
/// write path is the only writer of the running flag. The notifier loops
/// read both once per tick and tolerate staleness of at most one period,
/// so plain atomic/lock reads are sufficient.
#[derive(Debug)]
pub struct SharedState {
    /// The single connection slot; `None` while disconnected.
    connection: RwLock<Option<ConnectionHandle>>,
    /// Whether telemetry collection is enabled.
    running: AtomicBool,
    /// Current lifecycle state, for observers.
    link_state: RwLock<LinkState>,
}

impl SharedState {
    /// Create the startup state: no connection, telemetry enabled.
    pub fn new() -> Self {
        Self {
            connection: RwLock::new(None),
            running: AtomicBool::new(true),
            link_state: RwLock::new(LinkState::Idle),
        }
    }

    /// The active connection handle, if any.
    pub fn connection(&self) -> Option<ConnectionHandle> {
        *self.connection.read()
    }

    /// Store the handle of a newly established connection.
    pub fn set_connection(&self, conn: ConnectionHandle) {
        let previous = self.connection.write().replace(conn);
        if let Some(stale) = previous {
            warn!("Connection slot overwritten while {stale} was still set");
        }
    }

    /// Clear the connection slot.
    pub fn clear_connection(&self) {
        *self.connection.write() = None;
    }

    /// Whether telemetry collection is enabled.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Enable or disable telemetry collection.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Current lifecycle state.
    pub fn link_state(&self) -> LinkState {
        *self.link_state.read()
    }

    fn set_link_state(&self, state: LinkState) -> LinkState {
        let mut current = self.link_state.write();
        std::mem::replace(&mut *current, state)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Event emitted on every lifecycle state change.
#[derive(Debug, Clone)]
pub struct LinkEvent {
    /// The state just entered.
    pub state: LinkState,
    /// The connection slot at the time of the transition.
    pub connection: Option<ConnectionHandle>,
}

/// Drives the connection/advertising state machine.
///
/// Consumes the host stack's inbound event stream, applies transitions to
/// the shared state, and routes read/write requests to the dispatcher.
/// Every path that leaves advertising inactive without a connection
/// re-enters `Advertising`; the machine has no terminal state.
pub struct LinkController<S: HostStack> {
    stack: Arc<S>,
    shared: Arc<SharedState>,
    dispatcher: AccessDispatcher,
    advertisement: Advertisement,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl<S: HostStack> LinkController<S> {
    /// Create a controller publishing transitions on `event_tx`.
    pub fn new(
        stack: Arc<S>,
        shared: Arc<SharedState>,
        dispatcher: AccessDispatcher,
        advertisement: Advertisement,
        event_tx: broadcast::Sender<LinkEvent>,
    ) -> Self {
        Self {
            stack,
            shared,
            dispatcher,
            advertisement,
            event_tx,
        }
    }

    /// Enter advertising, then process stack events until the stream closes.
    ///
    /// The stream closing means the host stack went away; the loop ends
    /// rather than erroring, matching process-lifetime operation.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<StackEvent>) {
        self.enter_advertising().await;

        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        debug!("Host stack event stream closed, link controller exiting");
    }

    /// Apply one inbound event. Must not block; side effects are limited to
    /// state transitions, dispatch, and outbound stack calls.
    async fn handle_event(&self, event: StackEvent) {
        match event {
            StackEvent::Connected { conn, status } => {
                if status.is_established() {
                    info!("Central connected on {conn}");
                    self.shared.set_connection(conn);
                    self.set_state(LinkState::Connected);
                } else {
                    warn!("Connection attempt failed ({status:?}), restarting advertising");
                    self.enter_advertising().await;
                }
            }
            StackEvent::Disconnected { conn } => {
                info!("Central disconnected from {conn}");
                // Clear the slot before advertising restarts so no notifier
                // can observe a stale handle once a new central connects.
                self.shared.clear_connection();
                self.enter_advertising().await;
            }
            StackEvent::AdvertisingComplete => {
                debug!("Advertising window expired, restarting");
                self.enter_advertising().await;
            }
            StackEvent::ReadRequest { conn, target, reply } => {
                let payload = self.dispatcher.on_read(target);
                if reply.send(payload).is_err() {
                    trace!("Read reply for {target} on {conn} dropped by the stack");
                }
            }
            StackEvent::WriteRequest { conn, target, value } => {
                trace!("Write of {} bytes to {target} on {conn}", value.len());
                self.dispatcher.on_write(target, &value);
            }
        }
    }

    /// (Re)start advertising and record the transition.
    async fn enter_advertising(&self) {
        match self.stack.start_advertising(&self.advertisement).await {
            Ok(()) => self.set_state(LinkState::Advertising),
            Err(e) => {
                // The stack boundary is specified as reliable; if it does
                // fail the operator has to intervene.
                error!("Failed to start advertising: {e}");
                self.set_state(LinkState::Idle);
            }
        }
    }

    /// Update the lifecycle state and emit an event on change.
    fn set_state(&self, new_state: LinkState) {
        let old_state = self.shared.set_link_state(new_state);

        if old_state != new_state {
            debug!("Link state changed: {old_state} -> {new_state}");

            let _ = self.event_tx.send(LinkEvent {
                state: new_state,
                connection: self.shared.connection(),
            });
        }
    }
}
