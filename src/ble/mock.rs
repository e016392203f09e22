//! Mock host stack for testing and demos.
//!
//! Implements [`HostStack`] entirely in memory so the full peripheral
//! lifecycle can be exercised without BLE hardware.
//!
//! # Features
//!
//! - **Event injection**: script connects, disconnects, advertising expiry,
//!   reads, and writes from the test
//! - **Call recording**: advertising starts and delivered notifications are
//!   captured for inspection
//! - **Failure injection**: force a number of notification sends to fail
//! - **Custom behavior**: hook the advertising path to observe ordering

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::ble::stack::{
    Advertisement, AttHandle, ConnectStatus, ConnectionHandle, HostStack, StackEvent,
};
use crate::error::{Error, Result};
use crate::gatt::registry::ServiceDef;

type AdvertiseHook = Box<dyn Fn() + Send + Sync>;

/// A notification delivered through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// The connection it was addressed to.
    pub conn: ConnectionHandle,
    /// The characteristic value handle it was addressed to.
    pub target: AttHandle,
    /// The delivered payload.
    pub payload: Vec<u8>,
}

/// An in-memory host stack.
pub struct MockStack {
    event_tx: mpsc::UnboundedSender<StackEvent>,
    events: Mutex<Option<mpsc::UnboundedReceiver<StackEvent>>>,
    /// Next value handle to assign during registration.
    next_handle: AtomicU16,
    registered: RwLock<HashMap<Uuid, AttHandle>>,
    /// Characteristic UUIDs registration will refuse to resolve.
    omitted: RwLock<HashSet<Uuid>>,
    /// The mock's own view of the link, updated at injection time.
    connected: RwLock<Option<ConnectionHandle>>,
    advertisements: RwLock<Vec<Advertisement>>,
    notifications: RwLock<Vec<SentNotification>>,
    /// Number of upcoming notification sends to fail.
    notify_failures: AtomicU32,
    advertise_hook: RwLock<Option<AdvertiseHook>>,
}

impl std::fmt::Debug for MockStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStack")
            .field("registered", &self.registered.read().len())
            .field("connected", &*self.connected.read())
            .field("advertisements", &self.advertisements.read().len())
            .field("notifications", &self.notifications.read().len())
            .finish()
    }
}

impl MockStack {
    /// Create a new mock stack.
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            event_tx,
            events: Mutex::new(Some(event_rx)),
            next_handle: AtomicU16::new(0x0010),
            registered: RwLock::new(HashMap::new()),
            omitted: RwLock::new(HashSet::new()),
            connected: RwLock::new(None),
            advertisements: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
            notify_failures: AtomicU32::new(0),
            advertise_hook: RwLock::new(None),
        }
    }

    // --- Event injection ---

    /// Deliver a successful connect for `conn`.
    pub fn connect(&self, conn: u16) {
        let conn = ConnectionHandle(conn);
        *self.connected.write() = Some(conn);
        let _ = self.event_tx.send(StackEvent::Connected {
            conn,
            status: ConnectStatus::Established,
        });
    }

    /// Deliver a failed connect attempt with a stack status code.
    pub fn fail_connect(&self, code: u8) {
        let _ = self.event_tx.send(StackEvent::Connected {
            conn: ConnectionHandle(0),
            status: ConnectStatus::Failed { code },
        });
    }

    /// Deliver a disconnect for `conn`.
    pub fn disconnect(&self, conn: u16) {
        *self.connected.write() = None;
        let _ = self.event_tx.send(StackEvent::Disconnected {
            conn: ConnectionHandle(conn),
        });
    }

    /// Deliver an advertising-window-expired event.
    pub fn advertising_complete(&self) {
        let _ = self.event_tx.send(StackEvent::AdvertisingComplete);
    }

    /// Issue a characteristic read and wait for the response payload.
    ///
    /// Returns `None` if the event loop is gone.
    pub async fn read(&self, conn: u16, target: AttHandle) -> Option<Vec<u8>> {
        let (reply, response) = oneshot::channel();
        self.event_tx
            .send(StackEvent::ReadRequest {
                conn: ConnectionHandle(conn),
                target,
                reply,
            })
            .ok()?;
        response.await.ok()
    }

    /// Issue a characteristic write.
    pub fn write(&self, conn: u16, target: AttHandle, value: &[u8]) {
        let _ = self.event_tx.send(StackEvent::WriteRequest {
            conn: ConnectionHandle(conn),
            target,
            value: value.to_vec(),
        });
    }

    // --- Failure and behavior injection ---

    /// Make the next `count` notification sends fail.
    pub fn fail_next_notifications(&self, count: u32) {
        self.notify_failures.store(count, Ordering::SeqCst);
    }

    /// Refuse to resolve a handle for `uuid` during registration.
    ///
    /// Must be called before the service table is registered.
    pub fn omit_characteristic(&self, uuid: Uuid) {
        self.omitted.write().insert(uuid);
    }

    /// Install a hook invoked on every advertising start, before it is
    /// recorded.
    pub fn set_advertise_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.advertise_hook.write() = Some(Box::new(hook));
    }

    // --- Inspection ---

    /// The handle registration resolved for `uuid`, if any.
    pub fn handle_for_uuid(&self, uuid: &Uuid) -> Option<AttHandle> {
        self.registered.read().get(uuid).copied()
    }

    /// Number of times advertising was started.
    pub fn advertise_count(&self) -> usize {
        self.advertisements.read().len()
    }

    /// The advertisement content of the most recent advertising start.
    pub fn last_advertisement(&self) -> Option<Advertisement> {
        self.advertisements.read().last().cloned()
    }

    /// All notifications delivered so far.
    pub fn notifications(&self) -> Vec<SentNotification> {
        self.notifications.read().clone()
    }

    /// Number of notifications delivered so far.
    pub fn notification_count(&self) -> usize {
        self.notifications.read().len()
    }
}

impl Default for MockStack {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostStack for MockStack {
    async fn register_services(
        &self,
        services: &[ServiceDef],
    ) -> Result<HashMap<Uuid, AttHandle>> {
        let omitted = self.omitted.read().clone();
        let mut registered = self.registered.write();

        for service in services {
            for characteristic in &service.characteristics {
                if omitted.contains(&characteristic.uuid) {
                    continue;
                }
                let handle = AttHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
                registered.insert(characteristic.uuid, handle);
            }
        }

        Ok(registered.clone())
    }

    async fn start_advertising(&self, advertisement: &Advertisement) -> Result<()> {
        if let Some(hook) = self.advertise_hook.read().as_ref() {
            hook();
        }
        self.advertisements.write().push(advertisement.clone());
        Ok(())
    }

    async fn notify(
        &self,
        conn: ConnectionHandle,
        target: AttHandle,
        payload: &[u8],
    ) -> Result<()> {
        if self
            .notify_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::NotifyFailed {
                reason: "injected failure".to_string(),
            });
        }

        if *self.connected.read() != Some(conn) {
            return Err(Error::NotConnected);
        }

        self.notifications.write().push(SentNotification {
            conn,
            target,
            payload: payload.to_vec(),
        });

        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<StackEvent>> {
        self.events.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::HEART_RATE_MEASUREMENT_UUID;
    use crate::gatt::registry::default_services;

    #[tokio::test]
    async fn test_registration_assigns_distinct_handles() {
        let stack = MockStack::new();
        let resolved = stack.register_services(&default_services()).await.unwrap();

        assert_eq!(resolved.len(), 6);
        let mut handles: Vec<_> = resolved.values().collect();
        handles.sort();
        handles.dedup();
        assert_eq!(handles.len(), 6);
    }

    #[tokio::test]
    async fn test_omitted_characteristic_is_unresolved() {
        let stack = MockStack::new();
        stack.omit_characteristic(HEART_RATE_MEASUREMENT_UUID);

        let resolved = stack.register_services(&default_services()).await.unwrap();
        assert_eq!(resolved.len(), 5);
        assert!(!resolved.contains_key(&HEART_RATE_MEASUREMENT_UUID));
    }

    #[tokio::test]
    async fn test_notify_requires_connection() {
        let stack = MockStack::new();
        let err = stack
            .notify(ConnectionHandle(7), AttHandle(0x10), &[0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        stack.connect(7);
        stack
            .notify(ConnectionHandle(7), AttHandle(0x10), &[0x00])
            .await
            .unwrap();
        assert_eq!(stack.notification_count(), 1);
    }

    #[tokio::test]
    async fn test_notify_failure_injection_is_consumed() {
        let stack = MockStack::new();
        stack.connect(7);
        stack.fail_next_notifications(1);

        let first = stack.notify(ConnectionHandle(7), AttHandle(0x10), &[]).await;
        assert!(first.is_err());

        let second = stack.notify(ConnectionHandle(7), AttHandle(0x10), &[]).await;
        assert!(second.is_ok());
    }

    #[test]
    fn test_event_stream_single_consumer() {
        let stack = MockStack::new();
        assert!(stack.take_events().is_some());
        assert!(stack.take_events().is_none());
    }
}
