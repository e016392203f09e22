//! Top-level peripheral assembly.
//!
//! Wires the host stack, the GATT registry, the access dispatcher, the
//! lifecycle state machine, and the notification scheduler together in the
//! device's boot order: register the service table, start the event loop
//! (whose first action is entering advertising), then start the notifier
//! loops.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ble::connection::{LinkController, LinkEvent, LinkState, SharedState};
use crate::ble::stack::{Advertisement, ConnectionHandle, HostStack};
use crate::ble::uuids::HEART_RATE_SERVICE_UUID;
use crate::error::{Error, Result};
use crate::gatt::dispatch::AccessDispatcher;
use crate::gatt::registry::{default_services, HandleRegistry, ServiceDef};
use crate::scheduler::NotificationScheduler;

/// The advertised device name.
pub const DEVICE_NAME: &str = "HydraWise-BLE-Server";

/// The advertisement broadcast while unconnected: the complete device name
/// plus the heart rate service identity, for companion apps that filter by
/// service.
pub fn default_advertisement() -> Advertisement {
    Advertisement {
        device_name: DEVICE_NAME.to_string(),
        service_uuids: vec![HEART_RATE_SERVICE_UUID],
    }
}

/// The assembled HydraWise peripheral.
///
/// Generic over the host stack so the same core runs against real BLE
/// bindings and against [`MockStack`](crate::ble::mock::MockStack) in tests.
pub struct Peripheral<S: HostStack> {
    stack: Arc<S>,
    shared: Arc<SharedState>,
    registry: Arc<HandleRegistry>,
    scheduler: NotificationScheduler<S>,
    advertisement: Advertisement,
    link_tx: broadcast::Sender<LinkEvent>,
    event_loop: RwLock<Option<JoinHandle<()>>>,
}

impl<S: HostStack> Peripheral<S> {
    /// Register the default GATT table against the stack and assemble the
    /// peripheral.
    pub async fn new(stack: S) -> Result<Self> {
        Self::with_services(stack, default_services()).await
    }

    /// Assemble the peripheral with a custom GATT table.
    pub async fn with_services(stack: S, services: Vec<ServiceDef>) -> Result<Self> {
        let stack = Arc::new(stack);

        let resolved = stack.register_services(&services).await?;
        let registry = Arc::new(HandleRegistry::from_resolved(&services, &resolved));

        if registry.is_empty() {
            warn!("No characteristic resolved a handle; the device will advertise but serve nothing");
        }

        let shared = Arc::new(SharedState::new());
        let scheduler =
            NotificationScheduler::new(stack.clone(), shared.clone(), registry.clone());
        let (link_tx, _) = broadcast::channel(16);

        Ok(Self {
            stack,
            shared,
            registry,
            scheduler,
            advertisement: default_advertisement(),
            link_tx,
            event_loop: RwLock::new(None),
        })
    }

    /// Override the notification periods. Takes effect for loops started
    /// after the call.
    pub fn with_notification_periods(mut self, heart_rate: Duration, conductivity: Duration) -> Self {
        let scheduler = self.scheduler;
        self.scheduler = scheduler.with_periods(heart_rate, conductivity);
        self
    }

    /// Start advertising, the event loop, and the notifier loops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventStreamTaken`] if the stack's event stream was
    /// already consumed (the peripheral was started twice).
    pub async fn start(&self) -> Result<()> {
        let events = self.stack.take_events().ok_or(Error::EventStreamTaken)?;

        let dispatcher = AccessDispatcher::new(self.registry.clone(), self.shared.clone());
        let controller = LinkController::new(
            self.stack.clone(),
            self.shared.clone(),
            dispatcher,
            self.advertisement.clone(),
            self.link_tx.clone(),
        );

        info!("Starting {DEVICE_NAME}");

        let handle = tokio::spawn(controller.run(events));
        *self.event_loop.write() = Some(handle);

        self.scheduler.start();

        Ok(())
    }

    /// The host stack this peripheral runs against.
    pub fn stack(&self) -> Arc<S> {
        self.stack.clone()
    }

    /// The resolved handle registry.
    pub fn registry(&self) -> Arc<HandleRegistry> {
        self.registry.clone()
    }

    /// Current lifecycle state.
    pub fn link_state(&self) -> LinkState {
        self.shared.link_state()
    }

    /// The active connection handle, if any.
    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.shared.connection()
    }

    /// Whether telemetry collection is currently enabled.
    pub fn is_telemetry_enabled(&self) -> bool {
        self.shared.is_running()
    }

    /// Subscribe to lifecycle state transitions.
    pub fn subscribe_link_events(&self) -> broadcast::Receiver<LinkEvent> {
        self.link_tx.subscribe()
    }

    /// Clean shutdown: stop the notifier loops, then the event loop.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down peripheral");

        self.scheduler.shutdown().await;

        let handle = self.event_loop.write().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_advertisement() {
        let advertisement = default_advertisement();
        assert_eq!(advertisement.device_name, DEVICE_NAME);
        assert_eq!(advertisement.service_uuids, vec![HEART_RATE_SERVICE_UUID]);
    }
}
