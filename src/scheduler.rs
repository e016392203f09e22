//! Periodic notification scheduling.
//!
//! Two independently clocked loops — heart rate and conductivity — push
//! telemetry to the subscribed connection while a central is connected and
//! telemetry is enabled. Each tick re-reads the shared state from scratch,
//! so a send that races a disconnect simply fails, is logged, and the loop
//! self-heals on the following tick. The loops sleep their full period when
//! idle; they never busy-poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::ble::connection::SharedState;
use crate::ble::stack::HostStack;
use crate::gatt::registry::{CharacteristicKind, HandleRegistry};
use crate::protocol::measurements::{ConductivityMeasurement, HeartRateMeasurement};

/// Period between heart rate notification attempts.
pub const HEART_RATE_PERIOD: Duration = Duration::from_secs(3);

/// Period between conductivity notification attempts.
pub const CONDUCTIVITY_PERIOD: Duration = Duration::from_secs(5);

/// Drives the periodic telemetry notifier loops.
pub struct NotificationScheduler<S: HostStack> {
    stack: Arc<S>,
    shared: Arc<SharedState>,
    registry: Arc<HandleRegistry>,
    heart_rate_period: Duration,
    conductivity_period: Duration,
    is_running: Arc<AtomicBool>,
    handles: RwLock<Vec<JoinHandle<()>>>,
}

impl<S: HostStack> NotificationScheduler<S> {
    /// Create a scheduler with the default periods.
    pub fn new(stack: Arc<S>, shared: Arc<SharedState>, registry: Arc<HandleRegistry>) -> Self {
        Self {
            stack,
            shared,
            registry,
            heart_rate_period: HEART_RATE_PERIOD,
            conductivity_period: CONDUCTIVITY_PERIOD,
            is_running: Arc::new(AtomicBool::new(false)),
            handles: RwLock::new(Vec::new()),
        }
    }

    /// Override the notification periods.
    pub fn with_periods(mut self, heart_rate: Duration, conductivity: Duration) -> Self {
        self.heart_rate_period = heart_rate;
        self.conductivity_period = conductivity;
        self
    }

    /// Start the heart rate and conductivity notifier loops.
    pub fn start(&self) {
        if self.is_running.swap(true, Ordering::SeqCst) {
            debug!("Notifier loops already running");
            return;
        }

        self.spawn_notifier(CharacteristicKind::HeartRate, self.heart_rate_period, || {
            HeartRateMeasurement::sample().encode()
        });
        self.spawn_notifier(
            CharacteristicKind::Conductivity,
            self.conductivity_period,
            || ConductivityMeasurement::sample().encode(),
        );
    }

    /// Check if the notifier loops are running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Signal both loops to exit after their current tick and wait for them.
    pub async fn shutdown(&self) {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return;
        }

        let handles: Vec<_> = self.handles.write().drain(..).collect();
        join_all(handles).await;

        debug!("Notification scheduler stopped");
    }

    fn spawn_notifier(&self, kind: CharacteristicKind, period: Duration, payload: fn() -> Vec<u8>) {
        // A signal whose handle did not resolve at registration is disabled;
        // the rest of the device keeps operating.
        let target = match self.registry.handle_for(kind) {
            Ok(target) => target,
            Err(e) => {
                error!("{e}; {kind} notifications disabled");
                return;
            }
        };

        let stack = self.stack.clone();
        let shared = self.shared.clone();
        let is_running = self.is_running.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if !is_running.load(Ordering::SeqCst) {
                    break;
                }

                // Re-read shared state every tick; a tick that races a
                // disconnect or a STOP command skips or fails harmlessly.
                let Some(conn) = shared.connection() else {
                    trace!("No connection, skipping {kind} tick");
                    continue;
                };
                if !shared.is_running() {
                    trace!("Telemetry disabled, skipping {kind} tick");
                    continue;
                }

                match stack.notify(conn, target, &payload()).await {
                    Ok(()) => debug!("Sent {kind} notification on {conn}"),
                    Err(e) => warn!("Failed to send {kind} notification: {e}"),
                }
            }

            debug!("{kind} notifier loop stopped");
        });

        self.handles.write().push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::mock::MockStack;
    use crate::ble::stack::ConnectionHandle;
    use crate::ble::uuids::{CONDUCTIVITY_MEASUREMENT_UUID, HEART_RATE_MEASUREMENT_UUID};
    use crate::gatt::registry::default_services;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn scheduler_fixture(
        stack: Arc<MockStack>,
    ) -> (NotificationScheduler<MockStack>, Arc<SharedState>) {
        let services = default_services();
        let resolved = stack.register_services(&services).await.unwrap();
        let registry = Arc::new(HandleRegistry::from_resolved(&services, &resolved));
        let shared = Arc::new(SharedState::new());
        (
            NotificationScheduler::new(stack, shared.clone(), registry),
            shared,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_loops_send_nothing() {
        let stack = Arc::new(MockStack::new());
        let (scheduler, _shared) = scheduler_fixture(stack.clone()).await;

        scheduler.start();

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(stack.notification_count(), 0);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_telemetry_sends_nothing() {
        let stack = Arc::new(MockStack::new());
        let (scheduler, shared) = scheduler_fixture(stack.clone()).await;

        stack.connect(7);
        shared.set_connection(ConnectionHandle(7));
        shared.set_running(false);
        scheduler.start();

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(stack.notification_count(), 0);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_and_running_notifies_on_both_cadences() {
        let stack = Arc::new(MockStack::new());
        let (scheduler, shared) = scheduler_fixture(stack.clone()).await;

        scheduler.start();
        // Let the immediate first ticks pass while disconnected.
        settle().await;

        stack.connect(7);
        shared.set_connection(ConnectionHandle(7));

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(stack.notification_count(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        // t=5s: conductivity joins in.
        assert_eq!(stack.notification_count(), 2);

        let sent = stack.notifications();
        let hr_handle = stack.handle_for_uuid(&HEART_RATE_MEASUREMENT_UUID).unwrap();
        assert_eq!(sent[0].conn, ConnectionHandle(7));
        assert_eq!(sent[0].target, hr_handle);
        assert_eq!(sent[0].payload, vec![0x00, 75]);
        assert_eq!(sent[1].payload, vec![0x00, 50]);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_send_failure_does_not_stop_loop() {
        let stack = Arc::new(MockStack::new());
        // Leave only the heart rate loop so the tick count is unambiguous.
        stack.omit_characteristic(CONDUCTIVITY_MEASUREMENT_UUID);
        let (scheduler, shared) = scheduler_fixture(stack.clone()).await;

        scheduler.start();
        settle().await;

        stack.connect(7);
        shared.set_connection(ConnectionHandle(7));
        stack.fail_next_notifications(1);

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(stack.notification_count(), 0);

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(stack.notification_count(), 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_signal_is_disabled_not_fatal() {
        let stack = Arc::new(MockStack::new());
        stack.omit_characteristic(HEART_RATE_MEASUREMENT_UUID);
        let (scheduler, shared) = scheduler_fixture(stack.clone()).await;

        scheduler.start();
        settle().await;

        stack.connect(7);
        shared.set_connection(ConnectionHandle(7));

        // Only conductivity ticks (every 5 s) deliver anything.
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(5)).await;
            settle().await;
        }

        let sent = stack.notifications();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|n| n.payload == vec![0x00, 50]));

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticking() {
        let stack = Arc::new(MockStack::new());
        let (scheduler, shared) = scheduler_fixture(stack.clone()).await;

        scheduler.start();
        settle().await;

        stack.connect(7);
        shared.set_connection(ConnectionHandle(7));

        scheduler.shutdown().await;
        assert!(!scheduler.is_running());

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(stack.notification_count(), 0);
    }
}
