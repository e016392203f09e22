//! Characteristic access dispatch.
//!
//! Routes inbound read and write events from the host stack to the handler
//! implied by the target characteristic. Reads never fail the transaction;
//! writes always acknowledge, whether or not the payload meant anything.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ble::connection::SharedState;
use crate::ble::stack::AttHandle;
use crate::gatt::registry::{CharacteristicKind, HandleRegistry};
use crate::protocol::commands::Command;
use crate::protocol::measurements::{
    battery_level_payload, ConductivityMeasurement, HeartRateMeasurement, DEMO_BATTERY_PERCENT,
    MANUFACTURER_NAME, MODEL_NUMBER,
};

/// Diagnostic placeholder returned for reads of handles outside the
/// registry.
pub const UNKNOWN_READ_PAYLOAD: &[u8] = b"UNKNOWN";

/// Routes characteristic access to the correct handler by resolved handle.
#[derive(Clone)]
pub struct AccessDispatcher {
    registry: Arc<HandleRegistry>,
    shared: Arc<SharedState>,
}

impl AccessDispatcher {
    /// Create a dispatcher over the resolved registry and shared state.
    pub fn new(registry: Arc<HandleRegistry>, shared: Arc<SharedState>) -> Self {
        Self { registry, shared }
    }

    /// Produce the response payload for a read of `target`.
    ///
    /// Unrecognized handles get a diagnostic placeholder rather than an
    /// error; a read must never abort the connection.
    pub fn on_read(&self, target: AttHandle) -> Vec<u8> {
        match self.registry.kind_for(target) {
            Some(CharacteristicKind::HeartRate) => {
                debug!("Read of heart rate characteristic");
                HeartRateMeasurement::sample().encode()
            }
            Some(CharacteristicKind::Conductivity) => {
                debug!("Read of conductivity characteristic");
                ConductivityMeasurement::sample().encode()
            }
            Some(CharacteristicKind::BatteryLevel) => {
                debug!("Read of battery level characteristic");
                battery_level_payload(DEMO_BATTERY_PERCENT)
            }
            Some(CharacteristicKind::ManufacturerName) => {
                MANUFACTURER_NAME.as_bytes().to_vec()
            }
            Some(CharacteristicKind::ModelNumber) => MODEL_NUMBER.as_bytes().to_vec(),
            Some(CharacteristicKind::Command) => {
                // The command channel is write-only; a read reaching it
                // means the stack's capability filtering is off.
                warn!("Read of write-only command characteristic ({target})");
                UNKNOWN_READ_PAYLOAD.to_vec()
            }
            None => {
                warn!("Read of unknown characteristic ({target})");
                UNKNOWN_READ_PAYLOAD.to_vec()
            }
        }
    }

    /// Apply the side effect of a write to `target`.
    ///
    /// Only the command channel has one; every write is acknowledged as
    /// successful by the stack regardless of content.
    pub fn on_write(&self, target: AttHandle, value: &[u8]) {
        match self.registry.kind_for(target) {
            Some(CharacteristicKind::Command) => self.apply_command(value),
            Some(kind) => {
                warn!("Write to non-writable {kind} characteristic ({target}), ignoring");
            }
            None => {
                warn!("Write to unknown characteristic ({target}), ignoring");
            }
        }
    }

    fn apply_command(&self, value: &[u8]) {
        match Command::parse(value) {
            Some(Command::Start) => {
                info!("START command received, enabling telemetry collection");
                self.shared.set_running(true);
            }
            Some(Command::Stop) => {
                info!("STOP command received, disabling telemetry collection");
                self.shared.set_running(false);
            }
            None => {
                debug!(
                    "Unrecognized command payload ({:?}), ignoring",
                    String::from_utf8_lossy(value)
                );
            }
        }
    }
}
