//! Declarative GATT service tables and runtime handle resolution.
//!
//! The service table is pure configuration: which services exist, which
//! characteristics they own, and what each characteristic means. Runtime
//! handles are assigned by the host stack at registration time and joined
//! back against the table here, so the rest of the crate addresses
//! characteristics by semantic tag rather than by raw handle.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;
use uuid::Uuid;

use crate::ble::stack::AttHandle;
use crate::ble::uuids::{
    BATTERY_LEVEL_UUID, BATTERY_SERVICE_UUID, COMMAND_CHANNEL_UUID, COMMAND_SERVICE_UUID,
    CONDUCTIVITY_MEASUREMENT_UUID, CONDUCTIVITY_SERVICE_UUID, DEVICE_INFO_SERVICE_UUID,
    HEART_RATE_MEASUREMENT_UUID, HEART_RATE_SERVICE_UUID, MANUFACTURER_NAME_UUID,
    MODEL_NUMBER_UUID,
};
use crate::error::{Error, Result};

/// Semantic tag selecting the read/write handler for a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacteristicKind {
    /// Heart Rate Measurement.
    HeartRate,
    /// Conductivity Measurement.
    Conductivity,
    /// Battery Level percent.
    BatteryLevel,
    /// Device Information: manufacturer name string.
    ManufacturerName,
    /// Device Information: model number string.
    ModelNumber,
    /// Write-only text command channel.
    Command,
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HeartRate => "heart rate",
            Self::Conductivity => "conductivity",
            Self::BatteryLevel => "battery level",
            Self::ManufacturerName => "manufacturer name",
            Self::ModelNumber => "model number",
            Self::Command => "command channel",
        };
        write!(f, "{name}")
    }
}

/// Access capability flags for a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The characteristic value can be read.
    pub read: bool,
    /// The characteristic value can be written.
    pub write: bool,
    /// The characteristic pushes value notifications.
    pub notify: bool,
}

impl Capabilities {
    /// Read and Notify, the telemetry characteristic shape.
    pub const fn read_notify() -> Self {
        Self {
            read: true,
            write: false,
            notify: true,
        }
    }

    /// Read only.
    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            notify: false,
        }
    }

    /// Write only.
    pub const fn write_only() -> Self {
        Self {
            read: false,
            write: true,
            notify: false,
        }
    }
}

/// One characteristic in the declarative service table.
#[derive(Debug, Clone)]
pub struct CharacteristicDef {
    /// Identity the characteristic is registered under.
    pub uuid: Uuid,
    /// Semantic tag used to select the handler for this characteristic.
    pub kind: CharacteristicKind,
    /// Access capability set.
    pub capabilities: Capabilities,
}

/// One service owning an ordered sequence of characteristics.
#[derive(Debug, Clone)]
pub struct ServiceDef {
    /// Identity the service is registered under.
    pub uuid: Uuid,
    /// Characteristics owned by this service, in registration order.
    pub characteristics: Vec<CharacteristicDef>,
}

/// The full GATT table of the HydraWise peripheral.
///
/// Loaded once at startup and handed to [`HostStack::register_services`]
/// to obtain runtime handles.
///
/// [`HostStack::register_services`]: crate::ble::stack::HostStack::register_services
pub fn default_services() -> Vec<ServiceDef> {
    vec![
        ServiceDef {
            uuid: BATTERY_SERVICE_UUID,
            characteristics: vec![CharacteristicDef {
                uuid: BATTERY_LEVEL_UUID,
                kind: CharacteristicKind::BatteryLevel,
                capabilities: Capabilities::read_notify(),
            }],
        },
        ServiceDef {
            uuid: HEART_RATE_SERVICE_UUID,
            characteristics: vec![CharacteristicDef {
                uuid: HEART_RATE_MEASUREMENT_UUID,
                kind: CharacteristicKind::HeartRate,
                capabilities: Capabilities::read_notify(),
            }],
        },
        ServiceDef {
            uuid: CONDUCTIVITY_SERVICE_UUID,
            characteristics: vec![CharacteristicDef {
                uuid: CONDUCTIVITY_MEASUREMENT_UUID,
                kind: CharacteristicKind::Conductivity,
                capabilities: Capabilities::read_notify(),
            }],
        },
        ServiceDef {
            uuid: DEVICE_INFO_SERVICE_UUID,
            characteristics: vec![
                CharacteristicDef {
                    uuid: MANUFACTURER_NAME_UUID,
                    kind: CharacteristicKind::ManufacturerName,
                    capabilities: Capabilities::read_only(),
                },
                CharacteristicDef {
                    uuid: MODEL_NUMBER_UUID,
                    kind: CharacteristicKind::ModelNumber,
                    capabilities: Capabilities::read_only(),
                },
            ],
        },
        ServiceDef {
            uuid: COMMAND_SERVICE_UUID,
            characteristics: vec![CharacteristicDef {
                uuid: COMMAND_CHANNEL_UUID,
                kind: CharacteristicKind::Command,
                capabilities: Capabilities::write_only(),
            }],
        },
    ]
}

/// Resolved handle mapping, built once at startup.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    /// Semantic tag to resolved value handle.
    by_kind: HashMap<CharacteristicKind, AttHandle>,
    /// Resolved value handle back to semantic tag.
    by_handle: HashMap<AttHandle, CharacteristicKind>,
}

impl HandleRegistry {
    /// Join the declarative table against the handles the host stack
    /// resolved at registration.
    ///
    /// Characteristics the stack did not resolve are left out of the
    /// registry; lookups for them fail with
    /// [`Error::CharacteristicNotRegistered`] and the corresponding signal
    /// is disabled rather than fatal.
    pub fn from_resolved(services: &[ServiceDef], resolved: &HashMap<Uuid, AttHandle>) -> Self {
        let mut by_kind = HashMap::new();
        let mut by_handle = HashMap::new();

        for service in services {
            for characteristic in &service.characteristics {
                match resolved.get(&characteristic.uuid) {
                    Some(&handle) => {
                        by_kind.insert(characteristic.kind, handle);
                        by_handle.insert(handle, characteristic.kind);
                    }
                    None => {
                        warn!(
                            "No handle resolved for {} characteristic ({}), signal disabled",
                            characteristic.kind, characteristic.uuid
                        );
                    }
                }
            }
        }

        Self { by_kind, by_handle }
    }

    /// Get the runtime handle for a semantic tag.
    pub fn handle_for(&self, kind: CharacteristicKind) -> Result<AttHandle> {
        self.by_kind
            .get(&kind)
            .copied()
            .ok_or(Error::CharacteristicNotRegistered { kind })
    }

    /// Get the semantic tag for a runtime handle, if the handle is ours.
    pub fn kind_for(&self, handle: AttHandle) -> Option<CharacteristicKind> {
        self.by_handle.get(&handle).copied()
    }

    /// Number of characteristics with resolved handles.
    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    /// Check if no characteristic resolved a handle.
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_all(services: &[ServiceDef]) -> HashMap<Uuid, AttHandle> {
        let mut resolved = HashMap::new();
        let mut next = 0x0010u16;
        for service in services {
            for characteristic in &service.characteristics {
                resolved.insert(characteristic.uuid, AttHandle(next));
                next += 1;
            }
        }
        resolved
    }

    #[test]
    fn test_default_table_shape() {
        let services = default_services();
        assert_eq!(services.len(), 5);

        let total: usize = services.iter().map(|s| s.characteristics.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_command_channel_is_write_only() {
        let services = default_services();
        let command = services
            .iter()
            .flat_map(|s| &s.characteristics)
            .find(|c| c.kind == CharacteristicKind::Command)
            .unwrap();

        assert_eq!(command.capabilities, Capabilities::write_only());
        assert!(!command.capabilities.notify);
    }

    #[test]
    fn test_registry_round_trip() {
        let services = default_services();
        let resolved = resolve_all(&services);
        let registry = HandleRegistry::from_resolved(&services, &resolved);

        assert_eq!(registry.len(), 6);

        let handle = registry.handle_for(CharacteristicKind::HeartRate).unwrap();
        assert_eq!(registry.kind_for(handle), Some(CharacteristicKind::HeartRate));
    }

    #[test]
    fn test_unresolved_characteristic_is_not_found() {
        let services = default_services();
        let mut resolved = resolve_all(&services);
        resolved.remove(&HEART_RATE_MEASUREMENT_UUID);

        let registry = HandleRegistry::from_resolved(&services, &resolved);
        assert_eq!(registry.len(), 5);

        let err = registry
            .handle_for(CharacteristicKind::HeartRate)
            .unwrap_err();
        assert!(err.to_string().contains("heart rate"));

        // The other signals are unaffected.
        assert!(registry.handle_for(CharacteristicKind::Conductivity).is_ok());
    }

    #[test]
    fn test_kind_for_unknown_handle() {
        let services = default_services();
        let registry = HandleRegistry::from_resolved(&services, &resolve_all(&services));
        assert_eq!(registry.kind_for(AttHandle(0xFFFF)), None);
    }
}
