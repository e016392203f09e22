// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # hydrawise-ble
//!
//! The BLE peripheral core of the HydraWise hydration monitor: connection
//! and advertising lifecycle, GATT characteristic access dispatch, and
//! periodic telemetry notifications.
//!
//! The radio and link layer are deliberately out of scope. The crate talks
//! to them through the [`HostStack`] trait, so the same core runs against
//! any compliant BLE host stack binding — and against the bundled
//! [`MockStack`] on a desk with no radio at all.
//!
//! ## Features
//!
//! - **Availability-first lifecycle**: a single connection slot; every
//!   disconnect, failed connect, or expired advertising window restarts
//!   advertising. The device is never left unreachable.
//! - **Declarative GATT table**: heart rate, conductivity, battery, device
//!   information, and a write-only command channel, resolved to runtime
//!   handles once at startup.
//! - **Text command channel**: `START`/`STOP` toggles telemetry collection;
//!   anything else is accepted and ignored.
//! - **Two telemetry cadences**: independent heart rate (3 s) and
//!   conductivity (5 s) notifier loops that skip cleanly while disconnected
//!   or stopped and survive per-send delivery failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hydrawise_ble::{MockStack, Peripheral, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Assemble against the in-memory stack and start advertising.
//!     let peripheral = Peripheral::new(MockStack::new()).await?;
//!     peripheral.start().await?;
//!
//!     // Simulate a central connecting; telemetry flows on its own clocks.
//!     let stack = peripheral.stack();
//!     stack.connect(1);
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     println!("delivered {} notifications", stack.notification_count());
//!
//!     peripheral.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Binding a real stack
//!
//! Implement [`HostStack`] over your platform's BLE bindings: map its
//! connect/disconnect/advertising callbacks and read/write callbacks onto
//! [`StackEvent`]s, and its notification and advertising calls onto the
//! trait methods. Everything above the trait is platform-independent.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod error;
pub mod gatt;
pub mod peripheral;
pub mod protocol;
pub mod scheduler;

// Re-exports for convenience
pub use error::{Error, Result};
pub use peripheral::{default_advertisement, Peripheral, DEVICE_NAME};
pub use scheduler::{NotificationScheduler, CONDUCTIVITY_PERIOD, HEART_RATE_PERIOD};

// Re-export commonly used types from submodules
pub use ble::connection::{LinkEvent, LinkState, SharedState};
pub use ble::mock::{MockStack, SentNotification};
pub use ble::stack::{
    Advertisement, AttHandle, ConnectStatus, ConnectionHandle, HostStack, StackEvent,
};
pub use gatt::dispatch::AccessDispatcher;
pub use gatt::registry::{
    default_services, Capabilities, CharacteristicDef, CharacteristicKind, HandleRegistry,
    ServiceDef,
};
pub use protocol::commands::Command;
pub use protocol::measurements::{ConductivityMeasurement, HeartRateMeasurement};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<Peripheral<MockStack>>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<LinkState>();
        let _ = std::any::TypeId::of::<CharacteristicKind>();
        let _ = std::any::TypeId::of::<Command>();
        let _ = std::any::TypeId::of::<HeartRateMeasurement>();
    }

    #[test]
    fn test_device_name() {
        assert_eq!(DEVICE_NAME, "HydraWise-BLE-Server");
    }
}
