//! GATT-side logic: the declarative service table, runtime handle
//! resolution, and characteristic access dispatch.

pub mod dispatch;
pub mod registry;

pub use dispatch::AccessDispatcher;
pub use registry::{
    default_services, Capabilities, CharacteristicDef, CharacteristicKind, HandleRegistry,
    ServiceDef,
};
