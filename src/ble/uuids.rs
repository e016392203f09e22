//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants for the GATT table exposed by the
//! HydraWise peripheral.

use uuid::Uuid;

// Heart Rate Service (Standard BLE)
/// Standard BLE Heart Rate Service UUID.
pub const HEART_RATE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180d_0000_1000_8000_00805f9b34fb);
/// Heart Rate Measurement characteristic UUID.
pub const HEART_RATE_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a37_0000_1000_8000_00805f9b34fb);

// Conductivity Service (HydraWise Custom)
/// Conductivity Service UUID.
pub const CONDUCTIVITY_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_181c_0000_1000_8000_00805f9b34fb);
/// Conductivity Measurement characteristic UUID (128-bit custom).
pub const CONDUCTIVITY_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0xaa5b_9750_c982_4ce6_90c7_54c0c8c6ae84);

// Battery Service (Standard BLE)
/// Standard BLE Battery Service UUID.
pub const BATTERY_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180f_0000_1000_8000_00805f9b34fb);
/// Battery Level characteristic UUID.
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

// Device Information Service (Standard BLE)
/// Standard BLE Device Information Service UUID.
pub const DEVICE_INFO_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180a_0000_1000_8000_00805f9b34fb);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_00805f9b34fb);
/// Model Number characteristic UUID.
pub const MODEL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a24_0000_1000_8000_00805f9b34fb);

// Command Service (HydraWise Custom)
/// Command Service UUID.
pub const COMMAND_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180c_0000_1000_8000_00805f9b34fb);
/// Command channel characteristic UUID (write only).
pub const COMMAND_CHANNEL_UUID: Uuid = Uuid::from_u128(0x0000_2a00_0000_1000_8000_00805f9b34fb);

/// Check if a service UUID carries periodic telemetry.
pub fn is_telemetry_service(uuid: &Uuid) -> bool {
    *uuid == HEART_RATE_SERVICE_UUID || *uuid == CONDUCTIVITY_SERVICE_UUID
}

/// Check if a service UUID is HydraWise-specific rather than a standard
/// SIG-assigned service.
pub fn is_custom_service(uuid: &Uuid) -> bool {
    *uuid == CONDUCTIVITY_SERVICE_UUID || *uuid == COMMAND_SERVICE_UUID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        let heart_rate = HEART_RATE_SERVICE_UUID.to_string();
        assert!(heart_rate.contains("180d"));

        let conductivity = CONDUCTIVITY_MEASUREMENT_UUID.to_string();
        assert!(conductivity.contains("aa5b9750"));
    }

    #[test]
    fn test_is_telemetry_service() {
        assert!(is_telemetry_service(&HEART_RATE_SERVICE_UUID));
        assert!(is_telemetry_service(&CONDUCTIVITY_SERVICE_UUID));
        assert!(!is_telemetry_service(&DEVICE_INFO_SERVICE_UUID));
    }

    #[test]
    fn test_is_custom_service() {
        assert!(is_custom_service(&CONDUCTIVITY_SERVICE_UUID));
        assert!(is_custom_service(&COMMAND_SERVICE_UUID));
        assert!(!is_custom_service(&BATTERY_SERVICE_UUID));
        assert!(!is_custom_service(&HEART_RATE_SERVICE_UUID));
    }
}
