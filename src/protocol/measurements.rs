//! Telemetry measurement types and wire encodings.
//!
//! Each characteristic has exactly one documented encoding, shared by the
//! read and the notify path:
//!
//! - Heart rate: `[flags: u8, bpm: u8]`, little-endian, flags currently 0.
//! - Conductivity: `[flags: u8, value: u8]` in mS/cm, flags currently 0.
//! - Battery level: `[percent: u8]`, clamped to 0-100.
//! - Device information fields: UTF-8 strings.
//!
//! Values are synthetic placeholders; a real deployment substitutes sensor
//! reads in [`HeartRateMeasurement::sample`] and
//! [`ConductivityMeasurement::sample`].

use bytes::{BufMut, BytesMut};

/// Demo heart rate, in beats per minute.
pub const DEMO_HEART_RATE_BPM: u8 = 75;

/// Demo conductivity, in mS/cm.
pub const DEMO_CONDUCTIVITY_MS_CM: u8 = 50;

/// Demo battery charge, in percent.
pub const DEMO_BATTERY_PERCENT: u8 = 87;

/// Manufacturer name exposed by the Device Information service.
pub const MANUFACTURER_NAME: &str = "HydraWise";

/// Model number exposed by the Device Information service.
pub const MODEL_NUMBER: &str = "HW-1";

/// A heart rate measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeartRateMeasurement {
    /// Flags field; no flag bits are currently defined.
    pub flags: u8,
    /// Heart rate in beats per minute.
    pub bpm: u8,
}

impl HeartRateMeasurement {
    /// Synthesize the current measurement.
    pub fn sample() -> Self {
        Self {
            flags: 0,
            bpm: DEMO_HEART_RATE_BPM,
        }
    }

    /// Encode as the 2-byte wire payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(self.flags);
        buf.put_u8(self.bpm);
        buf.to_vec()
    }
}

/// A conductivity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConductivityMeasurement {
    /// Flags field; no flag bits are currently defined.
    pub flags: u8,
    /// Conductivity in mS/cm.
    pub value: u8,
}

impl ConductivityMeasurement {
    /// Synthesize the current measurement.
    pub fn sample() -> Self {
        Self {
            flags: 0,
            value: DEMO_CONDUCTIVITY_MS_CM,
        }
    }

    /// Encode as the 2-byte wire payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(self.flags);
        buf.put_u8(self.value);
        buf.to_vec()
    }
}

/// Encode a battery level as its 1-byte wire payload.
pub fn battery_level_payload(percent: u8) -> Vec<u8> {
    vec![percent.min(100)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heart_rate_encoding() {
        let measurement = HeartRateMeasurement::sample();
        assert_eq!(measurement.encode(), vec![0x00, 75]);
    }

    #[test]
    fn test_conductivity_encoding() {
        let measurement = ConductivityMeasurement::sample();
        assert_eq!(measurement.encode(), vec![0x00, 50]);
    }

    #[test]
    fn test_battery_payload_clamps() {
        assert_eq!(battery_level_payload(87), vec![87]);
        assert_eq!(battery_level_payload(250), vec![100]);
        assert_eq!(battery_level_payload(0), vec![0]);
    }

    #[test]
    fn test_flags_byte_leads() {
        let measurement = HeartRateMeasurement { flags: 0x01, bpm: 60 };
        assert_eq!(measurement.encode()[0], 0x01);
    }
}
