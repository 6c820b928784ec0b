//! Conversions between raw register values and physical units
//!
//! Voltages are in millivolts, currents in milliamps and power in milliwatts.
//! Shunt voltage and current registers are two's complement, bus voltage and
//! power registers are unsigned. Nothing here touches the bus.

use core::fmt::Display;

/// Shunt voltage register resolution, 2.5 µV
pub const SHUNT_VOLTAGE_LSB_MV: f64 = 0.0025;
/// Bus voltage register resolution, 1.25 mV
pub const BUS_VOLTAGE_LSB_MV: f64 = 1.25;

/// A physical value does not fit the fixed-point register encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeError;

impl Display for RangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Value out of register range")
    }
}

impl core::error::Error for RangeError {}

fn to_signed(counts: f64) -> Result<i16, RangeError> {
    let counts = libm::round(counts);
    if counts >= i16::MIN as f64 && counts <= i16::MAX as f64 {
        Ok(counts as i16)
    } else {
        Err(RangeError)
    }
}

fn to_unsigned(counts: f64) -> Result<u16, RangeError> {
    let counts = libm::round(counts);
    if counts >= 0.0 && counts <= u16::MAX as f64 {
        Ok(counts as u16)
    } else {
        Err(RangeError)
    }
}

pub fn shunt_voltage_to_data(raw: i16) -> f64 {
    raw as f64 * SHUNT_VOLTAGE_LSB_MV
}

/// # Errors
/// `RangeError` outside ±81.92 mV or for a non-finite input.
pub fn data_to_shunt_voltage_register(millivolts: f64) -> Result<i16, RangeError> {
    to_signed(millivolts / SHUNT_VOLTAGE_LSB_MV)
}

pub fn bus_voltage_to_data(raw: u16) -> f64 {
    raw as f64 * BUS_VOLTAGE_LSB_MV
}

/// # Errors
/// `RangeError` for negative voltages, anything above 81.92 V, or a non-finite input.
pub fn data_to_bus_voltage_register(millivolts: f64) -> Result<u16, RangeError> {
    to_unsigned(millivolts / BUS_VOLTAGE_LSB_MV)
}

/// `current_lsb` is in A/count
pub fn current_to_data(raw: i16, current_lsb: f64) -> f64 {
    raw as f64 * current_lsb * 1000.0
}

/// # Errors
/// `RangeError` when the current does not fit 15 bits plus sign at this LSB.
pub fn data_to_current_register(milliamps: f64, current_lsb: f64) -> Result<i16, RangeError> {
    to_signed(milliamps / (current_lsb * 1000.0))
}

/// `power_lsb` is in W/count
pub fn power_to_data(raw: u16, power_lsb: f64) -> f64 {
    raw as f64 * power_lsb * 1000.0
}

/// # Errors
/// `RangeError` when the power is negative or does not fit 16 bits at this LSB.
pub fn data_to_power_register(milliwatts: f64, power_lsb: f64) -> Result<u16, RangeError> {
    to_unsigned(milliwatts / (power_lsb * 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn shunt_voltage_full_range_round_trip() {
        for raw in (i16::MIN..=i16::MAX).step_by(7).chain([i16::MIN, i16::MAX]) {
            let mv = shunt_voltage_to_data(raw);
            assert_eq!(data_to_shunt_voltage_register(mv), Ok(raw));
        }
    }

    #[test]
    fn bus_voltage_full_range_round_trip() {
        for raw in (0..=u16::MAX).step_by(5).chain([u16::MAX]) {
            let mv = bus_voltage_to_data(raw);
            assert_eq!(data_to_bus_voltage_register(mv), Ok(raw));
        }
    }

    #[test]
    fn datasheet_values() {
        assert!(approx_eq!(f64, shunt_voltage_to_data(0x7FFF), 81.9175, epsilon = 1e-9));
        assert!(approx_eq!(f64, shunt_voltage_to_data(-32768), -81.92, epsilon = 1e-9));
        assert!(approx_eq!(f64, bus_voltage_to_data(0x2580), 12_000.0, epsilon = 1e-9));
        assert_eq!(data_to_bus_voltage_register(12_000.0), Ok(0x2580));
    }

    #[test]
    fn register_encoding_rounds_to_nearest() {
        assert_eq!(data_to_shunt_voltage_register(0.0037), Ok(1));
        assert_eq!(data_to_shunt_voltage_register(0.0038), Ok(2));
        assert_eq!(data_to_shunt_voltage_register(-0.0038), Ok(-2));
        assert_eq!(data_to_bus_voltage_register(1.9), Ok(2));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(data_to_shunt_voltage_register(82.0), Err(RangeError));
        assert_eq!(data_to_shunt_voltage_register(-82.0), Err(RangeError));
        assert_eq!(data_to_shunt_voltage_register(f64::NAN), Err(RangeError));
        assert_eq!(data_to_bus_voltage_register(-1.0), Err(RangeError));
        assert_eq!(data_to_bus_voltage_register(82_000.0), Err(RangeError));
        assert_eq!(data_to_bus_voltage_register(f64::INFINITY), Err(RangeError));
        assert_eq!(data_to_power_register(-5.0, 0.0025), Err(RangeError));
        assert_eq!(data_to_power_register(200_000.0, 0.0025), Err(RangeError));
        assert_eq!(data_to_power_register(1.0, 0.0), Err(RangeError));
        assert_eq!(data_to_current_register(4_000.0, 0.0001), Err(RangeError));
    }

    #[test]
    fn current_and_power_scale_with_lsb() {
        assert!(approx_eq!(f64, current_to_data(1000, 0.0001), 100.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, current_to_data(-1000, 0.0001), -100.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, power_to_data(400, 0.0025), 1000.0, epsilon = 1e-9));
        assert_eq!(data_to_power_register(1000.0, 0.0025), Ok(400));
        assert_eq!(data_to_current_register(-100.0, 0.0001), Ok(-1000));
    }
}
