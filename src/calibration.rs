//! Calibration register arithmetic
//!
//! The INA226 computes current as `shunt_voltage * calibration / 2048` and
//! power as `current * bus_voltage / 20000`, which together fix the relations
//!
//! ```text
//! calibration = 0.00512 / (current_lsb * r_shunt)
//! power_lsb   = 25 * current_lsb
//! ```
//!
//! from section 7.5 of the datasheet.

use core::fmt::Display;
use core::ops::RangeInclusive;

/// Internal scaling constant of the calibration equation
pub const CALIBRATION_SCALE: f64 = 0.00512;
/// Ratio between the power and current register LSBs
pub const POWER_LSB_RATIO: f64 = 25.0;
/// Default maximum expected current in A; gives a current LSB of 100 µA
pub const DEFAULT_MAX_CURRENT: f64 = 3.2768;
/// Resolution of the current register, the top bit being the sign
pub const CURRENT_RESOLUTION: f64 = 32768.0;

const REGISTER_RANGE: RangeInclusive<f64> = 1.0..=(u16::MAX as f64);
/// Absolute slack added before flooring the calibration quotient
const ROUNDING_SLACK: f64 = 1e-6;
/// Bit 15 of the calibration register is not implemented by the chip
const RESERVED_BIT: u16 = 1 << 15;

/// Invalid resistance, current or derived calibration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    /// Shunt resistance is not positive, not finite, or outside the supported range
    InvalidResistance,
    /// Maximum expected current is not positive or not finite
    InvalidMaxCurrent,
    /// The calibration value is zero or does not fit 16 bits
    CalibrationOutOfRange,
    /// No shunt resistance has been set
    MissingResistance,
    /// Current or power was requested before a calibration was computed
    NotCalibrated,
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigurationError::InvalidResistance => write!(f, "Invalid shunt resistance"),
            ConfigurationError::InvalidMaxCurrent => write!(f, "Invalid maximum current"),
            ConfigurationError::CalibrationOutOfRange => {
                write!(f, "Calibration value does not fit the register")
            }
            ConfigurationError::MissingResistance => write!(f, "Shunt resistance not set"),
            ConfigurationError::NotCalibrated => write!(f, "Device not calibrated"),
        }
    }
}

impl core::error::Error for ConfigurationError {}

/// Current/power scaling for one shunt resistor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    current_lsb: f64,
    power_lsb: f64,
    register: u16,
}

impl Calibration {
    /// Calibration for `resistance` ohms at [`DEFAULT_MAX_CURRENT`]
    ///
    /// Only shunts in (0.001, 1.0] Ω are accepted here; use
    /// [`Calibration::with_max_current`] for other designs. Shunts below
    /// about 1.6 mΩ yield a value in bit 15, which the chip ignores; see
    /// [`Calibration::uses_reserved_bit`].
    ///
    /// ```rust
    /// use ina226_monitor::calibration::Calibration;
    ///
    /// let cal = Calibration::new(0.1).unwrap();
    /// assert_eq!(cal.register(), 0x0200);
    /// ```
    ///
    /// # Errors
    /// `InvalidResistance` outside the supported shunt range.
    pub fn new(resistance: f64) -> Result<Self, ConfigurationError> {
        if !(resistance > 0.001 && resistance <= 1.0) {
            return Err(ConfigurationError::InvalidResistance);
        }
        Self::with_max_current(resistance, DEFAULT_MAX_CURRENT)
    }

    /// # Errors
    /// `InvalidResistance` or `InvalidMaxCurrent` for non-positive inputs,
    /// `CalibrationOutOfRange` when the result is zero or above 16 bits.
    pub fn with_max_current(resistance: f64, max_current: f64) -> Result<Self, ConfigurationError> {
        if !(resistance.is_finite() && resistance > 0.0) {
            return Err(ConfigurationError::InvalidResistance);
        }
        if !(max_current.is_finite() && max_current > 0.0) {
            return Err(ConfigurationError::InvalidMaxCurrent);
        }

        let current_lsb = max_current / CURRENT_RESOLUTION;
        let exact = CALIBRATION_SCALE / (current_lsb * resistance);
        // Decimal LSBs are not exact in binary; keep 511.9999999 from truncating to 511
        let register = libm::floor(exact + ROUNDING_SLACK);
        if !REGISTER_RANGE.contains(&register) {
            return Err(ConfigurationError::CalibrationOutOfRange);
        }

        Ok(Calibration {
            current_lsb,
            power_lsb: current_lsb * POWER_LSB_RATIO,
            register: register as u16,
        })
    }

    /// Rebuild the LSBs from a calibration value already active on the chip
    ///
    /// # Errors
    /// `CalibrationOutOfRange` for a zero register, `InvalidResistance` for a
    /// non-positive shunt.
    pub fn from_register(register: u16, resistance: f64) -> Result<Self, ConfigurationError> {
        if !(resistance.is_finite() && resistance > 0.0) {
            return Err(ConfigurationError::InvalidResistance);
        }
        if register == 0 {
            return Err(ConfigurationError::CalibrationOutOfRange);
        }

        let current_lsb = CALIBRATION_SCALE / (register as f64 * resistance);
        Ok(Calibration {
            current_lsb,
            power_lsb: current_lsb * POWER_LSB_RATIO,
            register,
        })
    }

    /// Amps per current register count
    pub const fn current_lsb(&self) -> f64 {
        self.current_lsb
    }

    /// Watts per power register count
    pub const fn power_lsb(&self) -> f64 {
        self.power_lsb
    }

    /// Value for the calibration register
    pub const fn register(&self) -> u16 {
        self.register
    }

    /// Whether the register value needs bit 15
    ///
    /// The chip ignores that bit, so such a calibration does not match what
    /// the hardware computes with. Shunts below about 1.6 mΩ at the default
    /// maximum current end up here.
    pub const fn uses_reserved_bit(&self) -> bool {
        self.register & RESERVED_BIT != 0
    }
}
