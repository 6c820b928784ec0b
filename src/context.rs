//! Shunt and scaling state shared by the codec and the calibration engine

use crate::calibration::{Calibration, ConfigurationError, DEFAULT_MAX_CURRENT};
use crate::codec::{self, RangeError};

/// Resistance, maximum current and the calibration derived from them
///
/// Changing the resistance or the maximum current drops the calibration; it
/// has to be recomputed and written to the chip again before current or power
/// values mean anything.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Context {
    resistance: Option<f64>,
    max_current: Option<f64>,
    calibration: Option<Calibration>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub const fn new() -> Self {
        Context {
            resistance: None,
            max_current: None,
            calibration: None,
        }
    }

    /// # Errors
    /// `InvalidResistance` unless `ohms` is finite and positive.
    pub fn set_resistance(&mut self, ohms: f64) -> Result<&mut Self, ConfigurationError> {
        if !(ohms.is_finite() && ohms > 0.0) {
            return Err(ConfigurationError::InvalidResistance);
        }
        self.resistance = Some(ohms);
        self.calibration = None;
        Ok(self)
    }

    pub const fn resistance(&self) -> Option<f64> {
        self.resistance
    }

    /// # Errors
    /// `InvalidMaxCurrent` unless `amps` is finite and positive.
    pub fn set_max_current(&mut self, amps: f64) -> Result<&mut Self, ConfigurationError> {
        if !(amps.is_finite() && amps > 0.0) {
            return Err(ConfigurationError::InvalidMaxCurrent);
        }
        self.max_current = Some(amps);
        self.calibration = None;
        Ok(self)
    }

    pub fn max_current(&self) -> f64 {
        self.max_current.unwrap_or(DEFAULT_MAX_CURRENT)
    }

    /// Compute the calibration for the current resistance without storing it
    ///
    /// # Errors
    /// `MissingResistance` before [`Context::set_resistance`], otherwise any
    /// error of the calibration engine.
    pub fn calculate(&self) -> Result<Calibration, ConfigurationError> {
        let resistance = self
            .resistance
            .ok_or(ConfigurationError::MissingResistance)?;
        match self.max_current {
            None => Calibration::new(resistance),
            Some(amps) => Calibration::with_max_current(resistance, amps),
        }
    }

    /// Compute and store the calibration
    ///
    /// # Errors
    /// See [`Context::calculate`].
    pub fn calibrate(&mut self) -> Result<Calibration, ConfigurationError> {
        let calibration = self.calculate()?;
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    /// Adopt a raw calibration value, keeping the LSBs consistent with it
    ///
    /// # Errors
    /// `MissingResistance` before [`Context::set_resistance`], or a zero register.
    pub fn load_register(&mut self, register: u16) -> Result<Calibration, ConfigurationError> {
        let resistance = self
            .resistance
            .ok_or(ConfigurationError::MissingResistance)?;
        let calibration = Calibration::from_register(register, resistance)?;
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    pub(crate) fn store(&mut self, calibration: Calibration) {
        self.calibration = Some(calibration);
    }

    pub const fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    /// Forget the calibration, e.g. after the chip was reset
    pub fn invalidate(&mut self) {
        self.calibration = None;
    }

    /// Back to the state of a freshly created context
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn current_lsb(&self) -> Option<f64> {
        self.calibration.map(|c| c.current_lsb())
    }

    pub fn power_lsb(&self) -> Option<f64> {
        self.calibration.map(|c| c.power_lsb())
    }

    fn require_calibration(&self) -> Result<Calibration, ConfigurationError> {
        self.calibration.ok_or(ConfigurationError::NotCalibrated)
    }

    /// # Errors
    /// `NotCalibrated` before a calibration was computed or loaded.
    pub fn current_to_data(&self, raw: i16) -> Result<f64, ConfigurationError> {
        let cal = self.require_calibration()?;
        Ok(codec::current_to_data(raw, cal.current_lsb()))
    }

    /// # Errors
    /// `NotCalibrated` before a calibration was computed or loaded.
    pub fn power_to_data(&self, raw: u16) -> Result<f64, ConfigurationError> {
        let cal = self.require_calibration()?;
        Ok(codec::power_to_data(raw, cal.power_lsb()))
    }

    /// # Errors
    /// `ContextError::Configuration` when uncalibrated, `ContextError::Range`
    /// when the power does not fit the register.
    pub fn data_to_power_register(&self, milliwatts: f64) -> Result<u16, ContextError> {
        let cal = self.require_calibration()?;
        Ok(codec::data_to_power_register(milliwatts, cal.power_lsb())?)
    }

    /// # Errors
    /// See [`ContextError`].
    pub fn data_to_current_register(&self, milliamps: f64) -> Result<i16, ContextError> {
        let cal = self.require_calibration()?;
        Ok(codec::data_to_current_register(milliamps, cal.current_lsb())?)
    }
}

/// Failure of a conversion that needs both a calibration and a range check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContextError {
    Configuration(ConfigurationError),
    Range(RangeError),
}

impl From<ConfigurationError> for ContextError {
    fn from(e: ConfigurationError) -> Self {
        ContextError::Configuration(e)
    }
}

impl From<RangeError> for ContextError {
    fn from(e: RangeError) -> Self {
        ContextError::Range(e)
    }
}
