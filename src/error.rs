use core::fmt::{Debug, Display};

use crate::calibration::ConfigurationError;
use crate::codec::RangeError;
use crate::context::ContextError;

/// Errors of the driver, generic over the I2C bus error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus transaction failed
    Transport(E),
    /// A value does not fit the register encoding
    Range(RangeError),
    /// Resistance, current or calibration problem
    Configuration(ConfigurationError),
    /// A poll budget ran out
    Timeout,
    /// Unexpected manufacturer ID register contents
    InvalidManufacturer(u16),
    /// Unexpected die ID register contents
    InvalidDie(u16),
    /// No INA226 answered on any strap address
    NotFound,
}

impl<E: Debug> Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "I2C error: {e:?}"),
            Error::Range(e) => write!(f, "{e}"),
            Error::Configuration(e) => write!(f, "{e}"),
            Error::Timeout => write!(f, "Timed out"),
            Error::InvalidManufacturer(id) => write!(f, "Invalid Manufacturer {id:#06x}"),
            Error::InvalidDie(id) => write!(f, "Invalid Die Number {id:#06x}"),
            Error::NotFound => write!(f, "Not found on any address"),
        }
    }
}

impl<E: Debug> core::error::Error for Error<E> {}

impl<E> From<RangeError> for Error<E> {
    fn from(e: RangeError) -> Self {
        Error::Range(e)
    }
}

impl<E> From<ConfigurationError> for Error<E> {
    fn from(e: ConfigurationError) -> Self {
        Error::Configuration(e)
    }
}

impl<E> From<ContextError> for Error<E> {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Configuration(e) => Error::Configuration(e),
            ContextError::Range(e) => Error::Range(e),
        }
    }
}

/// Initialization failed; the device is handed back unchanged
#[derive(Debug)]
pub struct InitializationError<D, E> {
    pub device: D,
    pub error: Error<E>,
}

impl<D, E> InitializationError<D, E> {
    pub fn into_parts(self) -> (D, Error<E>) {
        (self.device, self.error)
    }
}

impl<D, E: Debug> Display for InitializationError<D, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Initialization failed: {}", self.error)
    }
}

impl<D: Debug, E: Debug> core::error::Error for InitializationError<D, E> {}
