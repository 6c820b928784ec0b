//! Reference configurations applied by [`Ina226::configure`](crate::Ina226::configure)
//! and [`Ina226::configure_alert`](crate::Ina226::configure_alert)

use crate::alert::Alert;
use crate::register::{AlertPolarity, Average, ConversionTime, Mode};

/// Measurement setup
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub average: Average,
    pub bus_conversion_time: ConversionTime,
    pub shunt_conversion_time: ConversionTime,
    pub mode: Mode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            average: Average::_16,
            bus_conversion_time: ConversionTime::_1_1_ms,
            shunt_conversion_time: ConversionTime::_1_1_ms,
            mode: Mode::ShuntAndBusContinuous,
        }
    }
}

impl Settings {
    /// Defaults, but idle in power-down between [`single_shot`](crate::Ina226::single_shot) calls
    pub fn triggered() -> Self {
        Settings {
            mode: Mode::PowerDown,
            ..Self::default()
        }
    }
}

/// Alert setup on top of [`Settings`]
///
/// `threshold` is in the unit of the selected function: mV for the shunt and
/// bus voltage alerts, mW for the power alert.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertSettings {
    pub measurement: Settings,
    pub alert: Alert,
    pub threshold: f64,
    pub conversion_ready_pin: bool,
    pub polarity: AlertPolarity,
    pub latch: bool,
}

impl AlertSettings {
    pub fn new(alert: Alert, threshold: f64) -> Self {
        AlertSettings {
            measurement: Settings::default(),
            alert,
            threshold,
            conversion_ready_pin: false,
            polarity: AlertPolarity::Normal,
            latch: false,
        }
    }
}
