//! Register map and bit fields of the INA226

use core::fmt::Display;

/// Register pointer addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Configuration = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
    MaskEnable = 0x06,
    AlertLimit = 0x07,
    Manufacturer = 0xFE,
    DieId = 0xFF,
}

impl Register {
    #[inline(always)]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// "TI" in ASCII
pub const MANUFACTURER_ID: u16 = 0x5449;
/// Device ID 0x226 in bits 15..4, revision 0 in bits 3..0
pub const DIE_ID: u16 = 0x2260;
/// Configuration register contents after power-on or reset
pub const DEFAULT_CONFIGURATION: u16 = 0x4127;

pub(crate) const RESET_BIT: u16 = 1 << 15;

const AVERAGE_SHIFT: u16 = 9;
const BUS_CONVERSION_SHIFT: u16 = 6;
const SHUNT_CONVERSION_SHIFT: u16 = 3;
const FIELD_MASK: u16 = 0b111;

/// Number of samples averaged per reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Average {
    _1 = 0x00,
    _4 = 0x01,
    _16 = 0x02,
    _64 = 0x03,
    _128 = 0x04,
    _256 = 0x05,
    _512 = 0x06,
    _1024 = 0x07,
}

impl Average {
    const fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0x00 => Average::_1,
            0x01 => Average::_4,
            0x02 => Average::_16,
            0x03 => Average::_64,
            0x04 => Average::_128,
            0x05 => Average::_256,
            0x06 => Average::_512,
            _ => Average::_1024,
        }
    }

    pub const fn samples(self) -> u32 {
        match self {
            Average::_1 => 1,
            Average::_4 => 4,
            Average::_16 => 16,
            Average::_64 => 64,
            Average::_128 => 128,
            Average::_256 => 256,
            Average::_512 => 512,
            Average::_1024 => 1024,
        }
    }
}

/// Conversion time of the bus or shunt voltage ADC
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionTime {
    _140_us = 0x00,
    _204_us = 0x01,
    _332_us = 0x02,
    _588_us = 0x03,
    _1_1_ms = 0x04,
    _2_116_ms = 0x05,
    _4_156_ms = 0x06,
    _8_244_ms = 0x07,
}

impl ConversionTime {
    const fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0x00 => ConversionTime::_140_us,
            0x01 => ConversionTime::_204_us,
            0x02 => ConversionTime::_332_us,
            0x03 => ConversionTime::_588_us,
            0x04 => ConversionTime::_1_1_ms,
            0x05 => ConversionTime::_2_116_ms,
            0x06 => ConversionTime::_4_156_ms,
            _ => ConversionTime::_8_244_ms,
        }
    }

    pub const fn micros(self) -> u32 {
        match self {
            ConversionTime::_140_us => 140,
            ConversionTime::_204_us => 204,
            ConversionTime::_332_us => 332,
            ConversionTime::_588_us => 588,
            ConversionTime::_1_1_ms => 1_100,
            ConversionTime::_2_116_ms => 2_116,
            ConversionTime::_4_156_ms => 4_156,
            ConversionTime::_8_244_ms => 8_244,
        }
    }
}

/// Operating mode, bits 2..0 of the configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    PowerDown = 0x00,
    ShuntVoltageTriggered = 0x01,
    BusVoltageTriggered = 0x02,
    ShuntAndBusTriggered = 0x03,
    PowerDown2 = 0x04,
    ShuntVoltageContinuous = 0x05,
    BusVoltageContinuous = 0x06,
    ShuntAndBusContinuous = 0x07,
}

impl Mode {
    const fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0x00 => Mode::PowerDown,
            0x01 => Mode::ShuntVoltageTriggered,
            0x02 => Mode::BusVoltageTriggered,
            0x03 => Mode::ShuntAndBusTriggered,
            0x04 => Mode::PowerDown2,
            0x05 => Mode::ShuntVoltageContinuous,
            0x06 => Mode::BusVoltageContinuous,
            _ => Mode::ShuntAndBusContinuous,
        }
    }

    pub const fn is_triggered(self) -> bool {
        matches!(
            self,
            Mode::ShuntVoltageTriggered | Mode::BusVoltageTriggered | Mode::ShuntAndBusTriggered
        )
    }
}

/// Shadow of the configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration(pub u16);

impl Default for Configuration {
    fn default() -> Self {
        Configuration(DEFAULT_CONFIGURATION)
    }
}

impl Configuration {
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn average(self) -> Average {
        Average::from_bits(self.0 >> AVERAGE_SHIFT)
    }

    pub const fn bus_conversion_time(self) -> ConversionTime {
        ConversionTime::from_bits(self.0 >> BUS_CONVERSION_SHIFT)
    }

    pub const fn shunt_conversion_time(self) -> ConversionTime {
        ConversionTime::from_bits(self.0 >> SHUNT_CONVERSION_SHIFT)
    }

    pub const fn mode(self) -> Mode {
        Mode::from_bits(self.0)
    }

    #[must_use]
    pub const fn with_average(self, value: Average) -> Self {
        Self::with_field(self, AVERAGE_SHIFT, value as u16)
    }

    #[must_use]
    pub const fn with_bus_conversion_time(self, value: ConversionTime) -> Self {
        Self::with_field(self, BUS_CONVERSION_SHIFT, value as u16)
    }

    #[must_use]
    pub const fn with_shunt_conversion_time(self, value: ConversionTime) -> Self {
        Self::with_field(self, SHUNT_CONVERSION_SHIFT, value as u16)
    }

    #[must_use]
    pub const fn with_mode(self, value: Mode) -> Self {
        Self::with_field(self, 0, value as u16)
    }

    /// Worst case time for one shunt + bus conversion cycle, averaging included
    pub const fn conversion_period_us(self) -> u32 {
        (self.bus_conversion_time().micros() + self.shunt_conversion_time().micros())
            * self.average().samples()
    }

    const fn with_field(self, shift: u16, value: u16) -> Self {
        let cleared = self.0 & !(FIELD_MASK << shift);
        Configuration(cleared | ((value & FIELD_MASK) << shift))
    }
}

/// Control bits of the mask/enable register other than the five alert functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskEnable {
    ConversionReady = 1 << 10,
    AlertFunctionFlag = 1 << 4,
    ConversionReadyFlag = 1 << 3,
    MathOverflowFlag = 1 << 2,
    AlertPolarityBit = 1 << 1,
    AlertLatchEnable = 1,
}

impl MaskEnable {
    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

/// Read-only status flags, cleared by reading the mask/enable register
pub(crate) const FLAG_BITS: u16 = MaskEnable::AlertFunctionFlag.bits()
    | MaskEnable::ConversionReadyFlag.bits()
    | MaskEnable::MathOverflowFlag.bits();

/// Level of the ALERT pin when asserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertPolarity {
    /// Active low, open collector
    #[default]
    Normal,
    /// Active high, open collector
    Inverted,
}

/// Status flags of one mask/enable register read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags {
    pub alert_function: bool,
    pub conversion_ready: bool,
    pub math_overflow: bool,
}

impl Flags {
    pub const fn from_bits(bits: u16) -> Self {
        Flags {
            alert_function: bits & MaskEnable::AlertFunctionFlag.bits() != 0,
            conversion_ready: bits & MaskEnable::ConversionReadyFlag.bits() != 0,
            math_overflow: bits & MaskEnable::MathOverflowFlag.bits() != 0,
        }
    }
}

impl Display for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "AFF={} CVRF={} OVF={}",
            self.alert_function as u8, self.conversion_ready as u8, self.math_overflow as u8
        )
    }
}
