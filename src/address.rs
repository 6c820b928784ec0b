//! I2C slave address of the INA226
//!
//! The address is strapped with the A0 and A1 pins, each of which can be tied
//! to GND, VS, SDA or SCL, giving the 16 addresses `0x40..=0x4F` listed in
//! table 2 of the datasheet.

use core::fmt::Display;

/// Signal an address pin is tied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SlaveAddressing {
    Gnd = 0,
    Vs = 1,
    Sda = 2,
    Scl = 3,
}

impl SlaveAddressing {
    pub const ALL: [SlaveAddressing; 4] = [
        SlaveAddressing::Gnd,
        SlaveAddressing::Vs,
        SlaveAddressing::Sda,
        SlaveAddressing::Scl,
    ];

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => SlaveAddressing::Gnd,
            1 => SlaveAddressing::Vs,
            2 => SlaveAddressing::Sda,
            _ => SlaveAddressing::Scl,
        }
    }
}

impl Display for SlaveAddressing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SlaveAddressing::Gnd => write!(f, "GND"),
            SlaveAddressing::Vs => write!(f, "VS"),
            SlaveAddressing::Sda => write!(f, "SDA"),
            SlaveAddressing::Scl => write!(f, "SCL"),
        }
    }
}

/// 7-bit bus address of one INA226
///
/// ```rust
/// use ina226_monitor::address::{Address, SlaveAddressing};
///
/// let address = Address::from_pins(SlaveAddressing::Sda, SlaveAddressing::Vs);
/// assert_eq!(address.as_byte(), 0x46);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    pub const MIN: u8 = 0x40;
    pub const MAX: u8 = 0x4F;

    /// Build the address from the signals on A0 and A1
    #[must_use]
    pub const fn from_pins(a0: SlaveAddressing, a1: SlaveAddressing) -> Self {
        Address(Self::MIN | ((a1 as u8) << 2) | a0 as u8)
    }

    /// Returns `None` when `byte` is not one of the 16 strap addresses
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            Self::MIN..=Self::MAX => Some(Address(byte)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// The (A0, A1) strapping that yields this address
    #[must_use]
    pub const fn pins(self) -> (SlaveAddressing, SlaveAddressing) {
        (
            SlaveAddressing::from_bits(self.0),
            SlaveAddressing::from_bits(self.0 >> 2),
        )
    }

    /// Every strap address, in ascending order
    pub fn all() -> impl Iterator<Item = Address> {
        (Self::MIN..=Self::MAX).map(Address)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::from_pins(SlaveAddressing::Gnd, SlaveAddressing::Gnd)
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (a0, a1) = self.pins();
        write!(f, "{:#04x} (A0={}, A1={})", self.0, a0, a1)
    }
}
