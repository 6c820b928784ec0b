//! Driver for the TI INA226 current, voltage and power monitor
//!
//! The driver owns an [`embedded-hal`] I2C bus and delay. A freshly created
//! [`Ina226`] is `NonOperational`: set the shunt resistance, optionally
//! register an alert handler, then [`init`](Ina226::init) it to obtain the
//! `Operational` device that can be configured, calibrated and read.
//!
//! The register encodings and the calibration arithmetic are usable on their
//! own through [`codec`] and [`calibration`].
//!
//! With the `async` feature the same API is generated over
//! [`embedded-hal-async`].
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/1
//! [`embedded-hal-async`]: https://docs.rs/embedded-hal-async/1
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod address;
pub mod alert;
pub mod calibration;
pub mod codec;
pub mod context;
pub mod error;
pub mod register;
pub mod settings;


use byteorder::{BigEndian, ByteOrder};
use core::marker::PhantomData;

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

pub use address::{Address, SlaveAddressing};
pub use alert::{Alert, AlertHandler, DispatchState};
pub use calibration::{Calibration, ConfigurationError};
pub use codec::RangeError;
pub use context::{Context, ContextError};
pub use error::{Error, InitializationError};
pub use register::{AlertPolarity, Average, Configuration, ConversionTime, Flags, Mode};
pub use settings::{AlertSettings, Settings};

use alert::AlertDispatcher;
use register::{MaskEnable, Register, DIE_ID, FLAG_BITS, MANUFACTURER_ID, RESET_BIT};

/// Static description of the chip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipInfo {
    pub chip_name: &'static str,
    pub manufacturer: &'static str,
    pub interface: &'static str,
    pub supply_voltage_min: f32,
    pub supply_voltage_max: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub driver_version: &'static str,
}

pub const INFO: ChipInfo = ChipInfo {
    chip_name: "Texas Instruments INA226",
    manufacturer: "Texas Instruments",
    interface: "I2C",
    supply_voltage_min: 2.7,
    supply_voltage_max: 5.5,
    temperature_min: -40.0,
    temperature_max: 125.0,
    driver_version: env!("CARGO_PKG_VERSION"),
};

/// A raw register value together with its value in physical units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading<T> {
    pub raw: T,
    pub value: f64,
}

/// Bus voltage (mV), current (mA) and power (mW) read back to back
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurements {
    pub bus_voltage: Reading<u16>,
    pub current: Reading<i16>,
    pub power: Reading<u16>,
}

pub struct Operational;
pub struct NonOperational;

pub struct Ina226<I2C, D, State = NonOperational> {
    i2c: I2C,
    delay: D,
    address: Address,
    context: Context,
    configuration: Configuration,
    mask_enable: u16,
    dispatcher: AlertDispatcher,
    state: PhantomData<State>,
}

const fn with_bit(bits: u16, mask: u16, enable: bool) -> u16 {
    if enable {
        bits | mask
    } else {
        bits & !mask
    }
}

impl<I2C, D> Ina226<I2C, D, NonOperational> {
    pub fn new(i2c: I2C, delay: D, address: Address) -> Self {
        Ina226 {
            i2c,
            delay,
            address,
            context: Context::new(),
            configuration: Configuration::default(),
            mask_enable: 0,
            dispatcher: AlertDispatcher::new(None),
            state: PhantomData,
        }
    }

    #[must_use]
    pub fn with_alert_handler(mut self, handler: AlertHandler) -> Self {
        self.dispatcher.set_handler(Some(handler));
        self
    }

    pub fn set_address(&mut self, address: Address) -> &mut Self {
        self.address = address;
        self
    }
}

impl<I2C, D, State> Ina226<I2C, D, State> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn set_alert_handler(&mut self, handler: Option<AlertHandler>) -> &mut Self {
        self.dispatcher.set_handler(handler);
        self
    }

    /// Set the shunt resistance in ohms
    ///
    /// Drops any calibration: on an operational device call
    /// [`calibrate`](Ina226::calibrate) again before reading current or power.
    ///
    /// # Errors
    /// `InvalidResistance` unless `ohms` is finite and positive.
    pub fn set_resistance(&mut self, ohms: f64) -> Result<&mut Self, ConfigurationError> {
        self.context.set_resistance(ohms)?;
        Ok(self)
    }

    pub fn resistance(&self) -> Option<f64> {
        self.context.resistance()
    }

    /// Override the maximum expected current (A) used to size the current LSB
    ///
    /// # Errors
    /// `InvalidMaxCurrent` unless `amps` is finite and positive.
    pub fn set_max_current(&mut self, amps: f64) -> Result<&mut Self, ConfigurationError> {
        self.context.set_max_current(amps)?;
        Ok(self)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Hand back the bus and delay without touching the chip
    pub fn destroy(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn into_state<S>(self) -> Ina226<I2C, D, S> {
        Ina226 {
            i2c: self.i2c,
            delay: self.delay,
            address: self.address,
            context: self.context,
            configuration: self.configuration,
            mask_enable: self.mask_enable,
            dispatcher: self.dispatcher,
            state: PhantomData,
        }
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Ina226",),
    async(feature = "async", keep_self)
)]
impl<I2C, D, E, State> Ina226<I2C, D, State>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    async fn read_register(&mut self, register: Register) -> Result<u16, Error<E>> {
        let mut rx_buffer: [u8; 2] = [0; 2];
        self.i2c
            .write_read(self.address.as_byte(), &[register.addr()], &mut rx_buffer)
            .await
            .map_err(Error::Transport)?;
        Ok(BigEndian::read_u16(&rx_buffer))
    }

    async fn write_register(&mut self, register: Register, value: u16) -> Result<(), Error<E>> {
        let mut tx_buffer: [u8; 3] = [register.addr(), 0, 0];
        BigEndian::write_u16(&mut tx_buffer[1..], value);
        self.i2c
            .write(self.address.as_byte(), &tx_buffer)
            .await
            .map_err(Error::Transport)
    }

    /// Contents of the manufacturer ID register, `0x5449` on a genuine part
    pub async fn manufacturer_id(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::Manufacturer).await
    }

    /// Device ID (bits 15..4) and die revision (bits 3..0)
    pub async fn die_id(&mut self) -> Result<(u16, u8), Error<E>> {
        let die = self.read_register(Register::DieId).await?;
        Ok((die >> 4, (die & 0x000F) as u8))
    }

    pub async fn power_down(&mut self) -> Result<(), Error<E>> {
        let configuration = self.configuration.with_mode(Mode::PowerDown);
        self.write_register(Register::Configuration, configuration.bits())
            .await?;
        self.configuration = configuration;
        Ok(())
    }

    /// Power the chip down (best effort) and hand back the bus and delay
    pub async fn release(mut self) -> (I2C, D) {
        if self.power_down().await.is_err() {
            warn!("power down on release did not complete");
        }
        self.destroy()
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Ina226",),
    async(feature = "async", keep_self)
)]
impl<I2C, D, E> Ina226<I2C, D, NonOperational>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Check the manufacturer and device IDs at the configured address
    pub async fn verify_hardware(&mut self) -> Result<(), Error<E>> {
        let manufacturer = self.manufacturer_id().await?;
        if manufacturer != MANUFACTURER_ID {
            return Err(Error::InvalidManufacturer(manufacturer));
        }
        let die = self.read_register(Register::DieId).await?;
        if die & 0xFFF0 != DIE_ID & 0xFFF0 {
            return Err(Error::InvalidDie(die));
        }
        Ok(())
    }

    /// Probe every strap address and keep the first one an INA226 answers on
    ///
    /// The previous address is restored when nothing is found.
    pub async fn search_address(&mut self) -> Result<Address, Error<E>> {
        let previous = self.address;
        for address in Address::all() {
            self.address = address;
            if self.verify_hardware().await.is_ok() {
                debug!("INA226 found at {:#x}", address.as_byte());
                return Ok(address);
            }
        }
        self.address = previous;
        Err(Error::NotFound)
    }

    /// Verify the chip, reset it and load the configuration shadow
    ///
    /// # Errors
    /// On failure the device is returned inside the error. A failure after
    /// identification also attempts to power the chip down.
    pub async fn init(
        mut self,
    ) -> Result<Ina226<I2C, D, Operational>, InitializationError<Self, E>> {
        let identified = self.verify_hardware().await;
        if let Err(error) = identified {
            error!("no INA226 at {:#x}", self.address.as_byte());
            return Err(InitializationError {
                device: self,
                error,
            });
        }
        match self.bring_up().await {
            Ok(()) => {
                info!("INA226 at {:#x} initialized", self.address.as_byte());
                Ok(self.into_state())
            }
            Err(error) => {
                error!("INA226 at {:#x} failed to initialize", self.address.as_byte());
                if self.power_down().await.is_err() {
                    warn!("power down after failed initialization did not complete");
                }
                Err(InitializationError {
                    device: self,
                    error,
                })
            }
        }
    }

    async fn bring_up(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::Configuration, RESET_BIT)
            .await?;
        self.delay.delay_ms(1).await;
        let configuration = self.read_register(Register::Configuration).await?;
        self.configuration = Configuration(configuration);
        self.mask_enable = 0;
        self.context.invalidate();
        Ok(())
    }
}

impl<I2C, D> Ina226<I2C, D, Operational> {
    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    pub fn average(&self) -> Average {
        self.configuration.average()
    }

    pub fn bus_conversion_time(&self) -> ConversionTime {
        self.configuration.bus_conversion_time()
    }

    pub fn shunt_conversion_time(&self) -> ConversionTime {
        self.configuration.shunt_conversion_time()
    }

    pub fn mode(&self) -> Mode {
        self.configuration.mode()
    }

    /// Whether `alert` is enabled in the mask/enable shadow
    pub fn mask(&self, alert: Alert) -> bool {
        self.mask_enable & alert.bits() != 0
    }

    pub fn conversion_ready_alert_pin(&self) -> bool {
        self.mask_enable & MaskEnable::ConversionReady.bits() != 0
    }

    pub fn alert_polarity(&self) -> AlertPolarity {
        if self.mask_enable & MaskEnable::AlertPolarityBit.bits() != 0 {
            AlertPolarity::Inverted
        } else {
            AlertPolarity::Normal
        }
    }

    pub fn alert_latch(&self) -> bool {
        self.mask_enable & MaskEnable::AlertLatchEnable.bits() != 0
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Calibration for the configured shunt, without writing it
    ///
    /// # Errors
    /// See [`Context::calculate`].
    pub fn calculate_calibration(&self) -> Result<Calibration, ConfigurationError> {
        self.context.calculate()
    }

    /// The calibration the chip was last given through this driver
    pub fn calibration(&self) -> Option<Calibration> {
        self.context.calibration()
    }

    /// # Errors
    /// `RangeError` outside the ±81.92 mV shunt range.
    pub fn shunt_voltage_to_register(&self, millivolts: f64) -> Result<i16, RangeError> {
        codec::data_to_shunt_voltage_register(millivolts)
    }

    pub fn shunt_voltage_to_data(&self, raw: i16) -> f64 {
        codec::shunt_voltage_to_data(raw)
    }

    /// # Errors
    /// `RangeError` for negative or too large voltages.
    pub fn bus_voltage_to_register(&self, millivolts: f64) -> Result<u16, RangeError> {
        codec::data_to_bus_voltage_register(millivolts)
    }

    pub fn bus_voltage_to_data(&self, raw: u16) -> f64 {
        codec::bus_voltage_to_data(raw)
    }

    /// # Errors
    /// See [`Context::data_to_current_register`].
    pub fn current_to_register(&self, milliamps: f64) -> Result<i16, ContextError> {
        self.context.data_to_current_register(milliamps)
    }

    /// # Errors
    /// `NotCalibrated` before a calibration was applied.
    pub fn current_to_data(&self, raw: i16) -> Result<f64, ConfigurationError> {
        self.context.current_to_data(raw)
    }

    /// # Errors
    /// See [`Context::data_to_power_register`].
    pub fn power_to_register(&self, milliwatts: f64) -> Result<u16, ContextError> {
        self.context.data_to_power_register(milliwatts)
    }

    /// # Errors
    /// `NotCalibrated` before a calibration was applied.
    pub fn power_to_data(&self, raw: u16) -> Result<f64, ConfigurationError> {
        self.context.power_to_data(raw)
    }

    /// Encode `threshold` for the alert limit register of `alert`
    ///
    /// Shunt and bus thresholds are in mV, the power threshold in mW.
    ///
    /// # Errors
    /// `Range` when the threshold does not fit, `Configuration` for a power
    /// threshold on an uncalibrated device.
    pub fn alert_limit_for(&self, alert: Alert, threshold: f64) -> Result<u16, ContextError> {
        match alert {
            Alert::ShuntOverVoltage | Alert::ShuntUnderVoltage => {
                let raw = codec::data_to_shunt_voltage_register(threshold)?;
                Ok(raw as u16)
            }
            Alert::BusOverVoltage | Alert::BusUnderVoltage => {
                Ok(codec::data_to_bus_voltage_register(threshold)?)
            }
            Alert::PowerOverLimit => self.context.data_to_power_register(threshold),
        }
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Ina226",),
    async(feature = "async", keep_self)
)]
impl<I2C, D, E> Ina226<I2C, D, Operational>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    async fn write_configuration(&mut self, configuration: Configuration) -> Result<(), Error<E>> {
        self.write_register(Register::Configuration, configuration.bits())
            .await?;
        self.configuration = configuration;
        Ok(())
    }

    async fn write_mask_enable(&mut self, bits: u16) -> Result<(), Error<E>> {
        let bits = bits & !FLAG_BITS;
        self.write_register(Register::MaskEnable, bits).await?;
        self.mask_enable = bits;
        Ok(())
    }

    pub async fn set_average(&mut self, value: Average) -> Result<(), Error<E>> {
        self.write_configuration(self.configuration.with_average(value))
            .await
    }

    pub async fn set_bus_conversion_time(&mut self, value: ConversionTime) -> Result<(), Error<E>> {
        self.write_configuration(self.configuration.with_bus_conversion_time(value))
            .await
    }

    pub async fn set_shunt_conversion_time(
        &mut self,
        value: ConversionTime,
    ) -> Result<(), Error<E>> {
        self.write_configuration(self.configuration.with_shunt_conversion_time(value))
            .await
    }

    /// Writing a triggered mode starts one conversion, even if it is already set
    pub async fn set_mode(&mut self, value: Mode) -> Result<(), Error<E>> {
        self.write_configuration(self.configuration.with_mode(value))
            .await
    }

    /// Read the configuration register and refresh the shadow from it
    pub async fn read_configuration(&mut self) -> Result<Configuration, Error<E>> {
        let configuration = Configuration(self.read_register(Register::Configuration).await?);
        self.configuration = configuration;
        Ok(configuration)
    }

    /// Reset every register to its power-on value
    ///
    /// The calibration register is cleared by the reset, so the stored
    /// calibration is dropped as well.
    pub async fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::Configuration, RESET_BIT)
            .await?;
        self.delay.delay_ms(1).await;
        self.configuration = Configuration::default();
        self.mask_enable = 0;
        self.context.invalidate();
        Ok(())
    }

    /// Compute the calibration for the configured shunt and write it
    pub async fn calibrate(&mut self) -> Result<Calibration, Error<E>> {
        let calibration = self.context.calculate()?;
        self.write_register(Register::Calibration, calibration.register())
            .await?;
        self.context.store(calibration);
        if calibration.uses_reserved_bit() {
            warn!("calibration {} needs bit 15, which the chip ignores", calibration.register());
        }
        debug!(
            "calibration {} (current LSB {} A)",
            calibration.register(),
            calibration.current_lsb()
        );
        Ok(calibration)
    }

    /// Write a raw calibration value and derive the LSBs from it
    ///
    /// The chip ignores bit 15, so `register` should stay below 0x8000 for the
    /// derived LSBs to match the hardware.
    pub async fn set_calibration(&mut self, register: u16) -> Result<Calibration, Error<E>> {
        let resistance = self
            .context
            .resistance()
            .ok_or(ConfigurationError::MissingResistance)?;
        let calibration = Calibration::from_register(register, resistance)?;
        self.write_register(Register::Calibration, register).await?;
        self.context.store(calibration);
        if calibration.uses_reserved_bit() {
            warn!("calibration {} needs bit 15, which the chip ignores", register);
        }
        Ok(calibration)
    }

    pub async fn read_calibration(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::Calibration).await
    }

    /// Enable or disable one alert function, leaving the others alone
    pub async fn set_mask(&mut self, alert: Alert, enable: bool) -> Result<(), Error<E>> {
        self.write_mask_enable(with_bit(self.mask_enable, alert.bits(), enable))
            .await
    }

    /// Program the limit for `alert` and make it the only enabled function
    pub async fn enable_alert(&mut self, alert: Alert, threshold: f64) -> Result<(), Error<E>> {
        let limit = self.alert_limit_for(alert, threshold)?;
        self.set_alert_limit(limit).await?;
        let bits = (self.mask_enable & !Alert::FUNCTION_BITS) | alert.bits();
        self.write_mask_enable(bits).await
    }

    pub async fn disable_alerts(&mut self) -> Result<(), Error<E>> {
        self.write_mask_enable(self.mask_enable & !Alert::FUNCTION_BITS)
            .await
    }

    /// Also assert the ALERT pin when a conversion completes
    pub async fn set_conversion_ready_alert_pin(&mut self, enable: bool) -> Result<(), Error<E>> {
        let bits = with_bit(self.mask_enable, MaskEnable::ConversionReady.bits(), enable);
        self.write_mask_enable(bits).await
    }

    pub async fn set_alert_polarity(&mut self, polarity: AlertPolarity) -> Result<(), Error<E>> {
        let inverted = polarity == AlertPolarity::Inverted;
        let bits = with_bit(self.mask_enable, MaskEnable::AlertPolarityBit.bits(), inverted);
        self.write_mask_enable(bits).await
    }

    /// Keep the ALERT pin asserted until the mask/enable register is read
    pub async fn set_alert_latch(&mut self, enable: bool) -> Result<(), Error<E>> {
        let bits = with_bit(self.mask_enable, MaskEnable::AlertLatchEnable.bits(), enable);
        self.write_mask_enable(bits).await
    }

    pub async fn set_alert_limit(&mut self, limit: u16) -> Result<(), Error<E>> {
        self.write_register(Register::AlertLimit, limit).await
    }

    pub async fn read_alert_limit(&mut self) -> Result<u16, Error<E>> {
        self.read_register(Register::AlertLimit).await
    }

    async fn read_mask_enable(&mut self) -> Result<u16, Error<E>> {
        let bits = self.read_register(Register::MaskEnable).await?;
        self.mask_enable = bits & !FLAG_BITS;
        Ok(bits)
    }

    /// Read and thereby clear the status flags
    pub async fn read_flags(&mut self) -> Result<Flags, Error<E>> {
        let flags = Flags::from_bits(self.read_mask_enable().await?);
        trace!("flags {}", flags);
        Ok(flags)
    }

    pub async fn read_shunt_voltage(&mut self) -> Result<Reading<i16>, Error<E>> {
        let raw = self.read_register(Register::ShuntVoltage).await? as i16;
        Ok(Reading {
            raw,
            value: codec::shunt_voltage_to_data(raw),
        })
    }

    pub async fn read_bus_voltage(&mut self) -> Result<Reading<u16>, Error<E>> {
        let raw = self.read_register(Register::BusVoltage).await?;
        Ok(Reading {
            raw,
            value: codec::bus_voltage_to_data(raw),
        })
    }

    pub async fn read_current(&mut self) -> Result<Reading<i16>, Error<E>> {
        let current_lsb = self
            .context
            .current_lsb()
            .ok_or(ConfigurationError::NotCalibrated)?;
        let raw = self.read_register(Register::Current).await? as i16;
        Ok(Reading {
            raw,
            value: codec::current_to_data(raw, current_lsb),
        })
    }

    pub async fn read_power(&mut self) -> Result<Reading<u16>, Error<E>> {
        let power_lsb = self
            .context
            .power_lsb()
            .ok_or(ConfigurationError::NotCalibrated)?;
        let raw = self.read_register(Register::Power).await?;
        Ok(Reading {
            raw,
            value: codec::power_to_data(raw, power_lsb),
        })
    }

    pub async fn read_measurements(&mut self) -> Result<Measurements, Error<E>> {
        let bus_voltage = self.read_bus_voltage().await?;
        let current = self.read_current().await?;
        let power = self.read_power().await?;
        Ok(Measurements {
            bus_voltage,
            current,
            power,
        })
    }

    /// Trigger one shunt and bus conversion and read its results
    ///
    /// Polls the conversion ready flag once per millisecond for one conversion
    /// period plus a millisecond. Every poll reads the mask/enable register,
    /// which also clears a latched alert function flag.
    pub async fn single_shot(&mut self) -> Result<Measurements, Error<E>> {
        if self.context.calibration().is_none() {
            return Err(ConfigurationError::NotCalibrated.into());
        }
        let configuration = self.configuration.with_mode(Mode::ShuntAndBusTriggered);
        self.write_configuration(configuration).await?;

        let budget_ms = configuration.conversion_period_us().div_ceil(1000) + 1;
        for _ in 0..budget_ms {
            if self.read_flags().await?.conversion_ready {
                return self.read_measurements().await;
            }
            self.delay.delay_ms(1).await;
        }
        warn!("conversion not ready after {} ms", budget_ms);
        Err(Error::Timeout)
    }

    /// Apply `settings` and the calibration for the configured shunt
    ///
    /// On failure the chip is powered down before the error is returned.
    pub async fn configure(&mut self, settings: &Settings) -> Result<Calibration, Error<E>> {
        match self.apply_settings(settings).await {
            Ok(calibration) => Ok(calibration),
            Err(error) => Err(self.abort(error).await),
        }
    }

    /// Apply measurement settings, calibration, alert pin behaviour, the alert
    /// limit and enable exactly one alert function
    ///
    /// On failure the chip is powered down before the error is returned.
    pub async fn configure_alert(
        &mut self,
        settings: &AlertSettings,
    ) -> Result<Calibration, Error<E>> {
        match self.apply_alert_settings(settings).await {
            Ok(calibration) => Ok(calibration),
            Err(error) => Err(self.abort(error).await),
        }
    }

    async fn apply_settings(&mut self, settings: &Settings) -> Result<Calibration, Error<E>> {
        let configuration = self
            .configuration
            .with_average(settings.average)
            .with_bus_conversion_time(settings.bus_conversion_time)
            .with_shunt_conversion_time(settings.shunt_conversion_time)
            .with_mode(settings.mode);
        let calibration = self.calibrate().await?;
        self.write_configuration(configuration).await?;
        Ok(calibration)
    }

    async fn apply_alert_settings(
        &mut self,
        settings: &AlertSettings,
    ) -> Result<Calibration, Error<E>> {
        let calibration = self.apply_settings(&settings.measurement).await?;
        let limit = self.alert_limit_for(settings.alert, settings.threshold)?;

        let mut bits = with_bit(
            self.mask_enable,
            MaskEnable::ConversionReady.bits(),
            settings.conversion_ready_pin,
        );
        bits = with_bit(
            bits,
            MaskEnable::AlertPolarityBit.bits(),
            settings.polarity == AlertPolarity::Inverted,
        );
        bits = with_bit(bits, MaskEnable::AlertLatchEnable.bits(), settings.latch);
        bits = (bits & !Alert::FUNCTION_BITS) | settings.alert.bits();

        self.set_alert_limit(limit).await?;
        self.write_mask_enable(bits).await?;
        Ok(calibration)
    }

    async fn abort(&mut self, error: Error<E>) -> Error<E> {
        error!("configuration failed, powering down");
        if self.power_down().await.is_err() {
            warn!("power down after failed configuration did not complete");
        }
        error
    }

    /// Service the ALERT interrupt
    ///
    /// Reads the mask/enable register and hands the highest priority enabled
    /// function to the alert handler. Without a handler the alert is only
    /// logged.
    ///
    /// When the conversion ready pin is enabled the ALERT pin also fires after
    /// every conversion; the handler then only runs if the alert function
    /// flag is set.
    pub async fn irq_handler(&mut self) -> Result<Option<Alert>, Error<E>> {
        let bits = self.read_mask_enable().await?;
        let conversion_ready_pin = bits & MaskEnable::ConversionReady.bits() != 0;
        if conversion_ready_pin && !Flags::from_bits(bits).alert_function {
            trace!("conversion ready interrupt");
            return Ok(None);
        }
        Ok(self.dispatcher.dispatch(bits))
    }

    /// Poll the alert function flag once per millisecond for up to
    /// `timeout_ms`, dispatching when it is raised
    pub async fn wait_for_alert(&mut self, timeout_ms: u32) -> Result<Alert, Error<E>> {
        for _ in 0..timeout_ms {
            let bits = self.read_mask_enable().await?;
            if Flags::from_bits(bits).alert_function {
                if let Some(alert) = self.dispatcher.dispatch(bits) {
                    return Ok(alert);
                }
            }
            self.delay.delay_ms(1).await;
        }
        warn!("no alert within {} ms", timeout_ms);
        Err(Error::Timeout)
    }
}
