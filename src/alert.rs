//! Alert functions of the mask/enable register and their dispatch

use core::fmt::Display;

/// Function that drives the ALERT pin
///
/// Also the code passed to the alert handler. Bits 15..11 of the mask/enable
/// register, in the chip's own priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alert {
    ShuntOverVoltage = 1 << 15,
    ShuntUnderVoltage = 1 << 14,
    BusOverVoltage = 1 << 13,
    BusUnderVoltage = 1 << 12,
    PowerOverLimit = 1 << 11,
}

impl Alert {
    /// All functions, highest priority first
    pub const PRIORITY: [Alert; 5] = [
        Alert::ShuntOverVoltage,
        Alert::ShuntUnderVoltage,
        Alert::BusOverVoltage,
        Alert::BusUnderVoltage,
        Alert::PowerOverLimit,
    ];

    /// Union of the five function enable bits
    pub const FUNCTION_BITS: u16 = 0xF800;

    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// The highest priority function enabled in a mask/enable register value
    pub fn from_mask_enable(bits: u16) -> Option<Alert> {
        Alert::PRIORITY
            .into_iter()
            .find(|alert| bits & alert.bits() != 0)
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Alert::ShuntOverVoltage => write!(f, "shunt voltage over voltage"),
            Alert::ShuntUnderVoltage => write!(f, "shunt voltage under voltage"),
            Alert::BusOverVoltage => write!(f, "bus voltage over voltage"),
            Alert::BusUnderVoltage => write!(f, "bus voltage under voltage"),
            Alert::PowerOverLimit => write!(f, "power over limit"),
        }
    }
}

/// Callback invoked with the alert that fired
pub type AlertHandler = fn(Alert);

/// Whether a handler call is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    #[default]
    Idle,
    Dispatched(Alert),
}

/// Routes mask/enable reads to the registered handler
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertDispatcher {
    handler: Option<AlertHandler>,
    state: DispatchState,
}

impl AlertDispatcher {
    pub const fn new(handler: Option<AlertHandler>) -> Self {
        AlertDispatcher {
            handler,
            state: DispatchState::Idle,
        }
    }

    pub fn set_handler(&mut self, handler: Option<AlertHandler>) {
        self.handler = handler;
    }

    pub const fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub const fn state(&self) -> DispatchState {
        self.state
    }

    /// Hand the highest priority enabled function in `mask_enable` to the handler
    ///
    /// Returns the alert that was selected, whether or not a handler ran. A
    /// missing handler is logged and otherwise ignored.
    pub fn dispatch(&mut self, mask_enable: u16) -> Option<Alert> {
        let alert = Alert::from_mask_enable(mask_enable)?;
        match self.handler {
            Some(handler) => {
                self.state = DispatchState::Dispatched(alert);
                trace!("dispatching alert {}", alert);
                handler(alert);
                self.state = DispatchState::Idle;
            }
            None => warn!("alert {} raised without a handler", alert),
        }
        Some(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use pretty_assertions::assert_eq;
    use std::vec::Vec;

    std::thread_local! {
        static SEEN: RefCell<Vec<Alert>> = const { RefCell::new(Vec::new()) };
    }

    fn record(alert: Alert) {
        SEEN.with(|seen| seen.borrow_mut().push(alert));
    }

    fn take_seen() -> Vec<Alert> {
        SEEN.with(|seen| seen.take())
    }

    #[test]
    fn function_bits_cover_priority_list() {
        let union = Alert::PRIORITY.iter().fold(0, |acc, a| acc | a.bits());
        assert_eq!(union, Alert::FUNCTION_BITS);
    }

    #[test]
    fn bus_over_voltage_only() {
        let mut dispatcher = AlertDispatcher::new(Some(record));
        let fired = dispatcher.dispatch(Alert::BusOverVoltage.bits());

        assert_eq!(fired, Some(Alert::BusOverVoltage));
        assert_eq!(take_seen(), [Alert::BusOverVoltage]);
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[test]
    fn first_match_wins() {
        let mut dispatcher = AlertDispatcher::new(Some(record));
        let status = Alert::PowerOverLimit.bits() | Alert::ShuntUnderVoltage.bits() | 0x0018;
        assert_eq!(dispatcher.dispatch(status), Some(Alert::ShuntUnderVoltage));
        assert_eq!(take_seen(), [Alert::ShuntUnderVoltage]);
    }

    #[test]
    fn flags_alone_do_not_dispatch() {
        let mut dispatcher = AlertDispatcher::new(Some(record));
        assert_eq!(dispatcher.dispatch(0x041F), None);
        assert!(take_seen().is_empty());
    }

    #[test]
    fn missing_handler_is_not_an_error() {
        let mut dispatcher = AlertDispatcher::default();
        assert!(!dispatcher.has_handler());
        assert_eq!(
            dispatcher.dispatch(Alert::PowerOverLimit.bits()),
            Some(Alert::PowerOverLimit)
        );
        assert!(take_seen().is_empty());
    }
}
