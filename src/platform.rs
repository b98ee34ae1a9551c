//! Collaborator interfaces.
//!
//! The controller never talks to hardware directly. Regulators, the disable
//! GPIO, the radio-kill framework and the attribute surface are reached
//! through the traits in this module, which the board support code (or
//! [`crate::sim`] in tests) implements.

use crate::attributes::Attribute;
use crate::error::HalError;
use std::fmt;
use std::sync::Arc;

/// Result type returned by collaborators.
pub type HalResult<T> = std::result::Result<T, HalError>;

/// Logic level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Driven to 0.
    Low,
    /// Driven to 1.
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "0"),
            Self::High => write!(f, "1"),
        }
    }
}

/// A controllable supply rail.
pub trait Regulator: Send {
    /// Supply name the regulator was looked up by.
    fn supply(&self) -> &str;

    /// Turn the rail on.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if the rail did not come up.
    fn enable(&mut self) -> HalResult<()>;

    /// Turn the rail off.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if the rail could not be released.
    fn disable(&mut self) -> HalResult<()>;
}

/// A requested digital output pin.
pub trait GpioLine: Send {
    /// Label the pin was requested with.
    fn label(&self) -> &str;

    /// Drive the pin to `level`.
    fn set_level(&mut self, level: Level);
}

/// Radio class tag passed at radio-kill registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioType {
    /// Wireless WAN (GSM/UMTS/LTE modems).
    Wwan,
}

impl fmt::Display for RadioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wwan => write!(f, "wwan"),
        }
    }
}

/// Callback the radio-kill framework invokes when the block state changes.
///
/// There is no error channel: implementations must handle failures
/// themselves.
pub trait RfkillOps: Send + Sync {
    /// The framework wants the radio blocked (`true`) or unblocked.
    fn set_block(&self, blocked: bool);
}

/// An allocated radio-kill object.
pub trait Rfkill: Send {
    /// Set the software-block state reported before registration.
    fn init_sw_state(&mut self, blocked: bool);

    /// Push the current software-block state into the framework.
    ///
    /// Returns the combined (hardware or software) blocked state.
    fn set_sw_state(&mut self, blocked: bool) -> bool;

    /// Make the object visible to the framework.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if registration was refused.
    fn register(&mut self) -> HalResult<()>;

    /// Withdraw a registered object from the framework.
    fn unregister(&mut self);
}

/// Resource provider for one platform device.
///
/// Acquisition and release are paired: every handle obtained from a `*_get`
/// or `*_request` method is handed back through the matching release method.
pub trait Platform {
    /// Look up a regulator by supply name.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if no such supply exists.
    fn regulator_get(&mut self, supply: &str) -> HalResult<Box<dyn Regulator>>;

    /// Release a regulator obtained from [`Platform::regulator_get`].
    fn regulator_put(&mut self, regulator: Box<dyn Regulator>);

    /// Request a GPIO and configure it as an output at `initial`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if the pin is unavailable.
    fn gpio_request_output(&mut self, label: &str, initial: Level)
        -> HalResult<Box<dyn GpioLine>>;

    /// Release a GPIO obtained from [`Platform::gpio_request_output`].
    fn gpio_free(&mut self, line: Box<dyn GpioLine>);

    /// Allocate a radio-kill object bound to `ops`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if allocation failed.
    fn rfkill_alloc(
        &mut self,
        name: &str,
        kind: RadioType,
        ops: Arc<dyn RfkillOps>,
    ) -> HalResult<Box<dyn Rfkill>>;

    /// Free a radio-kill object. It must not be registered.
    fn rfkill_destroy(&mut self, rfkill: Box<dyn Rfkill>);

    /// Publish the attribute group under the device.
    ///
    /// # Errors
    ///
    /// Returns the collaborator failure if the entries could not be created.
    fn attributes_create(&mut self, attributes: &[Attribute]) -> HalResult<()>;

    /// Remove the attribute group.
    fn attributes_remove(&mut self, attributes: &[Attribute]);
}
