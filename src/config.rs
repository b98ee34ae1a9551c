//! Attach-time configuration.
//!
//! # Example
//!
//! ```
//! use paz00_gsm::config::{GpioFailurePolicy, GsmConfig};
//!
//! let config = GsmConfig::new("paz00-pm-gsm")
//!     .with_disable_line("gsm_disable")
//!     .with_gpio_failure_policy(GpioFailurePolicy::Fatal);
//! assert_eq!(config.pll_supply, "avdd_usb_pll");
//! ```

use crate::error::Rail;

/// Name the device registers under by default.
pub const DEFAULT_DEVICE_NAME: &str = "paz00-pm-gsm";

/// Supply name of regulator 0.
pub const DEFAULT_PLL_SUPPLY: &str = "avdd_usb_pll";

/// Supply name of regulator 1.
pub const DEFAULT_USB_SUPPLY: &str = "avdd_usb";

/// Label of the disable GPIO.
pub const DEFAULT_DISABLE_LINE: &str = "gsm_disable";

/// What attach does when the disable GPIO cannot be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GpioFailurePolicy {
    /// Abort attach and release both regulators.
    #[default]
    Fatal,
    /// Log a warning and attach without a disable line.
    Tolerate,
}

/// Configuration for attaching a GSM power controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsmConfig {
    /// Device name, also used as the rfkill name.
    pub device_name: String,
    /// Supply name for regulator 0.
    pub pll_supply: String,
    /// Supply name for regulator 1.
    pub usb_supply: String,
    /// Label for the disable GPIO request.
    pub disable_line: String,
    /// Behavior when the disable GPIO is unavailable.
    pub gpio_failure_policy: GpioFailurePolicy,
}

impl Default for GsmConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_NAME)
    }
}

impl GsmConfig {
    /// Create a configuration with the board's default supply and pin names.
    #[must_use]
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            pll_supply: DEFAULT_PLL_SUPPLY.to_owned(),
            usb_supply: DEFAULT_USB_SUPPLY.to_owned(),
            disable_line: DEFAULT_DISABLE_LINE.to_owned(),
            gpio_failure_policy: GpioFailurePolicy::Fatal,
        }
    }

    /// Override both supply names.
    #[must_use]
    pub fn with_supplies(mut self, pll: impl Into<String>, usb: impl Into<String>) -> Self {
        self.pll_supply = pll.into();
        self.usb_supply = usb.into();
        self
    }

    /// Override the disable GPIO label.
    #[must_use]
    pub fn with_disable_line(mut self, label: impl Into<String>) -> Self {
        self.disable_line = label.into();
        self
    }

    /// Set the GPIO failure policy.
    #[must_use]
    pub const fn with_gpio_failure_policy(mut self, policy: GpioFailurePolicy) -> Self {
        self.gpio_failure_policy = policy;
        self
    }

    /// Supply name for a rail.
    #[must_use]
    pub fn supply(&self, rail: Rail) -> &str {
        match rail {
            Rail::UsbPll => &self.pll_supply,
            Rail::Usb => &self.usb_supply,
        }
    }
}
