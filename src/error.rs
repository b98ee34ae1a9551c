//! Error types for the GSM power controller.
//!
//! Every fallible operation returns [`Result<T>`]. Variants carry enough
//! context (which resource, which rail, which direction) for the caller to
//! decide whether a retry makes sense; nothing in this crate retries on its
//! own, because a half-powered modem must not be left behind automatically.

use std::fmt;
use thiserror::Error;

/// Failure reported by an external collaborator (regulator, GPIO, rfkill or
/// attribute framework).
///
/// Mirrors the negative errno convention of the host platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (errno {errno})")]
pub struct HalError {
    /// Negative errno reported by the collaborator.
    pub errno: i32,
    /// Human-readable description.
    pub message: String,
}

impl HalError {
    /// `ENODEV`: the named resource does not exist.
    pub const ENODEV: i32 = -19;
    /// `ENOMEM`: the collaborator could not allocate.
    pub const ENOMEM: i32 = -12;
    /// `EIO`: the hardware did not accept the request.
    pub const EIO: i32 = -5;
    /// `EBUSY`: the resource is held by someone else.
    pub const EBUSY: i32 = -16;

    /// Create a new collaborator error.
    #[must_use]
    pub fn new(errno: i32, message: impl Into<String>) -> Self {
        Self {
            errno,
            message: message.into(),
        }
    }
}

/// Primary error type for controller operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A resource could not be obtained while attaching the device.
    ///
    /// Everything acquired before the failing step has already been
    /// released when this error is returned.
    #[error("failed to acquire {which}: {source}")]
    ResourceAcquisitionFailed {
        /// The resource that was unavailable.
        which: Resource,
        /// What the collaborator reported.
        #[source]
        source: HalError,
    },

    /// A regulator refused an enable or disable request during a toggle.
    #[error("failed to {direction} regulator {which}: {source}")]
    RegulatorOperationFailed {
        /// The rail that failed.
        which: Rail,
        /// Whether it was being enabled or disabled.
        direction: Direction,
        /// What the regulator reported.
        #[source]
        source: HalError,
    },

    /// A write to an attribute did not contain a decimal integer.
    #[error("invalid value {value:?} for attribute {attribute}")]
    InvalidAttributeValue {
        /// Name of the attribute that was written.
        attribute: &'static str,
        /// The rejected input, as received.
        value: String,
    },

    /// The hardware behind the controller has already been released.
    #[error("radio hardware is not attached")]
    NotAttached,
}

/// Resources acquired while attaching the device, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Regulator feeding the USB PLL (`avdd_usb_pll`).
    PllRegulator,
    /// Regulator feeding the USB block (`avdd_usb`).
    UsbRegulator,
    /// The active-high disable line.
    DisableLine,
    /// The radio-kill object.
    Rfkill,
    /// The attribute group.
    Attributes,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PllRegulator => write!(f, "USB PLL regulator"),
            Self::UsbRegulator => write!(f, "USB regulator"),
            Self::DisableLine => write!(f, "disable GPIO line"),
            Self::Rfkill => write!(f, "rfkill handle"),
            Self::Attributes => write!(f, "attribute group"),
        }
    }
}

/// The two supply rails of the modem, in power-on order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rail {
    /// Index 0, `avdd_usb_pll`.
    UsbPll,
    /// Index 1, `avdd_usb`.
    Usb,
}

impl Rail {
    /// Both rails in power-on order.
    pub const POWER_ON_ORDER: [Self; 2] = [Self::UsbPll, Self::Usb];

    /// Position of the rail in the regulator pair.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::UsbPll => 0,
            Self::Usb => 1,
        }
    }

    /// The resource tag used when acquiring this rail.
    #[must_use]
    pub const fn resource(self) -> Resource {
        match self {
            Self::UsbPll => Resource::PllRegulator,
            Self::Usb => Resource::UsbRegulator,
        }
    }
}

impl fmt::Display for Rail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsbPll => write!(f, "0 (USB PLL)"),
            Self::Usb => write!(f, "1 (USB)"),
        }
    }
}

/// Direction of a regulator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Turning the rail on.
    Enable,
    /// Turning the rail off.
    Disable,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "enable"),
            Self::Disable => write!(f, "disable"),
        }
    }
}

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new `ResourceAcquisitionFailed` error.
    #[must_use]
    pub const fn acquisition(which: Resource, source: HalError) -> Self {
        Self::ResourceAcquisitionFailed { which, source }
    }

    /// Create a new `RegulatorOperationFailed` error.
    #[must_use]
    pub const fn regulator(which: Rail, direction: Direction, source: HalError) -> Self {
        Self::RegulatorOperationFailed {
            which,
            direction,
            source,
        }
    }

    /// Create a new `InvalidAttributeValue` error.
    #[must_use]
    pub fn invalid_value(attribute: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidAttributeValue {
            attribute,
            value: value.into(),
        }
    }

    /// Check if this error was raised while attaching.
    #[must_use]
    pub const fn is_acquisition_failure(&self) -> bool {
        matches!(self, Self::ResourceAcquisitionFailed { .. })
    }

    /// Check if this error came from a regulator during a toggle.
    #[must_use]
    pub const fn is_regulator_failure(&self) -> bool {
        matches!(self, Self::RegulatorOperationFailed { .. })
    }

    /// The resource that failed to attach, if any.
    #[must_use]
    pub const fn resource(&self) -> Option<Resource> {
        match self {
            Self::ResourceAcquisitionFailed { which, .. } => Some(*which),
            _ => None,
        }
    }

    /// Get the collaborator errno, if the error wraps one.
    #[must_use]
    pub const fn errno(&self) -> Option<i32> {
        match self {
            Self::ResourceAcquisitionFailed { source, .. }
            | Self::RegulatorOperationFailed { source, .. } => Some(source.errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
        assert_std_error::<HalError>();
    }

    #[test]
    fn test_acquisition_message_names_resource() {
        let err = Error::acquisition(
            Resource::UsbRegulator,
            HalError::new(HalError::ENODEV, "no such supply"),
        );
        let msg = err.to_string();
        assert!(msg.contains("USB regulator"));
        assert!(msg.contains("no such supply"));
        assert!(msg.contains("-19"));
    }

    #[test]
    fn test_regulator_message_names_rail_and_direction() {
        let err = Error::regulator(
            Rail::UsbPll,
            Direction::Disable,
            HalError::new(HalError::EIO, "stuck"),
        );
        assert_eq!(
            err.to_string(),
            "failed to disable regulator 0 (USB PLL): stuck (errno -5)"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = Error::regulator(Rail::Usb, Direction::Enable, HalError::new(-5, "io"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("io (errno -5)"));
        assert!(Error::NotAttached.source().is_none());
    }

    #[test]
    fn test_display_impl_not_generic() {
        let errors = vec![
            Error::acquisition(Resource::Rfkill, HalError::new(HalError::ENOMEM, "oom")),
            Error::regulator(Rail::Usb, Direction::Enable, HalError::new(-5, "io")),
            Error::invalid_value("power_on", "yes"),
            Error::NotAttached,
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(msg.len() > 10, "Message too short: {msg}");
        }
    }

    #[test]
    fn test_predicates() {
        let acq = Error::acquisition(Resource::DisableLine, HalError::new(-16, "busy"));
        assert!(acq.is_acquisition_failure());
        assert!(!acq.is_regulator_failure());
        assert_eq!(acq.resource(), Some(Resource::DisableLine));
        assert_eq!(acq.errno(), Some(HalError::EBUSY));

        let reg = Error::regulator(Rail::UsbPll, Direction::Enable, HalError::new(-5, "io"));
        assert!(reg.is_regulator_failure());
        assert_eq!(reg.resource(), None);

        assert_eq!(Error::invalid_value("reset", "x").errno(), None);
    }

    #[test]
    fn test_rail_order_and_index() {
        assert_eq!(Rail::POWER_ON_ORDER, [Rail::UsbPll, Rail::Usb]);
        assert_eq!(Rail::UsbPll.index(), 0);
        assert_eq!(Rail::Usb.index(), 1);
        assert_eq!(Rail::Usb.resource(), Resource::UsbRegulator);
    }
}
