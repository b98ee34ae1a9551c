//! Control-plane attributes.
//!
//! The modem exposes a small set of named entries under its device:
//!
//! | name | read | write |
//! |------|------|-------|
//! | `power_on` | `1` when powered | non-zero powers on, zero powers off |
//! | `reset` | `1` when held off | non-zero powers off, zero powers on |
//! | `keep_on_in_suspend` | policy flag | sets the policy, no transition |
//!
//! Reads produce `"0\n"` or `"1\n"`. Writes take a decimal integer.
//! Each entry is a variant of [`Attribute`]; the host maps file names to
//! variants once with [`Attribute::from_name`] and dispatches on the enum
//! from then on.

use crate::device::GsmDevice;
use crate::error::{Error, Result};
use bitflags::bitflags;
use std::fmt;
use tracing::{debug, instrument};

bitflags! {
    /// Permission bits of an attribute entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeMode: u16 {
        /// Owner may read.
        const OWNER_READ = 0o400;
        /// Owner may write.
        const OWNER_WRITE = 0o200;
        /// Group may read.
        const GROUP_READ = 0o040;
        /// Others may read.
        const OTHER_READ = 0o004;
        /// `rw-r--r--`.
        const RW_R_R = Self::OWNER_READ.bits()
            | Self::OWNER_WRITE.bits()
            | Self::GROUP_READ.bits()
            | Self::OTHER_READ.bits();
    }
}

/// A named control-plane entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Modem powered.
    PowerOn,
    /// Modem held in reset (inverse of `PowerOn`).
    Reset,
    /// Keep the modem powered through system suspend.
    #[cfg(feature = "pm")]
    KeepOnInSuspend,
}

impl Attribute {
    /// Every attribute published by the device, in creation order.
    #[cfg(feature = "pm")]
    pub const ALL: &'static [Self] = &[Self::PowerOn, Self::Reset, Self::KeepOnInSuspend];

    /// Every attribute published by the device, in creation order.
    #[cfg(not(feature = "pm"))]
    pub const ALL: &'static [Self] = &[Self::PowerOn, Self::Reset];

    /// Entry name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PowerOn => "power_on",
            Self::Reset => "reset",
            #[cfg(feature = "pm")]
            Self::KeepOnInSuspend => "keep_on_in_suspend",
        }
    }

    /// Entry permissions.
    #[must_use]
    pub const fn mode(self) -> AttributeMode {
        AttributeMode::RW_R_R
    }

    /// Look up an attribute by entry name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Parse a written value: a decimal integer, non-zero meaning true.
    ///
    /// Surrounding whitespace (including the trailing newline `echo`
    /// appends) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttributeValue`] if the buffer is not an
    /// unsigned decimal integer.
    pub fn parse(self, buf: &str) -> Result<bool> {
        buf.trim()
            .parse::<u64>()
            .map(|value| value != 0)
            .map_err(|_| Error::invalid_value(self.name(), buf))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format a flag the way every attribute reads back.
#[must_use]
pub fn format_flag(flag: bool) -> String {
    String::from(if flag { "1\n" } else { "0\n" })
}

impl GsmDevice {
    /// Read an attribute.
    #[must_use]
    pub fn show(&self, attribute: Attribute) -> String {
        let radio = self.radio.lock();
        let flag = match attribute {
            Attribute::PowerOn => radio.state,
            Attribute::Reset => !radio.state,
            #[cfg(feature = "pm")]
            Attribute::KeepOnInSuspend => radio.keep_on_in_suspend,
        };
        format_flag(flag)
    }

    /// Write an attribute. Returns the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAttributeValue`] if `buf` is not a decimal integer;
    ///   nothing changes in that case.
    /// - Any error from [`crate::RadioController::set_power`] for `power_on`
    ///   and `reset`.
    #[instrument(level = "debug", skip(self))]
    pub fn store(&self, attribute: Attribute, buf: &str) -> Result<usize> {
        let value = attribute.parse(buf)?;
        debug!(value, "attribute write");
        match attribute {
            Attribute::PowerOn => self.set_power_and_report(value)?,
            // Reset is active-high: holding it means powered off.
            Attribute::Reset => self.radio.set_power(!value)?,
            #[cfg(feature = "pm")]
            Attribute::KeepOnInSuspend => self.radio.set_keep_on_in_suspend(value),
        }
        Ok(buf.len())
    }
}
