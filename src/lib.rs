//! PAZ00 GSM/UMTS modem power control.
//!
//! The modem on the PAZ00 board hangs off two supply rails (`avdd_usb_pll`
//! and `avdd_usb`) and an active-high disable line. This crate sequences
//! those three signals, exposes the result through a radio-kill binding
//! and a small attribute interface, and keeps the modem's state coherent
//! across system suspend/resume.
//!
//! # Architecture
//!
//! | Component | Module |
//! |-----------|--------|
//! | Collaborator traits (regulator, GPIO, rfkill, attributes) | [`platform`] |
//! | Power state controller | [`controller`] |
//! | Radio-kill binding | [`rfkill`] |
//! | Attribute interface | [`attributes`] |
//! | Suspend/resume hook | `pm` (feature `pm`) |
//! | Attach/detach | [`device`] |
//! | Simulated board | [`sim`] |
//!
//! Every state change, whatever its source, goes through
//! [`RadioController::set_power`], which holds the controller lock for the
//! whole transition.
//!
//! # Quick Start
//!
//! ```
//! use paz00_gsm::sim::SimPlatform;
//! use paz00_gsm::{Attribute, GsmConfig, GsmDevice};
//!
//! let mut platform = SimPlatform::new();
//! let device = GsmDevice::attach(&mut platform, GsmConfig::default())?;
//!
//! // rfkill unblock wwan
//! platform.set_block(false);
//! assert_eq!(device.show(Attribute::PowerOn), "1\n");
//!
//! device.detach(&mut platform);
//! # Ok::<(), paz00_gsm::Error>(())
//! ```
//!
//! # Feature Flags
//!
//! - `pm` (default) - suspend/resume hook and the `keep_on_in_suspend` attribute
//!
//! # Error Handling
//!
//! Attach failures are [`Error::ResourceAcquisitionFailed`] and leave
//! nothing behind. Toggle failures are [`Error::RegulatorOperationFailed`]
//! and are returned to attribute writers; the rfkill binding and the
//! suspend hook log them instead, because their callers have no way to
//! report an error. Nothing is retried internally.
//!
//! # Thread Safety
//!
//! [`GsmDevice`] is `Send + Sync`. The rfkill callback, attribute reads and
//! writes, and suspend/resume may run on different threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod attributes;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod platform;
pub mod rfkill;
pub mod sim;

#[cfg(feature = "pm")]
mod pm;

pub use attributes::{Attribute, AttributeMode};
pub use config::{GpioFailurePolicy, GsmConfig};
pub use controller::RadioController;
pub use device::GsmDevice;
pub use error::{Direction, Error, HalError, Rail, Resource, Result};
pub use platform::{GpioLine, Level, Platform, RadioType, Regulator, Rfkill, RfkillOps};
pub use rfkill::RfkillBinding;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
