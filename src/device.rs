//! Device lifecycle.
//!
//! [`GsmDevice::attach`] acquires, in order: regulator 0, regulator 1, the
//! disable GPIO (driven high so the modem starts disabled), the radio-kill
//! object, and the attribute group. Any failure releases what was already
//! taken, disable line first and then the regulators newest first.
//! [`GsmDevice::detach`] removes the attributes, powers the modem down,
//! withdraws the radio-kill object and hands the rails and GPIO back.
//!
//! # Example
//!
//! ```
//! use paz00_gsm::sim::SimPlatform;
//! use paz00_gsm::{Attribute, GsmConfig, GsmDevice};
//!
//! let mut platform = SimPlatform::new();
//! let device = GsmDevice::attach(&mut platform, GsmConfig::default())?;
//!
//! device.store(Attribute::PowerOn, "1\n")?;
//! assert_eq!(device.show(Attribute::Reset), "0\n");
//!
//! device.detach(&mut platform);
//! assert_eq!(platform.outstanding(), 0);
//! # Ok::<(), paz00_gsm::Error>(())
//! ```

use crate::attributes::Attribute;
use crate::config::{GpioFailurePolicy, GsmConfig};
use crate::controller::{Hardware, RadioController};
use crate::error::{Error, Rail, Resource, Result};
use crate::platform::{Level, Platform, RadioType, Rfkill};
use crate::rfkill::RfkillBinding;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, instrument, warn};

/// An attached GSM modem power controller.
///
/// There is no implicit global instance: the board code owns the value
/// returned by [`GsmDevice::attach`] and must pass it back to
/// [`GsmDevice::detach`]. Dropping it without detaching leaks the platform
/// resources and leaves the modem in whatever state it was in.
pub struct GsmDevice {
    config: GsmConfig,
    pub(crate) radio: Arc<RadioController>,
    rfkill: Mutex<Option<Box<dyn Rfkill>>>,
}

impl fmt::Debug for GsmDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GsmDevice")
            .field("name", &self.config.device_name)
            .field("radio", &self.radio)
            .finish_non_exhaustive()
    }
}

impl GsmDevice {
    /// Acquire every resource and publish the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceAcquisitionFailed`] naming the first
    /// resource that could not be obtained. Everything acquired before it
    /// has been released by the time this returns. A missing disable GPIO
    /// is only an error under [`GpioFailurePolicy::Fatal`].
    #[instrument(level = "debug", skip_all, fields(device = %config.device_name))]
    pub fn attach<P: Platform + ?Sized>(platform: &mut P, config: GsmConfig) -> Result<Self> {
        let pll = platform
            .regulator_get(config.supply(Rail::UsbPll))
            .map_err(|e| {
                error!(supply = config.supply(Rail::UsbPll), "unable to get regulator for usb pll");
                Error::acquisition(Resource::PllRegulator, e)
            })?;

        let usb = match platform.regulator_get(config.supply(Rail::Usb)) {
            Ok(usb) => usb,
            Err(e) => {
                error!(supply = config.supply(Rail::Usb), "unable to get regulator for usb");
                platform.regulator_put(pll);
                return Err(Error::acquisition(Resource::UsbRegulator, e));
            }
        };

        let disable_line = match platform.gpio_request_output(&config.disable_line, Level::High) {
            Ok(line) => Some(line),
            Err(e) => match config.gpio_failure_policy {
                GpioFailurePolicy::Fatal => {
                    error!(label = %config.disable_line, err = %e, "unable to request disable line");
                    platform.regulator_put(usb);
                    platform.regulator_put(pll);
                    return Err(Error::acquisition(Resource::DisableLine, e));
                }
                GpioFailurePolicy::Tolerate => {
                    warn!(label = %config.disable_line, err = %e, "continuing without disable line");
                    None
                }
            },
        };

        let radio = Arc::new(RadioController::new(Hardware::new(pll, usb, disable_line)));
        let binding = Arc::new(RfkillBinding::new(Arc::clone(&radio)));

        let mut rfkill =
            match platform.rfkill_alloc(&config.device_name, RadioType::Wwan, binding) {
                Ok(rfkill) => rfkill,
                Err(e) => {
                    error!("failed to allocate rfkill");
                    release_hardware(platform, &radio, Teardown::Unwind);
                    return Err(Error::acquisition(Resource::Rfkill, e));
                }
            };
        rfkill.init_sw_state(RfkillBinding::INITIAL_BLOCKED);

        if let Err(e) = rfkill.register() {
            error!("failed to register rfkill");
            platform.rfkill_destroy(rfkill);
            release_hardware(platform, &radio, Teardown::Unwind);
            return Err(Error::acquisition(Resource::Rfkill, e));
        }

        let device = Self {
            config,
            radio,
            rfkill: Mutex::new(Some(rfkill)),
        };

        if let Err(e) = platform.attributes_create(Attribute::ALL) {
            error!("failed to create attribute group");
            device.teardown(platform, Teardown::Unwind);
            return Err(Error::acquisition(Resource::Attributes, e));
        }

        info!("GSM/UMTS RFKill driver loaded");
        Ok(device)
    }

    /// Power the modem down and release every resource.
    #[instrument(level = "debug", skip_all, fields(device = %self.config.device_name))]
    pub fn detach<P: Platform + ?Sized>(self, platform: &mut P) {
        self.teardown(platform, Teardown::Detach);
        info!("GSM/UMTS RFKill driver unloaded");
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.device_name
    }

    /// The configuration the device was attached with.
    #[must_use]
    pub const fn config(&self) -> &GsmConfig {
        &self.config
    }

    /// The power controller.
    #[must_use]
    pub fn radio(&self) -> &RadioController {
        &self.radio
    }

    /// Toggle the modem, then report the block state it actually ended up
    /// in to the radio-kill framework.
    ///
    /// The rfkill slot is held across both steps so concurrent writers
    /// cannot reorder toggle and report. It is always taken before the
    /// controller lock.
    pub(crate) fn set_power_and_report(&self, on: bool) -> Result<()> {
        let mut rfkill = self.rfkill_slot();
        let (result, powered) = {
            let mut radio = self.radio.lock();
            let result = radio.set_power(on);
            (result, radio.state)
        };
        if let Some(rfkill) = rfkill.as_mut() {
            rfkill.set_sw_state(!powered);
        }
        result
    }

    fn rfkill_slot(&self) -> MutexGuard<'_, Option<Box<dyn Rfkill>>> {
        self.rfkill.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown<P: Platform + ?Sized>(&self, platform: &mut P, how: Teardown) {
        if how == Teardown::Detach {
            platform.attributes_remove(Attribute::ALL);
        }

        // Nothing may be released while the modem could still be powered.
        if let Err(err) = self.radio.set_power(false) {
            error!(%err, "failed to power modem down");
        }

        let rfkill = self.rfkill_slot().take();
        if let Some(mut rfkill) = rfkill {
            rfkill.unregister();
            platform.rfkill_destroy(rfkill);
        }

        release_hardware(platform, &self.radio, how);
    }
}

/// How resources are being handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    /// Failed attach: disable line, then regulator 1, then regulator 0.
    Unwind,
    /// Detach: attributes removed first; regulator 1, regulator 0, then the
    /// disable line.
    Detach,
}

/// Hand the rails and GPIO back in the order `how` calls for.
fn release_hardware<P: Platform + ?Sized>(
    platform: &mut P,
    radio: &RadioController,
    how: Teardown,
) {
    let Some(hardware) = radio.release() else {
        return;
    };
    let (pll, usb, disable_line) = hardware.into_parts();
    match how {
        Teardown::Unwind => {
            if let Some(line) = disable_line {
                platform.gpio_free(line);
            }
            platform.regulator_put(usb);
            platform.regulator_put(pll);
        }
        Teardown::Detach => {
            platform.regulator_put(usb);
            platform.regulator_put(pll);
            if let Some(line) = disable_line {
                platform.gpio_free(line);
            }
        }
    }
}
