//! Radio power state controller.
//!
//! [`RadioController`] is the only place that touches the supply rails and
//! the disable line. The rfkill binding, the attribute interface and the
//! suspend/resume hook all funnel through [`RadioController::set_power`].
//!
//! Power-on order: rail 0, rail 1, then release the disable line.
//! Power-off order: assert the disable line, then rail 1, then rail 0.
//!
//! All state lives behind one mutex, held for the whole of every toggle and
//! every read, so callers from different contexts always observe a
//! consistent `(state, rails, disable line)` triple.

use crate::error::{Direction, Error, Rail, Result};
use crate::platform::{GpioLine, Level, Regulator};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};

/// The physical resources owned by an attached controller.
///
/// `held` records which rails this controller currently holds an enable
/// reference on. It changes only when `enable`/`disable` succeeds, so a
/// rail whose disable failed is never enabled a second time.
pub(crate) struct Hardware {
    rails: [Box<dyn Regulator>; 2],
    held: [bool; 2],
    disable_line: Option<Box<dyn GpioLine>>,
}

impl Hardware {
    pub(crate) fn new(
        pll: Box<dyn Regulator>,
        usb: Box<dyn Regulator>,
        disable_line: Option<Box<dyn GpioLine>>,
    ) -> Self {
        Self {
            rails: [pll, usb],
            held: [false; 2],
            disable_line,
        }
    }

    /// Split back into `(rail 0, rail 1, disable line)` for release.
    pub(crate) fn into_parts(
        self,
    ) -> (
        Box<dyn Regulator>,
        Box<dyn Regulator>,
        Option<Box<dyn GpioLine>>,
    ) {
        let [pll, usb] = self.rails;
        (pll, usb, self.disable_line)
    }

    /// Whether every rail is held (`on`) or released (`!on`).
    fn is_settled(&self, on: bool) -> bool {
        self.held.iter().all(|&held| held == on)
    }

    fn enable_rail(&mut self, rail: Rail) -> Result<()> {
        let i = rail.index();
        if self.held[i] {
            return Ok(());
        }
        self.rails[i]
            .enable()
            .map_err(|e| Error::regulator(rail, Direction::Enable, e))?;
        self.held[i] = true;
        Ok(())
    }

    fn disable_rail(&mut self, rail: Rail) -> Result<()> {
        let i = rail.index();
        if !self.held[i] {
            return Ok(());
        }
        self.rails[i]
            .disable()
            .map_err(|e| Error::regulator(rail, Direction::Disable, e))?;
        self.held[i] = false;
        Ok(())
    }

    fn drive_disable_line(&mut self, level: Level) {
        match self.disable_line.as_mut() {
            Some(line) => line.set_level(level),
            None => debug!(%level, "no disable line, skipping"),
        }
    }

    /// Rails up, then release the modem. Rail 0 is rolled back if rail 1
    /// refuses, so a failed power-on leaves both rails off.
    fn power_on(&mut self) -> Result<()> {
        self.enable_rail(Rail::UsbPll)?;

        if let Err(err) = self.enable_rail(Rail::Usb) {
            if let Err(undo) = self.disable_rail(Rail::UsbPll) {
                warn!(error = %undo, "could not roll back USB PLL rail");
            }
            return Err(err);
        }

        self.drive_disable_line(Level::Low);
        Ok(())
    }

    /// Hold the modem disabled, then drop the rails. Both rails are always
    /// attempted; the first failure is reported. A rail that refuses stays
    /// held and is retried by the next power-off.
    fn power_off(&mut self) -> Result<()> {
        self.drive_disable_line(Level::High);

        let usb = self.disable_rail(Rail::Usb);
        let pll = self.disable_rail(Rail::UsbPll);

        usb.and(pll)
    }
}

/// State guarded by the controller mutex.
pub(crate) struct Radio {
    pub(crate) hardware: Option<Hardware>,
    pub(crate) state: bool,
    pub(crate) pre_resume_state: Option<bool>,
    pub(crate) keep_on_in_suspend: bool,
}

impl Radio {
    pub(crate) fn set_power(&mut self, on: bool) -> Result<()> {
        let hardware = match self.hardware.as_mut() {
            Some(hardware) => hardware,
            None if self.state == on => return Ok(()),
            None => return Err(Error::NotAttached),
        };
        // Same state with every rail where it belongs: nothing to do. A rail
        // left held by a failed power-off makes the request go through.
        if self.state == on && hardware.is_settled(on) {
            return Ok(());
        }

        if on {
            hardware.power_on()?;
            self.state = true;
            debug!("modem powered on");
            Ok(())
        } else {
            // The disable line is asserted even when a rail fails, so the
            // modem is off as far as software is concerned.
            let result = hardware.power_off();
            self.state = false;
            debug!("modem powered off");
            result
        }
    }
}

/// Owner of the modem's on/off state.
pub struct RadioController {
    radio: Mutex<Radio>,
}

impl fmt::Debug for RadioController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let radio = self.lock();
        f.debug_struct("RadioController")
            .field("attached", &radio.hardware.is_some())
            .field("state", &radio.state)
            .field("pre_resume_state", &radio.pre_resume_state)
            .field("keep_on_in_suspend", &radio.keep_on_in_suspend)
            .finish()
    }
}

impl RadioController {
    /// Wrap freshly acquired hardware. The modem starts powered off.
    pub(crate) fn new(hardware: Hardware) -> Self {
        Self {
            radio: Mutex::new(Radio {
                hardware: Some(hardware),
                state: false,
                pre_resume_state: None,
                keep_on_in_suspend: false,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Radio> {
        self.radio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drive the modem on or off.
    ///
    /// Requesting the current state does nothing, except that after a failed
    /// power-off a repeated `false` retries the rail that refused.
    ///
    /// # Errors
    ///
    /// - [`Error::RegulatorOperationFailed`] if a rail refused. After a
    ///   failed power-on the modem is still off; after a failed power-off
    ///   the disable line is asserted and the state reads off.
    /// - [`Error::NotAttached`] if the hardware was already released.
    #[instrument(level = "debug", skip(self))]
    pub fn set_power(&self, on: bool) -> Result<()> {
        self.lock().set_power(on)
    }

    /// Whether the modem is currently powered.
    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.lock().state
    }

    /// Whether the rails and disable line are still owned.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.lock().hardware.is_some()
    }

    /// Whether the modem stays powered through system suspend.
    #[must_use]
    pub fn keep_on_in_suspend(&self) -> bool {
        self.lock().keep_on_in_suspend
    }

    /// Set the suspend policy. No power transition happens here.
    pub fn set_keep_on_in_suspend(&self, keep: bool) {
        self.lock().keep_on_in_suspend = keep;
    }

    /// Take the hardware out for release. Later toggles fail with
    /// [`Error::NotAttached`].
    pub(crate) fn release(&self) -> Option<Hardware> {
        self.lock().hardware.take()
    }
}
