//! System suspend/resume hook.
//!
//! On suspend the current power state is captured and the modem is powered
//! off, unless `keep_on_in_suspend` is set. On resume the captured state is
//! restored. Snapshot and toggle happen under one lock acquisition, so a
//! concurrent attribute write cannot slip in between.
//!
//! The host framework cannot fail a suspend or resume cleanly, so toggle
//! failures are logged and otherwise ignored.

use crate::device::GsmDevice;
use tracing::{debug, error, instrument, warn};

impl GsmDevice {
    /// Prepare for system suspend.
    #[instrument(level = "debug", skip_all, fields(device = %self.name()))]
    pub fn suspend(&self) {
        debug!("suspending");
        let mut radio = self.radio.lock();
        radio.pre_resume_state = Some(radio.state);

        if radio.keep_on_in_suspend {
            warn!("keeping GSM ON during suspend");
            return;
        }

        if let Err(err) = radio.set_power(false) {
            error!(%err, "failed to power modem down for suspend");
        }
    }

    /// Restore the state captured by the matching [`GsmDevice::suspend`].
    ///
    /// A resume with no preceding suspend does nothing.
    #[instrument(level = "debug", skip_all, fields(device = %self.name()))]
    pub fn resume(&self) {
        debug!("resuming");
        let mut radio = self.radio.lock();
        let Some(state) = radio.pre_resume_state.take() else {
            warn!("resume without matching suspend, ignoring");
            return;
        };

        if let Err(err) = radio.set_power(state) {
            error!(%err, "failed to restore modem power after resume");
        }
    }
}
