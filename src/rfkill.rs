//! Radio-kill binding.
//!
//! Translates the framework's block/unblock requests into power toggles.
//! The framework callback has no error channel, so toggle failures are
//! logged here and go no further.

use crate::controller::RadioController;
use crate::platform::RfkillOps;
use std::sync::Arc;
use tracing::{debug, error};

/// Callback object registered with the radio-kill framework.
#[derive(Debug)]
pub struct RfkillBinding {
    radio: Arc<RadioController>,
}

impl RfkillBinding {
    /// Software-block state reported at registration: blocked, matching a
    /// modem that starts powered off.
    pub const INITIAL_BLOCKED: bool = true;

    /// Bind to a controller.
    #[must_use]
    pub const fn new(radio: Arc<RadioController>) -> Self {
        Self { radio }
    }

    /// Power the modem off when blocked, on when unblocked.
    pub fn on_block_change(&self, blocked: bool) {
        if let Err(err) = self.radio.set_power(!blocked) {
            error!(%err, blocked, "rfkill request could not be applied");
        }
    }
}

impl RfkillOps for RfkillBinding {
    fn set_block(&self, blocked: bool) {
        debug!(blocked, "rfkill set_block");
        self.on_block_change(blocked);
    }
}
