//! Suspend Cycle Example
//!
//! Shows the modem being powered down across a system suspend, and kept
//! up when `keep_on_in_suspend` is set.
//!
//! Run with: RUST_LOG=paz00_gsm=debug cargo run --example `suspend_cycle`

use paz00_gsm::sim::SimPlatform;
use paz00_gsm::{Attribute, GsmConfig, GsmDevice};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), paz00_gsm::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut platform = SimPlatform::new();
    let device = GsmDevice::attach(&mut platform, GsmConfig::default())?;
    device.store(Attribute::PowerOn, "1\n")?;

    for keep_on in [false, true] {
        device.store(Attribute::KeepOnInSuspend, if keep_on { "1" } else { "0" })?;
        platform.clear_events();

        device.suspend();
        let during = device.radio().is_powered();
        device.resume();
        let after = device.radio().is_powered();

        let edges = platform.events().iter().filter(|e| e.is_power_edge()).count();
        println!(
            "keep_on_in_suspend={} | powered during suspend: {:<5} | after resume: {:<5} | edges: {}",
            u8::from(keep_on),
            during,
            after,
            edges
        );
    }

    device.detach(&mut platform);
    Ok(())
}
