//! Modem Session Example
//!
//! Attaches the controller to a simulated board, drives it the way user
//! space would (rfkill and attribute writes), then detaches.
//!
//! Run with: RUST_LOG=debug cargo run --example `modem_session`

use paz00_gsm::sim::SimPlatform;
use paz00_gsm::{Attribute, GsmConfig, GsmDevice};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║          PAZ00 GSM/UMTS Power Control Session              ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let mut platform = SimPlatform::new();
    let device = match GsmDevice::attach(&mut platform, GsmConfig::default()) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("attach failed: {e}");
            return;
        }
    };
    println!("Attached {} (version {})", device.name(), paz00_gsm::VERSION);
    print_attributes(&device);

    println!("\n$ rfkill unblock wwan");
    platform.set_block(false);
    print_attributes(&device);

    println!("\n$ echo 1 > reset");
    if let Err(e) = device.store(Attribute::Reset, "1\n") {
        eprintln!("write failed: {e}");
    }
    print_attributes(&device);

    println!("\n$ echo on > power_on");
    match device.store(Attribute::PowerOn, "on\n") {
        Ok(_) => println!("accepted"),
        Err(e) => println!("rejected: {e}"),
    }

    println!("\n$ echo 1 > power_on");
    if let Err(e) = device.store(Attribute::PowerOn, "1\n") {
        eprintln!("write failed: {e}");
    }
    print_attributes(&device);

    device.detach(&mut platform);

    println!();
    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ Hardware journal                                            │");
    println!("├─────────────────────────────────────────────────────────────┤");
    for event in platform.events().iter().filter(|e| e.is_power_edge()) {
        println!("│ {:<59} │", format!("{event:?}"));
    }
    println!("└─────────────────────────────────────────────────────────────┘");
    println!("Outstanding resources after detach: {}", platform.outstanding());
}

fn print_attributes(device: &GsmDevice) {
    for &attr in Attribute::ALL {
        println!("  {:<20} {}", attr.name(), device.show(attr).trim_end());
    }
}
