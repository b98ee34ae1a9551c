//! Property-based tests for paz00-gsm.
//!
//! Random sequences of host operations are replayed against the simulated
//! platform; after every step the hardware must agree with the reported
//! state and every transition must follow the power sequencing order.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use paz00_gsm::sim::{Event, Fault, SimPlatform};
use paz00_gsm::{Attribute, GsmConfig, GsmDevice, Level};
use proptest::prelude::*;

const PLL: &str = "avdd_usb_pll";
const USB: &str = "avdd_usb";

/// One thing the host can do to the device.
#[derive(Debug, Clone)]
enum Op {
    SetPower(bool),
    RfkillBlock(bool),
    WritePowerOn(u8),
    WriteReset(u8),
    #[cfg(feature = "pm")]
    WriteKeepOn(bool),
    #[cfg(feature = "pm")]
    SuspendResume,
}

#[cfg(feature = "pm")]
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::SetPower),
        any::<bool>().prop_map(Op::RfkillBlock),
        (0u8..4).prop_map(Op::WritePowerOn),
        (0u8..4).prop_map(Op::WriteReset),
        any::<bool>().prop_map(Op::WriteKeepOn),
        Just(Op::SuspendResume),
    ]
}

#[cfg(not(feature = "pm"))]
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::SetPower),
        any::<bool>().prop_map(Op::RfkillBlock),
        (0u8..4).prop_map(Op::WritePowerOn),
        (0u8..4).prop_map(Op::WriteReset),
    ]
}

fn apply(platform: &SimPlatform, device: &GsmDevice, op: &Op) {
    match op {
        Op::SetPower(on) => device.radio().set_power(*on).unwrap(),
        Op::RfkillBlock(blocked) => {
            platform.set_block(*blocked);
        }
        Op::WritePowerOn(v) => {
            device.store(Attribute::PowerOn, &format!("{v}\n")).unwrap();
        }
        Op::WriteReset(v) => {
            device.store(Attribute::Reset, &format!("{v}\n")).unwrap();
        }
        #[cfg(feature = "pm")]
        Op::WriteKeepOn(keep) => {
            device
                .store(Attribute::KeepOnInSuspend, if *keep { "1" } else { "0" })
                .unwrap();
        }
        #[cfg(feature = "pm")]
        Op::SuspendResume => {
            device.suspend();
            device.resume();
        }
    }
}

/// The state `op` should leave behind, given the state before it.
#[cfg_attr(not(feature = "pm"), allow(unused_variables))]
fn expected_state(before: bool, op: &Op) -> bool {
    match op {
        Op::SetPower(on) => *on,
        Op::RfkillBlock(blocked) => !*blocked,
        Op::WritePowerOn(v) => *v != 0,
        Op::WriteReset(v) => *v == 0,
        #[cfg(feature = "pm")]
        Op::WriteKeepOn(_) | Op::SuspendResume => before,
    }
}

/// One host op, or a change to which rail operations fail.
#[derive(Debug, Clone)]
enum Step {
    Host(Op),
    Inject(Fault),
    Heal(Fault),
}

fn rail_fault_strategy() -> impl Strategy<Value = Fault> {
    prop_oneof![
        Just(Fault::RegulatorEnable(PLL.into())),
        Just(Fault::RegulatorEnable(USB.into())),
        Just(Fault::RegulatorDisable(PLL.into())),
        Just(Fault::RegulatorDisable(USB.into())),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => op_strategy().prop_map(Step::Host),
        1 => rail_fault_strategy().prop_map(Step::Inject),
        1 => rail_fault_strategy().prop_map(Step::Heal),
    ]
}

/// Like [`apply`], but toggle failures are allowed. Returns whether a
/// toggle that reports errors succeeded; `None` for ops whose failures are
/// only logged.
fn try_apply(platform: &SimPlatform, device: &GsmDevice, op: &Op) -> Option<bool> {
    match op {
        Op::SetPower(on) => Some(device.radio().set_power(*on).is_ok()),
        Op::WritePowerOn(v) => Some(device.store(Attribute::PowerOn, &format!("{v}\n")).is_ok()),
        Op::WriteReset(v) => Some(device.store(Attribute::Reset, &format!("{v}\n")).is_ok()),
        _ => {
            apply(platform, device, op);
            None
        }
    }
}

fn edges(platform: &SimPlatform) -> Vec<Event> {
    platform
        .events()
        .into_iter()
        .filter(Event::is_power_edge)
        .collect()
}

fn on_sequence() -> Vec<Event> {
    vec![
        Event::RegulatorEnable(PLL.into()),
        Event::RegulatorEnable(USB.into()),
        Event::GpioSet {
            label: "gsm_disable".into(),
            level: Level::Low,
        },
    ]
}

fn off_sequence() -> Vec<Event> {
    vec![
        Event::GpioSet {
            label: "gsm_disable".into(),
            level: Level::High,
        },
        Event::RegulatorDisable(USB.into()),
        Event::RegulatorDisable(PLL.into()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Property: rails and disable line always agree with the reported state
    #[test]
    fn prop_hardware_matches_state(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();

        for op in &ops {
            apply(&platform, &device, op);
            let on = device.radio().is_powered();
            prop_assert_eq!(platform.rail_enabled(PLL), on);
            prop_assert_eq!(platform.rail_enabled(USB), on);
            prop_assert_eq!(
                platform.disable_level(),
                Some(if on { Level::Low } else { Level::High })
            );
            prop_assert_eq!(device.show(Attribute::PowerOn), if on { "1\n" } else { "0\n" });
            prop_assert_eq!(device.show(Attribute::Reset), if on { "0\n" } else { "1\n" });
        }

        device.detach(&mut platform);
        prop_assert_eq!(platform.outstanding(), 0);
    }

    // Property: each op lands on the state its semantics dictate
    #[test]
    fn prop_ops_reach_expected_state(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();

        for op in &ops {
            let before = device.radio().is_powered();
            apply(&platform, &device, op);
            prop_assert_eq!(device.radio().is_powered(), expected_state(before, op));
        }
    }

    // Property: every transition is one complete, correctly ordered sequence
    #[test]
    fn prop_transitions_are_ordered(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();
        platform.clear_events();

        for op in &ops {
            apply(&platform, &device, op);
        }

        let edges = edges(&platform);
        prop_assert_eq!(edges.len() % 3, 0);
        let mut on = false;
        for chunk in edges.chunks(3) {
            let expected = if on { off_sequence() } else { on_sequence() };
            prop_assert_eq!(chunk.to_vec(), expected);
            on = !on;
        }
        prop_assert_eq!(on, device.radio().is_powered());
    }

    // Property: rail faults never leave a stacked enable or a rail powered
    // behind the controller's back, and a successful toggle settles both rails
    #[test]
    fn prop_rail_faults_keep_refcounts_consistent(steps in prop::collection::vec(step_strategy(), 1..60)) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();

        for step in &steps {
            let outcome = match step {
                Step::Host(op) => try_apply(&platform, &device, op),
                Step::Inject(fault) => {
                    platform.inject(fault.clone());
                    None
                }
                Step::Heal(fault) => {
                    platform.clear(fault);
                    None
                }
            };

            let on = device.radio().is_powered();
            let pll = platform.enable_count(PLL);
            let usb = platform.enable_count(USB);
            prop_assert!(pll <= 1 && usb <= 1, "stacked enable: pll={} usb={}", pll, usb);
            prop_assert_eq!(
                platform.disable_level(),
                Some(if on { Level::Low } else { Level::High })
            );
            if on {
                prop_assert_eq!((pll, usb), (1, 1));
            }
            if outcome == Some(true) {
                let expected = u32::from(on);
                prop_assert_eq!((pll, usb), (expected, expected));
            }
        }

        for fault in [
            Fault::RegulatorEnable(PLL.into()),
            Fault::RegulatorEnable(USB.into()),
            Fault::RegulatorDisable(PLL.into()),
            Fault::RegulatorDisable(USB.into()),
        ] {
            platform.clear(&fault);
        }
        device.radio().set_power(false).unwrap();
        prop_assert_eq!(platform.enable_count(PLL), 0);
        prop_assert_eq!(platform.enable_count(USB), 0);

        device.radio().set_power(true).unwrap();
        device.detach(&mut platform);
        prop_assert_eq!(platform.enable_count(PLL), 0);
        prop_assert_eq!(platform.enable_count(USB), 0);
        prop_assert_eq!(platform.outstanding(), 0);
    }

    // Property: repeating a request never produces more hardware activity
    #[test]
    fn prop_set_power_idempotent(start in any::<bool>(), desired in any::<bool>(), repeats in 1usize..5) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();
        device.radio().set_power(start).unwrap();

        device.radio().set_power(desired).unwrap();
        let after_first = edges(&platform).len();
        for _ in 0..repeats {
            device.radio().set_power(desired).unwrap();
        }
        prop_assert_eq!(edges(&platform).len(), after_first);
    }

    // Property: malformed writes are rejected without side effects
    #[test]
    fn prop_garbage_writes_rejected(input in "[a-zA-Z+\\-. ]{1,12}") {
        prop_assume!(input.trim().parse::<u64>().is_err());
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();
        platform.clear_events();

        prop_assert!(device.store(Attribute::PowerOn, &input).is_err());
        prop_assert!(device.store(Attribute::Reset, &input).is_err());
        prop_assert!(platform.events().is_empty());
    }

    // Property: any decimal integer is accepted, non-zero meaning true
    #[test]
    fn prop_integer_writes_accepted(value in any::<u32>()) {
        let mut platform = SimPlatform::new();
        let device = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap();
        let buf = format!("{value}\n");

        prop_assert_eq!(device.store(Attribute::PowerOn, &buf).unwrap(), buf.len());
        prop_assert_eq!(device.radio().is_powered(), value != 0);
    }
}
