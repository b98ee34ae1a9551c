//! In-process simulated platform.
//!
//! [`SimPlatform`] implements [`Platform`] without hardware: every
//! collaborator call is appended to an event journal, rail and pin levels
//! are tracked, and failures can be injected per operation. It also plays
//! the radio-kill framework, so [`SimPlatform::set_block`] drives the
//! registered callback the way a user-space `rfkill block` would.
//!
//! # Example
//!
//! ```
//! use paz00_gsm::sim::{Fault, SimPlatform};
//! use paz00_gsm::{GsmConfig, GsmDevice};
//!
//! let mut platform = SimPlatform::new();
//! platform.inject(Fault::RegulatorGet("avdd_usb".into()));
//!
//! let err = GsmDevice::attach(&mut platform, GsmConfig::default()).unwrap_err();
//! assert!(err.is_acquisition_failure());
//! assert_eq!(platform.outstanding(), 0);
//! ```

use crate::attributes::Attribute;
use crate::error::HalError;
use crate::platform::{
    GpioLine, HalResult, Level, Platform, RadioType, Regulator, Rfkill, RfkillOps,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One collaborator call observed by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A regulator was looked up.
    RegulatorGet(String),
    /// A regulator was released.
    RegulatorPut(String),
    /// A regulator was enabled.
    RegulatorEnable(String),
    /// A regulator was disabled.
    RegulatorDisable(String),
    /// A GPIO was requested as an output.
    GpioRequest {
        /// Request label.
        label: String,
        /// Initial level.
        level: Level,
    },
    /// A GPIO was driven.
    GpioSet {
        /// Request label.
        label: String,
        /// New level.
        level: Level,
    },
    /// A GPIO was released.
    GpioFree(String),
    /// A radio-kill object was allocated.
    RfkillAlloc {
        /// Object name.
        name: String,
        /// Radio class.
        kind: RadioType,
    },
    /// Initial software-block state was set.
    RfkillInitSwState(bool),
    /// The radio-kill object was registered.
    RfkillRegister,
    /// Software-block state was pushed to the framework.
    RfkillSetSwState(bool),
    /// The framework asked the driver to block or unblock.
    RfkillSetBlock(bool),
    /// The radio-kill object was unregistered.
    RfkillUnregister,
    /// The radio-kill object was freed.
    RfkillDestroy,
    /// The attribute group was published.
    AttributesCreate(Vec<&'static str>),
    /// The attribute group was removed.
    AttributesRemove,
}

impl Event {
    /// Whether this event changes a rail or the disable line.
    #[must_use]
    pub const fn is_power_edge(&self) -> bool {
        matches!(
            self,
            Self::RegulatorEnable(_) | Self::RegulatorDisable(_) | Self::GpioSet { .. }
        )
    }

    /// Whether this event hands a resource back to the platform.
    #[must_use]
    pub const fn is_release(&self) -> bool {
        matches!(
            self,
            Self::RegulatorPut(_)
                | Self::GpioFree(_)
                | Self::RfkillUnregister
                | Self::RfkillDestroy
                | Self::AttributesRemove
        )
    }
}

/// A failure the simulator can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Looking up the named supply fails.
    RegulatorGet(String),
    /// Enabling the named supply fails.
    RegulatorEnable(String),
    /// Disabling the named supply fails.
    RegulatorDisable(String),
    /// Requesting any GPIO fails.
    GpioRequest,
    /// Allocating a radio-kill object fails.
    RfkillAlloc,
    /// Registering a radio-kill object fails.
    RfkillRegister,
    /// Publishing the attribute group fails.
    AttributesCreate,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    faults: HashSet<Fault>,
    enable_counts: HashMap<String, u32>,
    levels: HashMap<String, Level>,
    sw_blocked: Option<bool>,
    ops: Option<Arc<dyn RfkillOps>>,
    outstanding: usize,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<State>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: Event) {
        self.lock().events.push(event);
    }

    fn check(&self, fault: &Fault, errno: i32, message: impl Into<String>) -> HalResult<()> {
        if self.lock().faults.contains(fault) {
            Err(HalError::new(errno, message))
        } else {
            Ok(())
        }
    }
}

/// Simulated board.
#[derive(Clone, Default)]
pub struct SimPlatform {
    shared: Shared,
}

impl fmt::Debug for SimPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("SimPlatform")
            .field("events", &state.events.len())
            .field("faults", &state.faults)
            .field("outstanding", &state.outstanding)
            .finish_non_exhaustive()
    }
}

impl SimPlatform {
    /// Create a simulator with no faults and an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an operation fail from now on.
    pub fn inject(&self, fault: Fault) {
        self.shared.lock().faults.insert(fault);
    }

    /// Stop failing an operation.
    pub fn clear(&self, fault: &Fault) {
        self.shared.lock().faults.remove(fault);
    }

    /// Snapshot of the journal.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.shared.lock().events.clone()
    }

    /// Empty the journal.
    pub fn clear_events(&self) {
        self.shared.lock().events.clear();
    }

    /// Position of the first occurrence of `event` in the journal.
    #[must_use]
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.shared.lock().events.iter().position(|e| e == event)
    }

    /// Whether the named supply currently holds an enable reference.
    #[must_use]
    pub fn rail_enabled(&self, supply: &str) -> bool {
        self.shared
            .lock()
            .enable_counts
            .get(supply)
            .is_some_and(|&count| count > 0)
    }

    /// Outstanding enable references on `supply`.
    #[must_use]
    pub fn enable_count(&self, supply: &str) -> u32 {
        self.shared
            .lock()
            .enable_counts
            .get(supply)
            .copied()
            .unwrap_or(0)
    }

    /// Level of the first requested GPIO, if one is held.
    #[must_use]
    pub fn disable_level(&self) -> Option<Level> {
        self.shared.lock().levels.values().next().copied()
    }

    /// Software-block state of the registered radio-kill object.
    #[must_use]
    pub fn sw_blocked(&self) -> Option<bool> {
        let state = self.shared.lock();
        state.ops.as_ref().and(state.sw_blocked)
    }

    /// Number of acquired resources not yet handed back.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.shared.lock().outstanding
    }

    /// Act as the radio-kill framework: ask the driver to block or unblock.
    ///
    /// Returns `false` if no radio-kill object is registered.
    pub fn set_block(&self, blocked: bool) -> bool {
        let ops = {
            let mut state = self.shared.lock();
            let Some(ops) = state.ops.clone() else {
                return false;
            };
            state.events.push(Event::RfkillSetBlock(blocked));
            state.sw_blocked = Some(blocked);
            ops
        };
        ops.set_block(blocked);
        true
    }

    fn acquired(&self) {
        self.shared.lock().outstanding += 1;
    }

    fn released(&self) {
        let mut state = self.shared.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
    }
}

struct SimRegulator {
    supply: String,
    shared: Shared,
}

impl Regulator for SimRegulator {
    fn supply(&self) -> &str {
        &self.supply
    }

    fn enable(&mut self) -> HalResult<()> {
        self.shared.check(
            &Fault::RegulatorEnable(self.supply.clone()),
            HalError::EIO,
            format!("{}: injected enable fault", self.supply),
        )?;
        let mut state = self.shared.lock();
        *state.enable_counts.entry(self.supply.clone()).or_insert(0) += 1;
        state.events.push(Event::RegulatorEnable(self.supply.clone()));
        Ok(())
    }

    fn disable(&mut self) -> HalResult<()> {
        self.shared.check(
            &Fault::RegulatorDisable(self.supply.clone()),
            HalError::EIO,
            format!("{}: injected disable fault", self.supply),
        )?;
        let mut state = self.shared.lock();
        let count = state.enable_counts.entry(self.supply.clone()).or_insert(0);
        *count = count.saturating_sub(1);
        state.events.push(Event::RegulatorDisable(self.supply.clone()));
        Ok(())
    }
}

struct SimGpio {
    label: String,
    shared: Shared,
}

impl GpioLine for SimGpio {
    fn label(&self) -> &str {
        &self.label
    }

    fn set_level(&mut self, level: Level) {
        let mut state = self.shared.lock();
        state.levels.insert(self.label.clone(), level);
        state.events.push(Event::GpioSet {
            label: self.label.clone(),
            level,
        });
    }
}

struct SimRfkill {
    ops: Arc<dyn RfkillOps>,
    shared: Shared,
}

impl Rfkill for SimRfkill {
    fn init_sw_state(&mut self, blocked: bool) {
        let mut state = self.shared.lock();
        state.sw_blocked = Some(blocked);
        state.events.push(Event::RfkillInitSwState(blocked));
    }

    fn set_sw_state(&mut self, blocked: bool) -> bool {
        let mut state = self.shared.lock();
        state.sw_blocked = Some(blocked);
        state.events.push(Event::RfkillSetSwState(blocked));
        blocked
    }

    fn register(&mut self) -> HalResult<()> {
        self.shared.check(
            &Fault::RfkillRegister,
            HalError::EBUSY,
            "injected rfkill register fault",
        )?;
        let mut state = self.shared.lock();
        state.ops = Some(Arc::clone(&self.ops));
        state.events.push(Event::RfkillRegister);
        Ok(())
    }

    fn unregister(&mut self) {
        let mut state = self.shared.lock();
        state.ops = None;
        state.events.push(Event::RfkillUnregister);
    }
}

impl Platform for SimPlatform {
    fn regulator_get(&mut self, supply: &str) -> HalResult<Box<dyn Regulator>> {
        self.shared.check(
            &Fault::RegulatorGet(supply.to_owned()),
            HalError::ENODEV,
            format!("{supply}: no such supply"),
        )?;
        self.shared.record(Event::RegulatorGet(supply.to_owned()));
        self.acquired();
        Ok(Box::new(SimRegulator {
            supply: supply.to_owned(),
            shared: self.shared.clone(),
        }))
    }

    fn regulator_put(&mut self, regulator: Box<dyn Regulator>) {
        self.shared
            .record(Event::RegulatorPut(regulator.supply().to_owned()));
        self.released();
    }

    fn gpio_request_output(
        &mut self,
        label: &str,
        initial: Level,
    ) -> HalResult<Box<dyn GpioLine>> {
        self.shared
            .check(&Fault::GpioRequest, HalError::EBUSY, format!("{label}: busy"))?;
        {
            let mut state = self.shared.lock();
            state.levels.insert(label.to_owned(), initial);
            state.events.push(Event::GpioRequest {
                label: label.to_owned(),
                level: initial,
            });
        }
        self.acquired();
        Ok(Box::new(SimGpio {
            label: label.to_owned(),
            shared: self.shared.clone(),
        }))
    }

    fn gpio_free(&mut self, line: Box<dyn GpioLine>) {
        {
            let mut state = self.shared.lock();
            state.levels.remove(line.label());
            state.events.push(Event::GpioFree(line.label().to_owned()));
        }
        self.released();
    }

    fn rfkill_alloc(
        &mut self,
        name: &str,
        kind: RadioType,
        ops: Arc<dyn RfkillOps>,
    ) -> HalResult<Box<dyn Rfkill>> {
        self.shared.check(
            &Fault::RfkillAlloc,
            HalError::ENOMEM,
            "injected rfkill alloc fault",
        )?;
        self.shared.record(Event::RfkillAlloc {
            name: name.to_owned(),
            kind,
        });
        self.acquired();
        Ok(Box::new(SimRfkill {
            ops,
            shared: self.shared.clone(),
        }))
    }

    fn rfkill_destroy(&mut self, rfkill: Box<dyn Rfkill>) {
        drop(rfkill);
        {
            let mut state = self.shared.lock();
            state.sw_blocked = None;
            state.events.push(Event::RfkillDestroy);
        }
        self.released();
    }

    fn attributes_create(&mut self, attributes: &[Attribute]) -> HalResult<()> {
        self.shared.check(
            &Fault::AttributesCreate,
            HalError::ENOMEM,
            "injected attribute group fault",
        )?;
        self.shared.record(Event::AttributesCreate(
            attributes.iter().map(|a| a.name()).collect(),
        ));
        self.acquired();
        Ok(())
    }

    fn attributes_remove(&mut self, _attributes: &[Attribute]) {
        self.shared.record(Event::AttributesRemove);
        self.released();
    }
}
