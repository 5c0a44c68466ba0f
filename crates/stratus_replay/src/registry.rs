//! Closed registries mapping record kind names to event constructors.
//!
//! The external trace parser reads one record at a time and dispatches on
//! its kind discriminator through these tables. Both tables are closed and
//! ordered; this crate exposes them read-only.

use crate::error::{ReplayError, ReplayResult};
use crate::event::{Event, InputEvent, InternalEvent};
use crate::record::EventRecord;
use indexmap::IndexMap;

/// Constructor materializing one event from a record
pub type EventCtor = fn(&EventRecord) -> ReplayResult<Event>;

fn switch_failure(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::switch_failure(record).map(Event::Input)
}

fn switch_recovery(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::switch_recovery(record).map(Event::Input)
}

fn link_failure(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::link_failure(record).map(Event::Input)
}

fn link_recovery(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::link_recovery(record).map(Event::Input)
}

fn controller_failure(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::controller_failure(record).map(Event::Input)
}

fn controller_recovery(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::controller_recovery(record).map(Event::Input)
}

fn host_migration(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::host_migration(record).map(Event::Input)
}

fn policy_change(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::policy_change(record).map(Event::Input)
}

fn traffic_injection(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::traffic_injection(record).map(Event::Input)
}

fn wait_time(record: &EventRecord) -> ReplayResult<Event> {
    InputEvent::wait_time(record).map(Event::Input)
}

fn mastership_change(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::mastership_change(record).map(Event::Internal)
}

fn timer_event(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::timer_event(record).map(Event::Internal)
}

fn dataplane_drop(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::dataplane_drop(record).map(Event::Internal)
}

fn dataplane_permit(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::dataplane_permit(record).map(Event::Internal)
}

fn controlplane_receive_permit(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::controlplane_receive_permit(record).map(Event::Internal)
}

fn controlplane_send_permit(record: &EventRecord) -> ReplayResult<Event> {
    InternalEvent::controlplane_send_permit(record).map(Event::Internal)
}

/// Closed, ordered table of injectable event kinds
pub const INPUT_EVENT_KINDS: &[(&str, EventCtor)] = &[
    ("SwitchFailure", switch_failure),
    ("SwitchRecovery", switch_recovery),
    ("LinkFailure", link_failure),
    ("LinkRecovery", link_recovery),
    ("ControllerFailure", controller_failure),
    ("ControllerRecovery", controller_recovery),
    ("HostMigration", host_migration),
    ("PolicyChange", policy_change),
    ("TrafficInjection", traffic_injection),
    ("WaitTime", wait_time),
];

/// Closed, ordered table of observed internal event kinds
pub const INTERNAL_EVENT_KINDS: &[(&str, EventCtor)] = &[
    ("MastershipChange", mastership_change),
    ("TimerEvent", timer_event),
    ("DataplaneDrop", dataplane_drop),
    ("DataplanePermit", dataplane_permit),
    ("ControlplaneReceivePermit", controlplane_receive_permit),
    ("ControlplaneSendPermit", controlplane_send_permit),
];

/// Name-based dispatch over both kind tables
pub struct EventRegistry {
    ctors: IndexMap<&'static str, EventCtor>,
}

impl EventRegistry {
    /// Build the registry from the closed kind tables
    #[must_use]
    pub fn new() -> Self {
        let ctors = INPUT_EVENT_KINDS
            .iter()
            .chain(INTERNAL_EVENT_KINDS.iter())
            .copied()
            .collect();
        Self { ctors }
    }

    /// Whether the kind name is registered
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.ctors.contains_key(kind)
    }

    /// All registered kind names, input kinds first, in table order
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.ctors.keys().copied().collect()
    }

    /// Materialize an event of the named kind from a record
    ///
    /// # Errors
    ///
    /// Returns error if the kind is unknown or the record is malformed
    pub fn construct(&self, kind: &str, record: &EventRecord) -> ReplayResult<Event> {
        let ctor = self
            .ctors
            .get(kind)
            .ok_or_else(|| ReplayError::UnknownEventKind {
                kind: kind.to_string(),
            })?;
        ctor(record)
    }

    /// Materialize an event using the record's own kind discriminator
    ///
    /// # Errors
    ///
    /// Returns error if the discriminator is absent, the kind is unknown,
    /// or the record is malformed
    pub fn construct_from_record(&self, record: &EventRecord) -> ReplayResult<Event> {
        let kind = record.kind()?;
        self.construct(kind, record)
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
