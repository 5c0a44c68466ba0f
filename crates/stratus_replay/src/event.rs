//! The closed catalogue of replayable events.
//!
//! An event is one unit of a recorded trace: an identity (its label), a
//! side-effecting action against the live simulation, and a completion
//! check. `proceed` executes a single round of the action and reports
//! `Ok(true)` when the event is fully realized, or `Ok(false)` when its
//! precondition is not yet satisfied and the caller must retry later.
//!
//! Input events are injected from outside the system under test and are
//! causally independent of each other; internal events are occurrences
//! observed inside the controllers or the simulator's own plumbing. The
//! taxonomy is closed: every variant states its completion behavior in
//! the exhaustive dispatch below.

use crate::error::{ReplayError, ReplayResult};
use crate::record::EventRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use stratus_core::{ControllerId, DpOutId, Dpid, Label, PortNo};
use stratus_sim::Simulation;

/// Action carried by an injected event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputAction {
    /// Crash a switch
    SwitchFailure {
        /// Target switch
        dpid: Dpid,
    },
    /// Recover a crashed switch
    SwitchRecovery {
        /// Target switch
        dpid: Dpid,
    },
    /// Sever a directed link
    LinkFailure {
        /// Source switch
        start_dpid: Dpid,
        /// Source port
        start_port_no: PortNo,
        /// Destination switch
        end_dpid: Dpid,
        /// Destination port
        end_port_no: PortNo,
    },
    /// Repair a severed link
    LinkRecovery {
        /// Source switch
        start_dpid: Dpid,
        /// Source port
        start_port_no: PortNo,
        /// Destination switch
        end_dpid: Dpid,
        /// Destination port
        end_port_no: PortNo,
    },
    /// Kill a controller
    ControllerFailure {
        /// Target controller
        uuid: ControllerId,
    },
    /// Reboot a killed controller
    ControllerRecovery {
        /// Target controller
        uuid: ControllerId,
    },
    /// Move a host's ingress attachment point
    HostMigration {
        /// Old ingress switch
        old_ingress_dpid: Dpid,
        /// Old ingress port
        old_ingress_port_no: PortNo,
        /// New ingress switch
        new_ingress_dpid: Dpid,
        /// New ingress port
        new_ingress_port_no: PortNo,
    },
    /// Unimplemented placeholder; performs no action and never completes
    PolicyChange {
        /// Recorded request type, carried but unused
        request_type: String,
    },
    /// Inject the next queued dataplane trace packet
    TrafficInjection,
    /// Pause replay for a wall-clock duration
    WaitTime {
        /// Seconds to pause
        seconds: f64,
    },
}

/// Occurrence carried by an observed internal event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternalOccurrence {
    /// Controller mastership changed; completion semantics unresolved
    MastershipChange,
    /// Controller-internal timer fired; completion semantics unresolved
    TimerEvent,
    /// Drop a buffered dataplane packet once it appears
    DataplaneDrop {
        /// Buffered-event id to wait for
        dpout_id: DpOutId,
    },
    /// Permit a buffered dataplane packet once it appears
    DataplanePermit {
        /// Buffered-event id to wait for
        dpout_id: DpOutId,
    },
    /// Permit one pending control-channel receive once one is queued
    ControlplaneReceivePermit {
        /// Switch side of the connection
        dpid: Dpid,
        /// Controller side of the connection
        controller_uuid: ControllerId,
    },
    /// Permit one pending control-channel send once one is queued
    ControlplaneSendPermit {
        /// Switch side of the connection
        dpid: Dpid,
        /// Controller side of the connection
        controller_uuid: ControllerId,
    },
}

/// An event injected into the simulation from outside.
///
/// May carry the labels of internal events known (from the recorded run's
/// observed causality) to occur because of it; pruning uses that set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    label: Label,
    dependent_labels: Option<BTreeSet<Label>>,
    action: InputAction,
}

impl InputEvent {
    /// Create an input event with no known dependents
    #[must_use]
    pub fn new(label: Label, action: InputAction) -> Self {
        Self {
            label,
            dependent_labels: None,
            action,
        }
    }

    /// Attach the recorded dependent internal-event labels
    #[must_use]
    pub fn with_dependent_labels(mut self, labels: BTreeSet<Label>) -> Self {
        self.dependent_labels = Some(labels);
        self
    }

    fn from_record(record: &EventRecord, action: InputAction) -> ReplayResult<Self> {
        Ok(Self {
            label: record.label()?,
            dependent_labels: record.dependent_labels()?,
            action,
        })
    }

    fn link_endpoints(record: &EventRecord) -> ReplayResult<(Dpid, PortNo, Dpid, PortNo)> {
        Ok((
            record.dpid("start_dpid")?,
            record.port_no("start_port_no")?,
            record.dpid("end_dpid")?,
            record.port_no("end_port_no")?,
        ))
    }

    /// Construct a SwitchFailure from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn switch_failure(record: &EventRecord) -> ReplayResult<Self> {
        let dpid = record.dpid("dpid")?;
        Self::from_record(record, InputAction::SwitchFailure { dpid })
    }

    /// Construct a SwitchRecovery from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn switch_recovery(record: &EventRecord) -> ReplayResult<Self> {
        let dpid = record.dpid("dpid")?;
        Self::from_record(record, InputAction::SwitchRecovery { dpid })
    }

    /// Construct a LinkFailure from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn link_failure(record: &EventRecord) -> ReplayResult<Self> {
        let (start_dpid, start_port_no, end_dpid, end_port_no) = Self::link_endpoints(record)?;
        Self::from_record(
            record,
            InputAction::LinkFailure {
                start_dpid,
                start_port_no,
                end_dpid,
                end_port_no,
            },
        )
    }

    /// Construct a LinkRecovery from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn link_recovery(record: &EventRecord) -> ReplayResult<Self> {
        let (start_dpid, start_port_no, end_dpid, end_port_no) = Self::link_endpoints(record)?;
        Self::from_record(
            record,
            InputAction::LinkRecovery {
                start_dpid,
                start_port_no,
                end_dpid,
                end_port_no,
            },
        )
    }

    /// Construct a ControllerFailure from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn controller_failure(record: &EventRecord) -> ReplayResult<Self> {
        let uuid = record.controller_id("uuid")?;
        Self::from_record(record, InputAction::ControllerFailure { uuid })
    }

    /// Construct a ControllerRecovery from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn controller_recovery(record: &EventRecord) -> ReplayResult<Self> {
        let uuid = record.controller_id("uuid")?;
        Self::from_record(record, InputAction::ControllerRecovery { uuid })
    }

    /// Construct a HostMigration from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn host_migration(record: &EventRecord) -> ReplayResult<Self> {
        let action = InputAction::HostMigration {
            old_ingress_dpid: record.dpid("old_ingress_dpid")?,
            old_ingress_port_no: record.port_no("old_ingress_port_no")?,
            new_ingress_dpid: record.dpid("new_ingress_dpid")?,
            new_ingress_port_no: record.port_no("new_ingress_port_no")?,
        };
        Self::from_record(record, action)
    }

    /// Construct a PolicyChange from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn policy_change(record: &EventRecord) -> ReplayResult<Self> {
        let request_type = record.require_str("request_type")?.to_string();
        Self::from_record(record, InputAction::PolicyChange { request_type })
    }

    /// Construct a TrafficInjection from a record
    ///
    /// # Errors
    ///
    /// Returns error if the label is missing
    pub fn traffic_injection(record: &EventRecord) -> ReplayResult<Self> {
        Self::from_record(record, InputAction::TrafficInjection)
    }

    /// Construct a WaitTime from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn wait_time(record: &EventRecord) -> ReplayResult<Self> {
        let seconds = record.require_f64("time")?;
        Self::from_record(record, InputAction::WaitTime { seconds })
    }

    /// The event's label
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Labels of the internal events recorded as caused by this input
    #[must_use]
    pub fn dependent_labels(&self) -> Option<&BTreeSet<Label>> {
        self.dependent_labels.as_ref()
    }

    /// The carried action
    #[must_use]
    pub fn action(&self) -> &InputAction {
        &self.action
    }

    /// Registry kind name of the concrete variant
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.action {
            InputAction::SwitchFailure { .. } => "SwitchFailure",
            InputAction::SwitchRecovery { .. } => "SwitchRecovery",
            InputAction::LinkFailure { .. } => "LinkFailure",
            InputAction::LinkRecovery { .. } => "LinkRecovery",
            InputAction::ControllerFailure { .. } => "ControllerFailure",
            InputAction::ControllerRecovery { .. } => "ControllerRecovery",
            InputAction::HostMigration { .. } => "HostMigration",
            InputAction::PolicyChange { .. } => "PolicyChange",
            InputAction::TrafficInjection => "TrafficInjection",
            InputAction::WaitTime { .. } => "WaitTime",
        }
    }

    /// Execute one round of the injected action.
    ///
    /// Actions are synchronous in the simulation model: they apply exactly
    /// once and complete immediately, except PolicyChange (no defined
    /// action, never completes) and WaitTime (completes after its pause).
    ///
    /// # Errors
    ///
    /// Returns error if a simulation lookup or verb fails; errors are
    /// never retried
    pub async fn proceed(&self, sim: &mut Simulation) -> ReplayResult<bool> {
        match &self.action {
            InputAction::SwitchFailure { dpid } => {
                sim.topology.switch_mut(*dpid)?.crash();
                Ok(true)
            }
            InputAction::SwitchRecovery { dpid } => {
                sim.topology.switch_mut(*dpid)?.recover();
                Ok(true)
            }
            InputAction::LinkFailure {
                start_dpid,
                start_port_no,
                end_dpid,
                end_port_no,
            } => {
                let link = sim.topology.resolve_link(
                    *start_dpid,
                    *start_port_no,
                    *end_dpid,
                    *end_port_no,
                )?;
                sim.topology.sever_link(&link)?;
                Ok(true)
            }
            InputAction::LinkRecovery {
                start_dpid,
                start_port_no,
                end_dpid,
                end_port_no,
            } => {
                let link = sim.topology.resolve_link(
                    *start_dpid,
                    *start_port_no,
                    *end_dpid,
                    *end_port_no,
                )?;
                sim.topology.repair_link(&link)?;
                Ok(true)
            }
            InputAction::ControllerFailure { uuid } => {
                sim.controllers.controller_mut(uuid)?.kill();
                Ok(true)
            }
            InputAction::ControllerRecovery { uuid } => {
                sim.controllers.controller_mut(uuid)?.reboot();
                Ok(true)
            }
            InputAction::HostMigration {
                old_ingress_dpid,
                old_ingress_port_no,
                new_ingress_dpid,
                new_ingress_port_no,
            } => {
                sim.topology.migrate_host(
                    *old_ingress_dpid,
                    *old_ingress_port_no,
                    *new_ingress_dpid,
                    *new_ingress_port_no,
                )?;
                Ok(true)
            }
            InputAction::PolicyChange { .. } => {
                // No defined action; reports "not complete" every round.
                Ok(false)
            }
            InputAction::TrafficInjection => {
                sim.inject_trace_event()?;
                Ok(true)
            }
            InputAction::WaitTime { seconds } => {
                tracing::info!(seconds = *seconds, "pausing replay");
                tokio::time::sleep(Duration::from_secs_f64(*seconds)).await;
                Ok(true)
            }
        }
    }
}

/// An occurrence observed inside the system under test or the simulator's
/// own plumbing. Always a leaf of the dependency relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalEvent {
    label: Label,
    occurrence: InternalOccurrence,
}

impl InternalEvent {
    /// Create an internal event
    #[must_use]
    pub fn new(label: Label, occurrence: InternalOccurrence) -> Self {
        Self { label, occurrence }
    }

    fn from_record(record: &EventRecord, occurrence: InternalOccurrence) -> ReplayResult<Self> {
        Ok(Self {
            label: record.label()?,
            occurrence,
        })
    }

    /// Construct a MastershipChange from a record
    ///
    /// # Errors
    ///
    /// Returns error if the label is missing
    pub fn mastership_change(record: &EventRecord) -> ReplayResult<Self> {
        Self::from_record(record, InternalOccurrence::MastershipChange)
    }

    /// Construct a TimerEvent from a record
    ///
    /// # Errors
    ///
    /// Returns error if the label is missing
    pub fn timer_event(record: &EventRecord) -> ReplayResult<Self> {
        Self::from_record(record, InternalOccurrence::TimerEvent)
    }

    /// Construct a DataplaneDrop from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn dataplane_drop(record: &EventRecord) -> ReplayResult<Self> {
        let dpout_id = record.dpout_id("dpout_id")?;
        Self::from_record(record, InternalOccurrence::DataplaneDrop { dpout_id })
    }

    /// Construct a DataplanePermit from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn dataplane_permit(record: &EventRecord) -> ReplayResult<Self> {
        let dpout_id = record.dpout_id("dpout_id")?;
        Self::from_record(record, InternalOccurrence::DataplanePermit { dpout_id })
    }

    /// Construct a ControlplaneReceivePermit from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn controlplane_receive_permit(record: &EventRecord) -> ReplayResult<Self> {
        let occurrence = InternalOccurrence::ControlplaneReceivePermit {
            dpid: record.dpid("dpid")?,
            controller_uuid: record.controller_id("controller_uuid")?,
        };
        Self::from_record(record, occurrence)
    }

    /// Construct a ControlplaneSendPermit from a record
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing
    pub fn controlplane_send_permit(record: &EventRecord) -> ReplayResult<Self> {
        let occurrence = InternalOccurrence::ControlplaneSendPermit {
            dpid: record.dpid("dpid")?,
            controller_uuid: record.controller_id("controller_uuid")?,
        };
        Self::from_record(record, occurrence)
    }

    /// The event's label
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// The carried occurrence
    #[must_use]
    pub fn occurrence(&self) -> &InternalOccurrence {
        &self.occurrence
    }

    /// Registry kind name of the concrete variant
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.occurrence {
            InternalOccurrence::MastershipChange => "MastershipChange",
            InternalOccurrence::TimerEvent => "TimerEvent",
            InternalOccurrence::DataplaneDrop { .. } => "DataplaneDrop",
            InternalOccurrence::DataplanePermit { .. } => "DataplanePermit",
            InternalOccurrence::ControlplaneReceivePermit { .. } => "ControlplaneReceivePermit",
            InternalOccurrence::ControlplaneSendPermit { .. } => "ControlplaneSendPermit",
        }
    }

    /// Check whether the observed occurrence has happened, acting once
    /// when it has.
    ///
    /// The "wait for the buffer to be non-empty, then act once" kinds are
    /// how replay stays synchronized with asynchronous network and
    /// controller activity: `Ok(false)` means not yet, retry later.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEvent` for the placeholder kinds with no
    /// completion semantics, or a simulation error on a failed lookup
    pub fn proceed(&self, sim: &mut Simulation) -> ReplayResult<bool> {
        match &self.occurrence {
            InternalOccurrence::MastershipChange | InternalOccurrence::TimerEvent => {
                Err(ReplayError::UnsupportedEvent {
                    kind: self.kind_name(),
                    label: self.label.clone(),
                })
            }
            InternalOccurrence::DataplaneDrop { dpout_id } => {
                if sim.patch_panel.get_buffered_dp_event(dpout_id).is_none() {
                    return Ok(false);
                }
                sim.patch_panel.drop_dp_event(dpout_id);
                Ok(true)
            }
            InternalOccurrence::DataplanePermit { dpout_id } => {
                if sim.patch_panel.get_buffered_dp_event(dpout_id).is_none() {
                    return Ok(false);
                }
                sim.patch_panel.permit_dp_event(dpout_id);
                Ok(true)
            }
            InternalOccurrence::ControlplaneReceivePermit {
                dpid,
                controller_uuid,
            } => {
                let worker = sim
                    .topology
                    .switch_mut(*dpid)?
                    .connection_mut(controller_uuid)?
                    .io_worker_mut();
                if !worker.has_pending_receives() {
                    return Ok(false);
                }
                worker.permit_receive();
                Ok(true)
            }
            InternalOccurrence::ControlplaneSendPermit {
                dpid,
                controller_uuid,
            } => {
                let worker = sim
                    .topology
                    .switch_mut(*dpid)?
                    .connection_mut(controller_uuid)?
                    .io_worker_mut();
                if !worker.has_pending_sends() {
                    return Ok(false);
                }
                worker.permit_send();
                Ok(true)
            }
        }
    }
}

/// One unit of a recorded trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Injected from outside the system under test
    Input(InputEvent),
    /// Observed inside the system under test
    Internal(InternalEvent),
}

impl Event {
    /// The event's label
    #[must_use]
    pub fn label(&self) -> &Label {
        match self {
            Event::Input(event) => event.label(),
            Event::Internal(event) => event.label(),
        }
    }

    /// Registry kind name of the concrete variant
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Input(event) => event.kind_name(),
            Event::Internal(event) => event.kind_name(),
        }
    }

    /// Labels of the internal events recorded as caused by this event.
    /// Internal events never carry dependents
    #[must_use]
    pub fn dependent_labels(&self) -> Option<&BTreeSet<Label>> {
        match self {
            Event::Input(event) => event.dependent_labels(),
            Event::Internal(_) => None,
        }
    }

    /// Execute one round of the event against the live simulation.
    ///
    /// `Ok(true)` means the event is fully realized and replay may
    /// advance; `Ok(false)` means the precondition is not yet satisfied
    /// and the caller should retry later. Safe to call repeatedly on the
    /// already-happened path.
    ///
    /// # Errors
    ///
    /// Returns error on a failed simulation lookup or an unsupported
    /// placeholder kind; errors are never retried
    pub async fn proceed(&self, sim: &mut Simulation) -> ReplayResult<bool> {
        match self {
            Event::Input(event) => event.proceed(sim).await,
            Event::Internal(event) => event.proceed(sim),
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind_name(), self.label())
    }
}
