//! Simulated switch, link, and host topology.
//!
//! Fault verbs are idempotent: crashing a crashed switch or severing a
//! severed link changes nothing, so replaying a redundant input never
//! fails at this layer.

use crate::error::{SimError, SimResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stratus_core::{ControllerId, Dpid, PortNo};

/// Liveness of a simulated switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchStatus {
    /// Switch is up and forwarding
    Up,
    /// Switch has been crashed
    Crashed,
}

/// Status of a registered directed link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    /// Link is carrying traffic
    Up,
    /// Link has been severed
    Severed,
}

/// Control-channel I/O worker for one switch-controller connection.
///
/// Queues pending receive/send operations; replay permits them one at a
/// time to stay synchronized with controller activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoWorker {
    pending_receives: usize,
    pending_sends: usize,
    permitted_receives: usize,
    permitted_sends: usize,
}

impl IoWorker {
    /// Create an idle worker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one incoming operation awaiting permission
    pub fn queue_receive(&mut self) {
        self.pending_receives += 1;
    }

    /// Queue one outgoing operation awaiting permission
    pub fn queue_send(&mut self) {
        self.pending_sends += 1;
    }

    /// Whether any receive operation is queued
    #[must_use]
    pub fn has_pending_receives(&self) -> bool {
        self.pending_receives > 0
    }

    /// Whether any send operation is queued
    #[must_use]
    pub fn has_pending_sends(&self) -> bool {
        self.pending_sends > 0
    }

    /// Permit exactly one pending receive; no-op when nothing is queued
    pub fn permit_receive(&mut self) {
        if self.pending_receives > 0 {
            self.pending_receives -= 1;
            self.permitted_receives += 1;
        }
    }

    /// Permit exactly one pending send; no-op when nothing is queued
    pub fn permit_send(&mut self) {
        if self.pending_sends > 0 {
            self.pending_sends -= 1;
            self.permitted_sends += 1;
        }
    }

    /// How many receives have been permitted so far
    #[must_use]
    pub fn permitted_receives(&self) -> usize {
        self.permitted_receives
    }

    /// How many sends have been permitted so far
    #[must_use]
    pub fn permitted_sends(&self) -> usize {
        self.permitted_sends
    }
}

/// One control-channel connection from a switch to a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    controller: ControllerId,
    io_worker: IoWorker,
}

impl Connection {
    /// Create a connection to the controller with an idle I/O worker
    #[must_use]
    pub fn new(controller: ControllerId) -> Self {
        Self {
            controller,
            io_worker: IoWorker::new(),
        }
    }

    /// Controller side of the connection
    #[must_use]
    pub fn controller(&self) -> &ControllerId {
        &self.controller
    }

    /// The connection's I/O worker
    #[must_use]
    pub fn io_worker(&self) -> &IoWorker {
        &self.io_worker
    }

    /// Mutable access to the connection's I/O worker
    pub fn io_worker_mut(&mut self) -> &mut IoWorker {
        &mut self.io_worker
    }
}

/// A simulated software switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    dpid: Dpid,
    status: SwitchStatus,
    connections: IndexMap<ControllerId, Connection>,
}

impl Switch {
    /// Create a live switch with no control connections
    #[must_use]
    pub fn new(dpid: Dpid) -> Self {
        Self {
            dpid,
            status: SwitchStatus::Up,
            connections: IndexMap::new(),
        }
    }

    /// Create with a control connection to the controller
    #[must_use]
    pub fn with_connection(mut self, controller: ControllerId) -> Self {
        self.connect(controller);
        self
    }

    /// Datapath id
    #[must_use]
    pub const fn dpid(&self) -> Dpid {
        self.dpid
    }

    /// Current liveness
    #[must_use]
    pub const fn status(&self) -> SwitchStatus {
        self.status
    }

    /// Whether the switch is up
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == SwitchStatus::Up
    }

    /// Crash the switch; crashing an already-crashed switch is a no-op
    pub fn crash(&mut self) {
        tracing::debug!(dpid = %self.dpid, "crashing switch");
        self.status = SwitchStatus::Crashed;
    }

    /// Recover the switch; recovering a live switch is a no-op
    pub fn recover(&mut self) {
        tracing::debug!(dpid = %self.dpid, "recovering switch");
        self.status = SwitchStatus::Up;
    }

    /// Open a control connection to the controller
    pub fn connect(&mut self, controller: ControllerId) -> &mut Connection {
        self.connections
            .entry(controller.clone())
            .or_insert_with(|| Connection::new(controller))
    }

    /// Resolve the control connection to the named controller
    ///
    /// # Errors
    ///
    /// Returns error if no such connection exists
    pub fn connection(&self, controller: &ControllerId) -> SimResult<&Connection> {
        self.connections
            .get(controller)
            .ok_or_else(|| SimError::UnknownConnection {
                dpid: self.dpid,
                controller: controller.clone(),
            })
    }

    /// Mutable access to the control connection to the named controller
    ///
    /// # Errors
    ///
    /// Returns error if no such connection exists
    pub fn connection_mut(&mut self, controller: &ControllerId) -> SimResult<&mut Connection> {
        self.connections
            .get_mut(controller)
            .ok_or_else(|| SimError::UnknownConnection {
                dpid: self.dpid,
                controller: controller.clone(),
            })
    }
}

/// Directed link between two switch ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Source switch
    pub start_dpid: Dpid,
    /// Source port
    pub start_port_no: PortNo,
    /// Destination switch
    pub end_dpid: Dpid,
    /// Destination port
    pub end_port_no: PortNo,
}

impl Link {
    /// Create a directed link from its endpoints
    #[must_use]
    pub const fn new(
        start_dpid: Dpid,
        start_port_no: PortNo,
        end_dpid: Dpid,
        end_port_no: PortNo,
    ) -> Self {
        Self {
            start_dpid,
            start_port_no,
            end_dpid,
            end_port_no,
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.start_dpid, self.start_port_no, self.end_dpid, self.end_port_no
        )
    }
}

/// A host attached to the network at an ingress port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    name: String,
    ingress_dpid: Dpid,
    ingress_port: PortNo,
}

impl Host {
    /// Create a host attached at the ingress
    #[must_use]
    pub fn new(name: impl Into<String>, ingress_dpid: Dpid, ingress_port: PortNo) -> Self {
        Self {
            name: name.into(),
            ingress_dpid,
            ingress_port,
        }
    }

    /// Host name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current ingress attachment point
    #[must_use]
    pub const fn ingress(&self) -> (Dpid, PortNo) {
        (self.ingress_dpid, self.ingress_port)
    }
}

/// The simulated network topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    switches: IndexMap<Dpid, Switch>,
    links: IndexMap<Link, LinkStatus>,
    hosts: Vec<Host>,
}

impl Topology {
    /// Create an empty topology
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a switch
    pub fn add_switch(&mut self, switch: Switch) {
        self.switches.insert(switch.dpid(), switch);
    }

    /// Register a directed link, initially up
    pub fn add_link(&mut self, link: Link) {
        self.links.insert(link, LinkStatus::Up);
    }

    /// Attach a host at an ingress port
    pub fn attach_host(&mut self, host: Host) {
        self.hosts.push(host);
    }

    /// Look up a switch by dpid
    ///
    /// # Errors
    ///
    /// Returns error if the dpid is not registered
    pub fn switch(&self, dpid: Dpid) -> SimResult<&Switch> {
        self.switches.get(&dpid).ok_or(SimError::UnknownSwitch(dpid))
    }

    /// Mutable access to a switch by dpid
    ///
    /// # Errors
    ///
    /// Returns error if the dpid is not registered
    pub fn switch_mut(&mut self, dpid: Dpid) -> SimResult<&mut Switch> {
        self.switches
            .get_mut(&dpid)
            .ok_or(SimError::UnknownSwitch(dpid))
    }

    /// Resolve both endpoint switches and construct the directed link value
    ///
    /// # Errors
    ///
    /// Returns error if either endpoint switch is not registered
    pub fn resolve_link(
        &self,
        start_dpid: Dpid,
        start_port_no: PortNo,
        end_dpid: Dpid,
        end_port_no: PortNo,
    ) -> SimResult<Link> {
        self.switch(start_dpid)?;
        self.switch(end_dpid)?;
        Ok(Link::new(start_dpid, start_port_no, end_dpid, end_port_no))
    }

    /// Current status of a registered link
    #[must_use]
    pub fn link_status(&self, link: &Link) -> Option<LinkStatus> {
        self.links.get(link).copied()
    }

    /// Sever a registered link; severing a severed link is a no-op
    ///
    /// # Errors
    ///
    /// Returns error if the link is not registered
    pub fn sever_link(&mut self, link: &Link) -> SimResult<()> {
        let status = self
            .links
            .get_mut(link)
            .ok_or(SimError::UnknownLink(*link))?;
        tracing::debug!(link = %link, "severing link");
        *status = LinkStatus::Severed;
        Ok(())
    }

    /// Repair a registered link; repairing a live link is a no-op
    ///
    /// # Errors
    ///
    /// Returns error if the link is not registered
    pub fn repair_link(&mut self, link: &Link) -> SimResult<()> {
        let status = self
            .links
            .get_mut(link)
            .ok_or(SimError::UnknownLink(*link))?;
        tracing::debug!(link = %link, "repairing link");
        *status = LinkStatus::Up;
        Ok(())
    }

    /// The host attached at the ingress, if any
    #[must_use]
    pub fn host_at(&self, dpid: Dpid, port: PortNo) -> Option<&Host> {
        self.hosts.iter().find(|h| h.ingress() == (dpid, port))
    }

    /// Move the host attached at the old ingress to the new ingress
    ///
    /// # Errors
    ///
    /// Returns error if no host is attached at the old ingress or the new
    /// switch is not registered
    pub fn migrate_host(
        &mut self,
        old_ingress_dpid: Dpid,
        old_ingress_port_no: PortNo,
        new_ingress_dpid: Dpid,
        new_ingress_port_no: PortNo,
    ) -> SimResult<()> {
        self.switch(new_ingress_dpid)?;
        let host = self
            .hosts
            .iter_mut()
            .find(|h| h.ingress() == (old_ingress_dpid, old_ingress_port_no))
            .ok_or(SimError::NoHostAtIngress {
                dpid: old_ingress_dpid,
                port: old_ingress_port_no,
            })?;
        tracing::debug!(
            host = host.name.as_str(),
            from = %old_ingress_dpid,
            to = %new_ingress_dpid,
            "migrating host ingress"
        );
        host.ingress_dpid = new_ingress_dpid;
        host.ingress_port = new_ingress_port_no;
        Ok(())
    }

    /// Number of registered switches
    #[must_use]
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }
}
