//! STRATUS Simulated Network
//!
//! An in-memory software-defined network for replay to act on: a topology
//! of switches, directed links, and host attachment points; a controller
//! lifecycle manager; a dataplane patch panel gating buffered packets; and
//! a recorded traffic trace source.
//!
//! Replay holds exclusive `&mut` access for the duration of each event
//! action; this crate performs no locking of its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod dataplane;
pub mod error;
pub mod simulation;
pub mod topology;

pub use controller::{Controller, ControllerManager, ControllerStatus};
pub use dataplane::{DataplaneTrace, DpEvent, PatchPanel, TracePacket};
pub use error::{SimError, SimResult};
pub use simulation::Simulation;
pub use topology::{Connection, Host, IoWorker, Link, LinkStatus, Switch, SwitchStatus, Topology};
