//! Error types for the simulated network.

use crate::topology::Link;
use stratus_core::{ControllerId, Dpid, PortNo};

/// Result alias for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Error from a simulation collaborator.
///
/// Lookup failures surface unmasked to the replay layer; they are hard
/// stops, not retryable preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// No switch registered under the dpid
    #[error("unknown switch: dpid {0}")]
    UnknownSwitch(Dpid),

    /// No controller registered under the id
    #[error("unknown controller: {0}")]
    UnknownController(ControllerId),

    /// Switch has no control connection to the controller
    #[error("switch {dpid} has no connection to controller {controller}")]
    UnknownConnection {
        /// Switch side of the missing connection
        dpid: Dpid,
        /// Controller side of the missing connection
        controller: ControllerId,
    },

    /// Endpoints do not name a registered directed link
    #[error("unknown link: {0}")]
    UnknownLink(Link),

    /// No host attached at the ingress
    #[error("no host attached at {dpid}:{port}")]
    NoHostAtIngress {
        /// Ingress switch
        dpid: Dpid,
        /// Ingress port
        port: PortNo,
    },

    /// No dataplane trace source configured
    #[error("no dataplane trace configured")]
    NoTraceConfigured,

    /// Dataplane trace has no more packets to inject
    #[error("dataplane trace exhausted")]
    TraceExhausted,
}
