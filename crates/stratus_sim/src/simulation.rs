//! The live simulation facade mutated during replay.

use crate::controller::ControllerManager;
use crate::dataplane::{DataplaneTrace, PatchPanel, TracePacket};
use crate::error::{SimError, SimResult};
use crate::topology::Topology;

/// The simulated deployment a trace is replayed against.
///
/// Owns the topology, the controller manager, the patch panel, and the
/// optional dataplane trace source. Replay mutates it one event action at
/// a time through an exclusive borrow.
#[derive(Debug, Default)]
pub struct Simulation {
    /// Switches, links, and host attachment points
    pub topology: Topology,
    /// Controller lifecycle manager
    pub controllers: ControllerManager,
    /// Dataplane packet gating
    pub patch_panel: PatchPanel,
    /// Recorded traffic source, if configured
    pub dataplane_trace: Option<DataplaneTrace>,
}

impl Simulation {
    /// Create an empty simulation with no dataplane trace configured
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a recorded dataplane trace source
    #[must_use]
    pub fn with_dataplane_trace(mut self, trace: DataplaneTrace) -> Self {
        self.dataplane_trace = Some(trace);
        self
    }

    /// Inject the next queued trace packet
    ///
    /// # Errors
    ///
    /// Returns error if no trace source is configured or the trace is
    /// exhausted
    pub fn inject_trace_event(&mut self) -> SimResult<TracePacket> {
        match self.dataplane_trace.as_mut() {
            Some(trace) => trace.inject_trace_event(),
            None => Err(SimError::NoTraceConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::{Dpid, PortNo};

    #[test]
    fn test_inject_without_trace_configured() {
        let mut sim = Simulation::new();
        let result = sim.inject_trace_event();
        assert_eq!(result.unwrap_err(), SimError::NoTraceConfigured);
    }

    #[test]
    fn test_inject_with_trace() {
        let trace = DataplaneTrace::new(vec![TracePacket::new(
            Dpid::new(1),
            PortNo::new(2),
            vec![0xab],
        )]);
        let mut sim = Simulation::new().with_dataplane_trace(trace);

        let packet = sim.inject_trace_event().unwrap();
        assert_eq!(packet.dpid, Dpid::new(1));
        assert_eq!(sim.dataplane_trace.as_ref().unwrap().injected(), 1);
    }
}
