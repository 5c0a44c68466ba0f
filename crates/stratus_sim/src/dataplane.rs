//! Dataplane patch panel and recorded traffic trace.
//!
//! The patch panel sits between simulated switches and buffers dataplane
//! packet events until replay decides their fate: dropped, or permitted
//! onto the wire. Buffered events may arrive with a delay, modeling the
//! asynchrony of the network being replayed against.

use crate::error::{SimError, SimResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use stratus_core::{DpOutId, Dpid, PortNo};
use tokio::time::Instant;

/// A dataplane packet event buffered in the patch panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpEvent {
    /// Buffered-event identifier
    pub id: DpOutId,
    /// Switch that emitted the packet
    pub dpid: Dpid,
    /// Output port
    pub port: PortNo,
    /// Packet bytes
    pub payload: Vec<u8>,
}

impl DpEvent {
    /// Create a dataplane packet event
    #[must_use]
    pub fn new(id: DpOutId, dpid: Dpid, port: PortNo, payload: Vec<u8>) -> Self {
        Self {
            id,
            dpid,
            port,
            payload,
        }
    }
}

/// Gates buffered dataplane packet events between simulated switches
#[derive(Debug, Default)]
pub struct PatchPanel {
    buffered: IndexMap<DpOutId, DpEvent>,
    in_flight: Vec<(Instant, DpEvent)>,
    dropped: Vec<DpOutId>,
    permitted: Vec<DpOutId>,
}

impl PatchPanel {
    /// Create an empty patch panel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a dataplane event, immediately visible
    pub fn buffer(&mut self, event: DpEvent) {
        self.buffered.insert(event.id.clone(), event);
    }

    /// Buffer a dataplane event that becomes visible once `delay` elapses
    /// on the runtime clock
    pub fn buffer_in_flight(&mut self, event: DpEvent, delay: Duration) {
        self.in_flight.push((Instant::now() + delay, event));
    }

    fn promote_due(&mut self) {
        let now = Instant::now();
        let mut still_in_flight = Vec::new();
        for (deadline, event) in self.in_flight.drain(..) {
            if deadline <= now {
                self.buffered.insert(event.id.clone(), event);
            } else {
                still_in_flight.push((deadline, event));
            }
        }
        self.in_flight = still_in_flight;
    }

    /// The buffered event under the id, or absent if it has not arrived
    pub fn get_buffered_dp_event(&mut self, id: &DpOutId) -> Option<&DpEvent> {
        self.promote_due();
        self.buffered.get(id)
    }

    /// Drop the buffered event, removing it from the network
    pub fn drop_dp_event(&mut self, id: &DpOutId) -> Option<DpEvent> {
        let event = self.buffered.shift_remove(id)?;
        tracing::debug!(dpout_id = %id, "dropping dataplane event");
        self.dropped.push(id.clone());
        Some(event)
    }

    /// Permit the buffered event onto the wire
    pub fn permit_dp_event(&mut self, id: &DpOutId) -> Option<DpEvent> {
        let event = self.buffered.shift_remove(id)?;
        tracing::debug!(dpout_id = %id, "permitting dataplane event");
        self.permitted.push(id.clone());
        Some(event)
    }

    /// Ids of events dropped so far, in drop order
    #[must_use]
    pub fn dropped(&self) -> &[DpOutId] {
        &self.dropped
    }

    /// Ids of events permitted so far, in permit order
    #[must_use]
    pub fn permitted(&self) -> &[DpOutId] {
        &self.permitted
    }

    /// Number of currently visible buffered events
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }
}

/// One recorded packet in a dataplane trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePacket {
    /// Ingress switch the packet enters at
    pub dpid: Dpid,
    /// Ingress port
    pub port: PortNo,
    /// Packet bytes
    pub payload: Vec<u8>,
}

impl TracePacket {
    /// Create a recorded packet
    #[must_use]
    pub fn new(dpid: Dpid, port: PortNo, payload: Vec<u8>) -> Self {
        Self {
            dpid,
            port,
            payload,
        }
    }
}

/// FIFO source of recorded dataplane traffic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataplaneTrace {
    pending: VecDeque<TracePacket>,
    injected: usize,
}

impl DataplaneTrace {
    /// Create a trace from recorded packets in injection order
    #[must_use]
    pub fn new(packets: Vec<TracePacket>) -> Self {
        Self {
            pending: packets.into(),
            injected: 0,
        }
    }

    /// Inject the next queued packet into the network
    ///
    /// # Errors
    ///
    /// Returns error if no packets remain
    pub fn inject_trace_event(&mut self) -> SimResult<TracePacket> {
        let packet = self.pending.pop_front().ok_or(SimError::TraceExhausted)?;
        self.injected += 1;
        tracing::debug!(dpid = %packet.dpid, port = %packet.port, "injecting trace packet");
        Ok(packet)
    }

    /// How many packets have been injected so far
    #[must_use]
    pub const fn injected(&self) -> usize {
        self.injected
    }

    /// How many packets remain
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(id: &str) -> DpEvent {
        DpEvent::new(
            DpOutId::from(id),
            Dpid::new(1),
            PortNo::new(1),
            vec![0xca, 0xfe],
        )
    }

    #[test]
    fn test_buffer_and_get() {
        let mut panel = PatchPanel::new();
        let id = DpOutId::from("p1");
        assert!(panel.get_buffered_dp_event(&id).is_none());

        panel.buffer(packet("p1"));
        assert!(panel.get_buffered_dp_event(&id).is_some());
        assert_eq!(panel.buffered_len(), 1);
    }

    #[test]
    fn test_drop_dp_event() {
        let mut panel = PatchPanel::new();
        panel.buffer(packet("p1"));

        let id = DpOutId::from("p1");
        let dropped = panel.drop_dp_event(&id);
        assert!(dropped.is_some());
        assert_eq!(panel.dropped(), &[id.clone()]);
        assert!(panel.get_buffered_dp_event(&id).is_none());
    }

    #[test]
    fn test_permit_dp_event() {
        let mut panel = PatchPanel::new();
        panel.buffer(packet("p2"));

        let id = DpOutId::from("p2");
        assert!(panel.permit_dp_event(&id).is_some());
        assert_eq!(panel.permitted(), &[id]);
        assert!(panel.dropped().is_empty());
    }

    #[test]
    fn test_drop_absent_event() {
        let mut panel = PatchPanel::new();
        assert!(panel.drop_dp_event(&DpOutId::from("ghost")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_arrival() {
        let mut panel = PatchPanel::new();
        let id = DpOutId::from("p1");
        panel.buffer_in_flight(packet("p1"), Duration::from_millis(300));

        assert!(panel.get_buffered_dp_event(&id).is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(panel.get_buffered_dp_event(&id).is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(panel.get_buffered_dp_event(&id).is_some());
    }

    #[test]
    fn test_trace_injection_order() {
        let mut trace = DataplaneTrace::new(vec![
            TracePacket::new(Dpid::new(1), PortNo::new(1), vec![1]),
            TracePacket::new(Dpid::new(2), PortNo::new(1), vec![2]),
        ]);

        let first = trace.inject_trace_event().unwrap();
        assert_eq!(first.payload, vec![1]);
        assert_eq!(trace.injected(), 1);
        assert_eq!(trace.remaining(), 1);
    }

    #[test]
    fn test_trace_exhausted() {
        let mut trace = DataplaneTrace::new(Vec::new());
        let result = trace.inject_trace_event();
        assert_eq!(result.unwrap_err(), SimError::TraceExhausted);
    }
}
