//! Per-event retry protocol and the sequential replay driver.

use crate::dag::{EventDag, EventWatchers, Prune};
use crate::error::ReplayResult;
use crate::event::Event;
use std::time::Duration;
use stratus_sim::Simulation;

/// Default interval between precondition polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Watches one event through to completion.
///
/// Wraps an event for a single replay attempt: calls `proceed` until it
/// reports done, sleeping the poll interval between attempts. No upper
/// bound on attempts or elapsed time is enforced here; a never-satisfied
/// precondition blocks replay until the surrounding driver intervenes.
#[derive(Debug, Clone)]
pub struct EventWatcher<'a> {
    event: &'a Event,
    poll_interval: Duration,
    attempts: u32,
}

impl<'a> EventWatcher<'a> {
    /// Wrap an event with the default poll interval
    #[must_use]
    pub fn new(event: &'a Event) -> Self {
        Self {
            event,
            poll_interval: POLL_INTERVAL,
            attempts: 0,
        }
    }

    /// Override the poll interval; the retry contract is unchanged
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The wrapped event
    #[must_use]
    pub fn event(&self) -> &Event {
        self.event
    }

    /// How many `proceed` calls this watcher has issued
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run the event to completion.
    ///
    /// # Errors
    ///
    /// Propagates the first error from `proceed`; errors are never
    /// retried, only the "not yet" signal is
    pub async fn run(&mut self, sim: &mut Simulation) -> ReplayResult<()> {
        tracing::debug!(event = %self.event, "executing");
        loop {
            self.attempts += 1;
            if self.event.proceed(sim).await? {
                break;
            }
            tracing::debug!(
                event = %self.event,
                attempts = self.attempts,
                "precondition not satisfied; retrying"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
        tracing::debug!(event = %self.event, attempts = self.attempts, "finished executing");
        Ok(())
    }
}

/// Outcome of a completed replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// How many events ran to completion
    pub events_replayed: usize,
}

/// Sequential replay driver.
///
/// Wraps each event of a (possibly pruned) trace view in a fresh watcher
/// and runs the watchers strictly in order: event *n+1* starts only after
/// event *n* completes. The first error aborts the replay.
#[derive(Debug, Clone)]
pub struct Replayer {
    dag: EventDag,
    poll_interval: Duration,
}

impl Replayer {
    /// Create a driver over a trace
    #[must_use]
    pub fn new(dag: EventDag) -> Self {
        Self {
            dag,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the poll interval applied to every watcher
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The replayed trace
    #[must_use]
    pub fn dag(&self) -> &EventDag {
        &self.dag
    }

    /// Replay the full trace in order
    ///
    /// # Errors
    ///
    /// Returns the first event error; earlier events stay applied
    pub async fn run(&self, sim: &mut Simulation) -> ReplayResult<ReplaySummary> {
        self.drive(self.dag.event_watchers(), sim).await
    }

    /// Replay the trace with the pruned event and its recorded dependents
    /// excluded
    ///
    /// # Errors
    ///
    /// Fails as [`EventDag::events_pruned`] does, or with the first event
    /// error
    pub async fn run_pruned<'p>(
        &self,
        prune: impl Into<Prune<'p>>,
        sim: &mut Simulation,
    ) -> ReplayResult<ReplaySummary> {
        let watchers = self.dag.event_watchers_pruned(prune)?;
        self.drive(watchers, sim).await
    }

    async fn drive(
        &self,
        watchers: EventWatchers<'_>,
        sim: &mut Simulation,
    ) -> ReplayResult<ReplaySummary> {
        let mut events_replayed = 0;
        for watcher in watchers {
            let mut watcher = watcher.with_poll_interval(self.poll_interval);
            watcher.run(sim).await?;
            events_replayed += 1;
        }
        tracing::info!(events = events_replayed, "replay finished");
        Ok(ReplaySummary { events_replayed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;
    use crate::event::{InputAction, InputEvent, InternalEvent, InternalOccurrence};
    use stratus_core::{Dpid, Label};
    use stratus_sim::{SimError, Switch};

    fn switch_failure(label: &str, dpid: u64) -> Event {
        Event::Input(InputEvent::new(
            Label::from(label),
            InputAction::SwitchFailure {
                dpid: Dpid::new(dpid),
            },
        ))
    }

    fn sim_with_switch(dpid: u64) -> Simulation {
        let mut sim = Simulation::new();
        sim.topology.add_switch(Switch::new(Dpid::new(dpid)));
        sim
    }

    #[tokio::test]
    async fn test_watcher_completes_on_first_attempt() {
        let event = switch_failure("e1", 1);
        let mut sim = sim_with_switch(1);

        let mut watcher = EventWatcher::new(&event);
        watcher.run(&mut sim).await.unwrap();
        assert_eq!(watcher.attempts(), 1);
    }

    #[tokio::test]
    async fn test_watcher_propagates_error_without_retry() {
        let event = switch_failure("e1", 9);
        let mut sim = sim_with_switch(1);

        let mut watcher = EventWatcher::new(&event);
        let err = watcher.run(&mut sim).await.unwrap_err();
        assert_eq!(err, ReplayError::Sim(SimError::UnknownSwitch(Dpid::new(9))));
        assert_eq!(watcher.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_retries_forever_on_never_satisfied_precondition() {
        let event = Event::Input(InputEvent::new(
            Label::from("e1"),
            InputAction::PolicyChange {
                request_type: "allow".to_string(),
            },
        ));
        let mut sim = Simulation::new();

        let mut watcher = EventWatcher::new(&event);
        let result =
            tokio::time::timeout(Duration::from_secs(2), watcher.run(&mut sim)).await;
        assert!(result.is_err());
        assert!(watcher.attempts() > 1);
    }

    #[tokio::test]
    async fn test_replayer_runs_in_order() {
        let dag = EventDag::new(vec![switch_failure("e1", 1), switch_failure("e2", 1)])
            .unwrap();
        let mut sim = sim_with_switch(1);

        let summary = Replayer::new(dag).run(&mut sim).await.unwrap();
        assert_eq!(summary.events_replayed, 2);
    }

    #[tokio::test]
    async fn test_replayer_stops_at_first_error() {
        let unsupported = Event::Internal(InternalEvent::new(
            Label::from("e2"),
            InternalOccurrence::TimerEvent,
        ));
        let dag = EventDag::new(vec![
            switch_failure("e1", 1),
            unsupported,
            switch_failure("e3", 1),
        ])
        .unwrap();
        let mut sim = sim_with_switch(1);

        let err = Replayer::new(dag).run(&mut sim).await.unwrap_err();
        assert!(matches!(err, ReplayError::UnsupportedEvent { .. }));
        // The first event was applied before the stop
        assert!(!sim.topology.switch(Dpid::new(1)).unwrap().is_alive());
    }
}
