//! Ordered trace of events with label-indexed lookup and pruning views.
//!
//! The dag is constructed once from a parsed trace and read-only after;
//! every view is a fresh lazy iterator, so trace order is preserved and a
//! partially consumed pass never affects the next one.
//!
//! The dependency relation is carried as label sets resolved through a
//! single lookup table, never as event-to-event references. Pruning is
//! single-level: it trusts the recorded annotation and does not chase
//! dependents of dependents.

use crate::error::{ReplayError, ReplayResult};
use crate::event::Event;
use crate::watcher::EventWatcher;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use stratus_core::Label;

/// Target of a pruning request: a label resolved through the dag, or an
/// event reference trusted as-is
#[derive(Debug, Clone, Copy)]
pub enum Prune<'a> {
    /// Prune the event under this label
    Label(&'a Label),
    /// Prune this event
    Event(&'a Event),
}

impl<'a> From<&'a Label> for Prune<'a> {
    fn from(label: &'a Label) -> Self {
        Prune::Label(label)
    }
}

impl<'a> From<&'a Event> for Prune<'a> {
    fn from(event: &'a Event) -> Self {
        Prune::Event(event)
    }
}

/// A collection of events in trace order.
///
/// Primarily used to present a view of the underlying trace with one
/// injected event and all of its recorded internal dependents pruned.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDag {
    events: Vec<Event>,
    label_index: IndexMap<Label, usize>,
}

impl EventDag {
    /// Build a dag from events in trace order
    ///
    /// # Errors
    ///
    /// Returns error if two events share a label
    pub fn new(events: Vec<Event>) -> ReplayResult<Self> {
        let mut label_index = IndexMap::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            if label_index.insert(event.label().clone(), index).is_some() {
                return Err(ReplayError::DuplicateLabel {
                    label: event.label().clone(),
                });
            }
        }
        Ok(Self {
            events,
            label_index,
        })
    }

    /// Number of events in the trace
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the trace is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Look up an event by label
    #[must_use]
    pub fn get(&self, label: &Label) -> Option<&Event> {
        self.label_index.get(label).map(|&index| &self.events[index])
    }

    /// All events in trace order; each call yields a fresh full pass
    pub fn events(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Events in trace order with the pruned event and all of its recorded
    /// internal dependents excluded
    ///
    /// # Errors
    ///
    /// Returns error if a label target is not in the trace, or the target
    /// does not specify `dependent_labels` (internal events and
    /// dependent-less input events cannot anchor a prune)
    pub fn events_pruned<'a, 'p>(
        &'a self,
        prune: impl Into<Prune<'p>>,
    ) -> ReplayResult<PrunedEvents<'a>> {
        let excluded = self.exclusion_set(prune.into())?;
        Ok(PrunedEvents {
            events: self.events.iter(),
            excluded,
        })
    }

    /// A fresh watcher around every event, in trace order
    pub fn event_watchers(&self) -> EventWatchers<'_> {
        EventWatchers {
            events: PrunedEvents {
                events: self.events.iter(),
                excluded: BTreeSet::new(),
            },
        }
    }

    /// A fresh watcher around every surviving event after pruning
    ///
    /// # Errors
    ///
    /// Fails exactly as [`EventDag::events_pruned`] does
    pub fn event_watchers_pruned<'a, 'p>(
        &'a self,
        prune: impl Into<Prune<'p>>,
    ) -> ReplayResult<EventWatchers<'a>> {
        Ok(EventWatchers {
            events: self.events_pruned(prune)?,
        })
    }

    fn exclusion_set(&self, prune: Prune<'_>) -> ReplayResult<BTreeSet<Label>> {
        let target = match prune {
            Prune::Label(label) => self.get(label).ok_or_else(|| ReplayError::UnknownLabel {
                label: label.clone(),
            })?,
            Prune::Event(event) => event,
        };
        let dependents =
            target
                .dependent_labels()
                .ok_or_else(|| ReplayError::UnprunableEvent {
                    label: target.label().clone(),
                })?;
        let mut excluded = dependents.clone();
        excluded.insert(target.label().clone());
        Ok(excluded)
    }
}

/// Lazy view over a dag's events with an exclusion set applied
#[derive(Debug, Clone)]
pub struct PrunedEvents<'a> {
    events: std::slice::Iter<'a, Event>,
    excluded: BTreeSet<Label>,
}

impl<'a> Iterator for PrunedEvents<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        let excluded = &self.excluded;
        self.events.find(|event| !excluded.contains(event.label()))
    }
}

/// Lazy view wrapping each surviving event in a fresh watcher
#[derive(Debug, Clone)]
pub struct EventWatchers<'a> {
    events: PrunedEvents<'a>,
}

impl<'a> Iterator for EventWatchers<'a> {
    type Item = EventWatcher<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next().map(EventWatcher::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InputAction, InputEvent, InternalEvent, InternalOccurrence};
    use proptest::prelude::*;
    use stratus_core::Dpid;

    fn input(label: &str, dependents: Option<&[&str]>) -> Event {
        let event = InputEvent::new(
            Label::from(label),
            InputAction::SwitchFailure { dpid: Dpid::new(1) },
        );
        match dependents {
            Some(labels) => Event::Input(
                event.with_dependent_labels(labels.iter().map(|l| Label::from(*l)).collect()),
            ),
            None => Event::Input(event),
        }
    }

    fn internal(label: &str) -> Event {
        Event::Internal(InternalEvent::new(
            Label::from(label),
            InternalOccurrence::TimerEvent,
        ))
    }

    fn labels_of<'a>(events: impl Iterator<Item = &'a Event>) -> Vec<String> {
        events.map(|e| e.label().to_string()).collect()
    }

    #[test]
    fn test_events_preserve_trace_order() {
        let dag = EventDag::new(vec![input("e1", None), internal("e2"), input("e3", None)])
            .unwrap();
        assert_eq!(labels_of(dag.events()), vec!["e1", "e2", "e3"]);
        assert_eq!(dag.len(), 3);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = EventDag::new(vec![input("e1", None), internal("e1")]);
        assert_eq!(
            result.unwrap_err(),
            ReplayError::DuplicateLabel {
                label: Label::from("e1"),
            }
        );
    }

    #[test]
    fn test_label_lookup() {
        let dag = EventDag::new(vec![input("e1", None), internal("e2")]).unwrap();
        assert_eq!(dag.get(&Label::from("e2")).unwrap().kind_name(), "TimerEvent");
        assert!(dag.get(&Label::from("e9")).is_none());
    }

    #[test]
    fn test_prune_excludes_target_and_dependents() {
        let dag = EventDag::new(vec![
            input("e1", Some(&["e2"])),
            internal("e2"),
            input("e3", None),
        ])
        .unwrap();

        let survivors = dag.events_pruned(&Label::from("e1")).unwrap();
        assert_eq!(labels_of(survivors), vec!["e3"]);
    }

    #[test]
    fn test_prune_by_event_reference() {
        let dag = EventDag::new(vec![
            input("e1", Some(&["e2"])),
            internal("e2"),
            input("e3", None),
        ])
        .unwrap();

        let target = dag.get(&Label::from("e1")).unwrap().clone();
        let survivors = dag.events_pruned(&target).unwrap();
        assert_eq!(labels_of(survivors), vec!["e3"]);
    }

    #[test]
    fn test_prune_unknown_label() {
        let dag = EventDag::new(vec![input("e1", Some(&["e2"])), internal("e2")]).unwrap();
        let result = dag.events_pruned(&Label::from("e9"));
        assert_eq!(
            result.unwrap_err(),
            ReplayError::UnknownLabel {
                label: Label::from("e9"),
            }
        );
    }

    #[test]
    fn test_prune_internal_event_rejected() {
        let dag = EventDag::new(vec![input("e1", Some(&["e2"])), internal("e2")]).unwrap();
        let result = dag.events_pruned(&Label::from("e2"));
        assert_eq!(
            result.unwrap_err(),
            ReplayError::UnprunableEvent {
                label: Label::from("e2"),
            }
        );
        // A failed request leaves the dag untouched
        assert_eq!(dag.len(), 2);
    }

    #[test]
    fn test_prune_dependent_less_input_rejected() {
        let dag = EventDag::new(vec![input("e1", None), internal("e2")]).unwrap();
        let result = dag.events_pruned(&Label::from("e1"));
        assert_eq!(
            result.unwrap_err(),
            ReplayError::UnprunableEvent {
                label: Label::from("e1"),
            }
        );
    }

    #[test]
    fn test_events_restartable_after_partial_consumption() {
        let dag = EventDag::new(vec![input("e1", None), internal("e2"), input("e3", None)])
            .unwrap();

        let mut first = dag.events();
        assert_eq!(first.next().unwrap().label(), &Label::from("e1"));

        // A fresh call yields the full trace regardless of the first pass
        assert_eq!(labels_of(dag.events()), vec!["e1", "e2", "e3"]);
        assert_eq!(labels_of(dag.events()), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_event_watchers_wrap_survivors() {
        let dag = EventDag::new(vec![
            input("e1", Some(&["e2"])),
            internal("e2"),
            input("e3", None),
        ])
        .unwrap();

        let watchers: Vec<_> = dag.event_watchers().collect();
        assert_eq!(watchers.len(), 3);

        let pruned: Vec<_> = dag
            .event_watchers_pruned(&Label::from("e1"))
            .unwrap()
            .collect();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].event().label(), &Label::from("e3"));
    }

    proptest::proptest! {
        #[test]
        fn prop_pruning_exclusion_complete(
            n in 2usize..12,
            dep_mask in proptest::collection::vec(any::<bool>(), 12)
        ) {
            // Even positions are inputs, odd positions are internals; the
            // first input carries a masked subset of the internals as its
            // recorded dependents.
            let internal_labels: Vec<String> = (0..n)
                .filter(|i| i % 2 == 1)
                .map(|i| format!("e{}", i))
                .collect();
            let dependents: Vec<&str> = internal_labels
                .iter()
                .enumerate()
                .filter(|(j, _)| dep_mask[*j])
                .map(|(_, l)| l.as_str())
                .collect();

            let mut events = vec![input("e0", Some(&dependents))];
            for i in 1..n {
                if i % 2 == 1 {
                    events.push(internal(&format!("e{}", i)));
                } else {
                    events.push(input(&format!("e{}", i), None));
                }
            }

            let dag = EventDag::new(events).unwrap();
            let excluded: std::collections::BTreeSet<String> = dependents
                .iter()
                .map(|l| l.to_string())
                .chain(std::iter::once("e0".to_string()))
                .collect();

            let survivors = labels_of(dag.events_pruned(&Label::from("e0")).unwrap());
            let expected: Vec<String> = labels_of(dag.events())
                .into_iter()
                .filter(|l| !excluded.contains(l))
                .collect();

            prop_assert_eq!(survivors, expected);
        }
    }
}
