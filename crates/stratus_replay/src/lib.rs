//! STRATUS Replay Core
//!
//! Replays a recorded, causally-annotated trace of events against a live
//! simulated network, one event at a time, each event blocking until its
//! precondition in the live system becomes true. The same trace
//! representation supports pruning an injected fault together with its
//! recorded internal dependents, the substrate for minimizing
//! failure-inducing event sequences.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dag;
pub mod error;
pub mod event;
pub mod record;
pub mod registry;
pub mod watcher;

// Re-exports
pub use dag::{EventDag, EventWatchers, Prune, PrunedEvents};
pub use error::{ReplayError, ReplayResult};
pub use event::{Event, InputAction, InputEvent, InternalEvent, InternalOccurrence};
pub use record::{EventRecord, KIND_FIELD};
pub use registry::{EventCtor, EventRegistry, INPUT_EVENT_KINDS, INTERNAL_EVENT_KINDS};
pub use watcher::{EventWatcher, POLL_INTERVAL, Replayer, ReplaySummary};
