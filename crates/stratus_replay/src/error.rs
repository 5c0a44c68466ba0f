//! Error types for trace replay.

use stratus_core::Label;
use stratus_sim::SimError;

/// Result alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Error from trace loading, pruning, or event execution.
///
/// An event reporting "not yet" is not an error; it is the `Ok(false)`
/// return from `proceed` and is retried by its watcher. Everything here is
/// a hard stop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// A required record field is missing or has the wrong shape
    #[error("malformed event record: missing or invalid field `{field}`")]
    MalformedEvent {
        /// Name of the offending field
        field: String,
    },

    /// Two events in one trace share a label
    #[error("duplicate event label: {label}")]
    DuplicateLabel {
        /// The colliding label
        label: Label,
    },

    /// A pruning target label is not present in the trace
    #[error("unknown event label: {label}")]
    UnknownLabel {
        /// The unresolved label
        label: Label,
    },

    /// The pruning target cannot anchor a prune
    #[error("event {label} does not specify dependent_labels")]
    UnprunableEvent {
        /// Label of the rejected target
        label: Label,
    },

    /// A record's kind discriminator matches no registered event kind
    #[error("unknown event kind: {kind}")]
    UnknownEventKind {
        /// The unmatched kind name
        kind: String,
    },

    /// A placeholder event kind with no completion semantics reached replay
    #[error("unsupported event kind {kind}: {label}")]
    UnsupportedEvent {
        /// Kind name of the placeholder
        kind: &'static str,
        /// Label of the offending event
        label: Label,
    },

    /// A simulation collaborator failed
    #[error(transparent)]
    Sim(#[from] SimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReplayError::MalformedEvent {
            field: "dpid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed event record: missing or invalid field `dpid`"
        );

        let err = ReplayError::UnprunableEvent {
            label: Label::from("e2"),
        };
        assert_eq!(err.to_string(), "event e2 does not specify dependent_labels");
    }

    #[test]
    fn test_sim_error_passthrough() {
        let err: ReplayError = SimError::NoTraceConfigured.into();
        assert_eq!(err.to_string(), "no dataplane trace configured");
    }
}
