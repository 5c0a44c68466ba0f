//! Validating accessor over one parsed trace record.
//!
//! The external trace parser produces one JSON object per event. Event
//! constructors pull their required fields through these accessors, which
//! fail fast naming the offending field so a malformed trace is never
//! partially loaded.

use crate::error::{ReplayError, ReplayResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use stratus_core::{ControllerId, DpOutId, Dpid, Label, PortNo};

/// The field carrying the event kind discriminator
pub const KIND_FIELD: &str = "class";

/// One parsed trace record: a field set with typed, validating accessors
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    fields: Map<String, Value>,
}

impl EventRecord {
    /// Wrap a parsed JSON value
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object
    pub fn from_value(value: Value) -> ReplayResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ReplayError::MalformedEvent {
                field: "record".to_string(),
            }),
        }
    }

    /// Raw access to a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The event's label
    ///
    /// # Errors
    ///
    /// Returns error if the label is absent
    pub fn label(&self) -> ReplayResult<Label> {
        self.require_str("label").map(Label::from)
    }

    /// The kind discriminator used for registry dispatch
    ///
    /// # Errors
    ///
    /// Returns error if the discriminator is absent
    pub fn kind(&self) -> ReplayResult<&str> {
        self.require_str(KIND_FIELD)
    }

    /// A required string field
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or not a string
    pub fn require_str(&self, field: &str) -> ReplayResult<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| ReplayError::MalformedEvent {
                field: field.to_string(),
            })
    }

    /// A required integer field; numeric strings are accepted
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or non-numeric
    pub fn require_u64(&self, field: &str) -> ReplayResult<u64> {
        let value = self.fields.get(field);
        let parsed = match value {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| ReplayError::MalformedEvent {
            field: field.to_string(),
        })
    }

    /// A required float field; integers and numeric strings are accepted
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or non-numeric
    pub fn require_f64(&self, field: &str) -> ReplayResult<f64> {
        let value = self.fields.get(field);
        let parsed = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| ReplayError::MalformedEvent {
            field: field.to_string(),
        })
    }

    /// A required dpid field
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or non-numeric
    pub fn dpid(&self, field: &str) -> ReplayResult<Dpid> {
        self.require_u64(field).map(Dpid::new)
    }

    /// A required port number field
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or out of range
    pub fn port_no(&self, field: &str) -> ReplayResult<PortNo> {
        let raw = self.require_u64(field)?;
        u32::try_from(raw)
            .map(PortNo::new)
            .map_err(|_| ReplayError::MalformedEvent {
                field: field.to_string(),
            })
    }

    /// A required buffered-dataplane-event id field
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent
    pub fn dpout_id(&self, field: &str) -> ReplayResult<DpOutId> {
        self.require_str(field).map(DpOutId::from)
    }

    /// A required two-part controller identity, recorded as a two-element
    /// sequence `[name, instance]`; the instance accepts numbers or
    /// numeric strings
    ///
    /// # Errors
    ///
    /// Returns error naming the field if absent or malformed
    pub fn controller_id(&self, field: &str) -> ReplayResult<ControllerId> {
        let malformed = || ReplayError::MalformedEvent {
            field: field.to_string(),
        };
        let parts = self
            .fields
            .get(field)
            .and_then(Value::as_array)
            .ok_or_else(malformed)?;
        if parts.len() != 2 {
            return Err(malformed());
        }
        let name = parts[0].as_str().ok_or_else(malformed)?;
        let instance = match &parts[1] {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(malformed)?;
        Ok(ControllerId::new(name, instance))
    }

    /// The optional set of dependent internal-event labels. Absence means
    /// the event has no known dependents
    ///
    /// # Errors
    ///
    /// Returns error if the field is present but not a string array
    pub fn dependent_labels(&self) -> ReplayResult<Option<BTreeSet<Label>>> {
        let Some(value) = self.fields.get("dependent_labels") else {
            return Ok(None);
        };
        let malformed = || ReplayError::MalformedEvent {
            field: "dependent_labels".to_string(),
        };
        let entries = value.as_array().ok_or_else(malformed)?;
        let mut labels = BTreeSet::new();
        for entry in entries {
            labels.insert(Label::from(entry.as_str().ok_or_else(malformed)?));
        }
        Ok(Some(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> EventRecord {
        EventRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_non_object_record() {
        let result = EventRecord::from_value(json!(["not", "an", "object"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_label_and_kind() {
        let record = record(json!({"label": "e1", "class": "SwitchFailure"}));
        assert_eq!(record.label().unwrap(), Label::from("e1"));
        assert_eq!(record.kind().unwrap(), "SwitchFailure");
    }

    #[test]
    fn test_missing_field_names_field() {
        let record = record(json!({"label": "e1"}));
        let err = record.dpid("dpid").unwrap_err();
        assert_eq!(
            err,
            ReplayError::MalformedEvent {
                field: "dpid".to_string(),
            }
        );
    }

    #[test]
    fn test_numeric_string_coercion() {
        let record = record(json!({"dpid": "7", "time": "0.5"}));
        assert_eq!(record.dpid("dpid").unwrap(), Dpid::new(7));
        assert_eq!(record.require_f64("time").unwrap(), 0.5);
    }

    #[test]
    fn test_controller_id_parsing() {
        let rec1 = record(json!({"uuid": ["controllerA", 0]}));
        let id = rec1.controller_id("uuid").unwrap();
        assert_eq!(id, ControllerId::new("controllerA", 0));

        let rec2 = record(json!({"uuid": ["controllerA", "2"]}));
        assert_eq!(
            rec2.controller_id("uuid").unwrap(),
            ControllerId::new("controllerA", 2)
        );
    }

    #[test]
    fn test_controller_id_malformed() {
        let rec1 = record(json!({"uuid": ["only-name"]}));
        assert!(rec1.controller_id("uuid").is_err());

        let rec2 = record(json!({"uuid": "not-a-pair"}));
        assert!(rec2.controller_id("uuid").is_err());
    }

    #[test]
    fn test_dependent_labels_absent() {
        let record = record(json!({"label": "e1"}));
        assert_eq!(record.dependent_labels().unwrap(), None);
    }

    #[test]
    fn test_dependent_labels_present() {
        let record = record(json!({"dependent_labels": ["e2", "e3"]}));
        let labels = record.dependent_labels().unwrap().unwrap();
        assert!(labels.contains(&Label::from("e2")));
        assert!(labels.contains(&Label::from("e3")));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_dependent_labels_wrong_shape() {
        let record = record(json!({"dependent_labels": "e2"}));
        assert!(record.dependent_labels().is_err());
    }
}
