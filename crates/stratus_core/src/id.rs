//! Identifiers for simulated network entities and trace events.
//!
//! Dpids and port numbers are plain integers on the wire; controller
//! identities are two-part (instance name, numeric id) pairs. All ids are
//! ordered so they can key deterministic maps and sets.

use serde::{Deserialize, Serialize};

/// Datapath identifier of a simulated network switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dpid(u64);

impl Dpid {
    /// Create a dpid from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Dpid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for Dpid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Switch port number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortNo(u32);

impl PortNo {
    /// Create a port number from its raw value
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PortNo {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for PortNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two-part controller identity: instance name plus numeric id.
///
/// Traces record controller identities as a two-element sequence, e.g.
/// `["controllerA", 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId {
    name: String,
    instance: u64,
}

impl ControllerId {
    /// Create a controller id from its two parts
    #[must_use]
    pub fn new(name: impl Into<String>, instance: u64) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    /// Instance name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric instance id
    #[must_use]
    pub const fn instance(&self) -> u64 {
        self.instance
    }
}

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.instance)
    }
}

/// Identifier of a dataplane packet event buffered in the patch panel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DpOutId(String);

impl DpOutId {
    /// Create a buffered-event id
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DpOutId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for DpOutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event label, globally unique within a trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(String);

impl Label {
    /// Create a label
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Label {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpid_roundtrip() {
        let dpid = Dpid::new(7);
        assert_eq!(dpid.as_u64(), 7);
        assert_eq!(Dpid::from(7), dpid);
        assert_eq!(format!("{}", dpid), "7");
    }

    #[test]
    fn test_port_no_roundtrip() {
        let port = PortNo::new(3);
        assert_eq!(port.as_u32(), 3);
        assert_eq!(format!("{}", port), "3");
    }

    #[test]
    fn test_controller_id_parts() {
        let id = ControllerId::new("controllerA", 0);
        assert_eq!(id.name(), "controllerA");
        assert_eq!(id.instance(), 0);
        assert_eq!(format!("{}", id), "controllerA:0");
    }

    #[test]
    fn test_controller_id_equality() {
        let a = ControllerId::new("c1", 0);
        let b = ControllerId::new("c1", 0);
        let c = ControllerId::new("c1", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_label_ordering() {
        let mut labels = vec![Label::from("e3"), Label::from("e1"), Label::from("e2")];
        labels.sort();
        assert_eq!(labels[0].as_str(), "e1");
        assert_eq!(labels[2].as_str(), "e3");
    }

    #[test]
    fn test_id_serialization() {
        let id = ControllerId::new("controllerA", 2);
        let encoded = serde_json::to_string(&id).unwrap();
        let decoded: ControllerId = serde_json::from_str(&encoded).unwrap();
        assert_eq!(id, decoded);
    }
}
