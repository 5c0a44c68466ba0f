//! STRATUS Core Types
//!
//! This crate contains the pure identifier types shared across the
//! workspace, with no I/O. All types are serializable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod id;

// Re-exports
pub use id::{ControllerId, DpOutId, Dpid, Label, PortNo};
