//! Controller lifecycle management.

use crate::error::{SimError, SimResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stratus_core::ControllerId;

/// Liveness of a simulated controller process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerStatus {
    /// Controller is running
    Alive,
    /// Controller has been killed
    Dead,
}

/// A simulated controller process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    id: ControllerId,
    status: ControllerStatus,
}

impl Controller {
    /// Create a running controller
    #[must_use]
    pub fn new(id: ControllerId) -> Self {
        Self {
            id,
            status: ControllerStatus::Alive,
        }
    }

    /// Controller identity
    #[must_use]
    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    /// Current liveness
    #[must_use]
    pub const fn status(&self) -> ControllerStatus {
        self.status
    }

    /// Whether the controller is running
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == ControllerStatus::Alive
    }

    /// Kill the controller; killing a dead controller is a no-op
    pub fn kill(&mut self) {
        tracing::debug!(controller = %self.id, "killing controller");
        self.status = ControllerStatus::Dead;
    }

    /// Reboot the controller; rebooting a live controller is a no-op
    pub fn reboot(&mut self) {
        tracing::debug!(controller = %self.id, "rebooting controller");
        self.status = ControllerStatus::Alive;
    }
}

/// Registry of simulated controllers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerManager {
    controllers: IndexMap<ControllerId, Controller>,
}

impl ControllerManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller
    pub fn register(&mut self, controller: Controller) {
        self.controllers
            .insert(controller.id().clone(), controller);
    }

    /// Look up a controller by id
    ///
    /// # Errors
    ///
    /// Returns error if the id is not registered
    pub fn controller(&self, id: &ControllerId) -> SimResult<&Controller> {
        self.controllers
            .get(id)
            .ok_or_else(|| SimError::UnknownController(id.clone()))
    }

    /// Mutable access to a controller by id
    ///
    /// # Errors
    ///
    /// Returns error if the id is not registered
    pub fn controller_mut(&mut self, id: &ControllerId) -> SimResult<&mut Controller> {
        self.controllers
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownController(id.clone()))
    }

    /// Number of registered controllers
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controllers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
