//! Project index, gated on the service reporting a connected store.

use tracing::{debug, info, warn};

use crate::api::Project;
use crate::core::loadable::Loadable;
use crate::core::validation::ValidationError;

/// What a connectivity result means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityOutcome {
    /// A newer load started meanwhile.
    Stale,
    /// Not connected: the list and selection are cleared and the chat log
    /// must be cleared too. No index fetch follows.
    Disconnected,
    /// Connected: fetch the index under this generation.
    FetchIndex(u64),
}

/// Change of the active project caused by an index reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveProjectChange {
    Unchanged,
    Changed(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectMutation {
    Create,
    Delete,
}

#[derive(Debug, Default)]
pub struct ProjectStore {
    connected: Option<bool>,
    pub projects: Loadable<Vec<Project>>,
    active_project_id: Option<String>,
    pending_delete: Option<Project>,
    mutation_in_flight: Option<ProjectMutation>,
    mutation_error: Option<String>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first connectivity check has answered.
    pub fn connected(&self) -> Option<bool> {
        self.connected
    }

    pub fn list(&self) -> &[Project] {
        self.projects.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active_project_id.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&Project> {
        self.pending_delete.as_ref()
    }

    pub fn mutation_in_flight(&self) -> Option<ProjectMutation> {
        self.mutation_in_flight
    }

    pub fn mutation_error(&self) -> Option<&str> {
        self.mutation_error.as_deref()
    }

    /// First step of a load: the connectivity check. The returned generation
    /// fences both steps.
    pub fn begin_load(&mut self) -> u64 {
        self.projects.begin()
    }

    pub fn apply_connectivity(
        &mut self,
        generation: u64,
        result: Result<bool, String>,
    ) -> ConnectivityOutcome {
        if !self.projects.is_current(generation) {
            debug!(generation, "discarding stale connectivity result");
            return ConnectivityOutcome::Stale;
        }
        match result {
            Ok(true) => {
                self.connected = Some(true);
                ConnectivityOutcome::FetchIndex(generation)
            }
            Ok(false) => {
                info!("store not connected; clearing projects");
                self.disconnect(None);
                ConnectivityOutcome::Disconnected
            }
            Err(message) => {
                warn!(error = %message, "connectivity check failed");
                self.disconnect(Some(message));
                ConnectivityOutcome::Disconnected
            }
        }
    }

    fn disconnect(&mut self, error: Option<String>) {
        self.connected = Some(false);
        self.projects.reset();
        if let Some(message) = error {
            let generation = self.projects.begin();
            self.projects.finish(generation, Err(message));
        }
        self.active_project_id = None;
        self.pending_delete = None;
    }

    /// Second step: installs the index and re-derives the active project.
    pub fn apply_index(
        &mut self,
        generation: u64,
        result: Result<Vec<Project>, String>,
    ) -> Option<ActiveProjectChange> {
        let applied = match result {
            Ok(projects) => {
                info!(count = projects.len(), "project index loaded");
                self.projects.finish(generation, Ok(projects))
            }
            Err(message) => {
                warn!(error = %message, "project index failed");
                self.projects.finish(generation, Err(message))
            }
        };
        if !applied {
            return None;
        }
        Some(self.reconcile_active())
    }

    fn reconcile_active(&mut self) -> ActiveProjectChange {
        let projects = self.list();
        let still_present = self
            .active_project_id
            .as_deref()
            .is_some_and(|id| projects.iter().any(|project| project.id == id));
        if still_present {
            return ActiveProjectChange::Unchanged;
        }
        let next = projects.first().map(|project| project.id.clone());
        if next == self.active_project_id {
            return ActiveProjectChange::Unchanged;
        }
        debug!(previous = ?self.active_project_id, next = ?next, "active project re-derived");
        self.active_project_id = next.clone();
        if self
            .pending_delete
            .as_ref()
            .is_some_and(|project| Some(project.id.as_str()) != self.active_project_id.as_deref())
        {
            self.pending_delete = None;
        }
        ActiveProjectChange::Changed(next)
    }

    /// Returns `true` when the selection actually moved.
    pub fn select_project(&mut self, project_id: &str) -> Result<bool, ValidationError> {
        if !self.list().iter().any(|project| project.id == project_id) {
            return Err(ValidationError::UnknownProject(project_id.to_string()));
        }
        if self.active_project_id.as_deref() == Some(project_id) {
            return Ok(false);
        }
        info!(project = project_id, "active project changed");
        self.active_project_id = Some(project_id.to_string());
        self.pending_delete = None;
        Ok(true)
    }

    /// Validates a new project name. The project itself only appears once
    /// the index is reloaded.
    pub fn begin_create(&mut self, name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        self.mutation_in_flight = Some(ProjectMutation::Create);
        self.mutation_error = None;
        Ok(name.to_string())
    }

    /// Stages a delete. Nothing is sent until [`Self::confirm_delete`].
    pub fn request_delete(&mut self, project_id: &str) -> Result<&Project, ValidationError> {
        let project = self
            .list()
            .iter()
            .find(|project| project.id == project_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownProject(project_id.to_string()))?;
        Ok(&*self.pending_delete.insert(project))
    }

    pub fn cancel_delete(&mut self) -> Option<Project> {
        self.pending_delete.take()
    }

    pub fn confirm_delete(&mut self) -> Result<Project, ValidationError> {
        let project = self
            .pending_delete
            .take()
            .ok_or(ValidationError::NothingToConfirm)?;
        self.mutation_in_flight = Some(ProjectMutation::Delete);
        self.mutation_error = None;
        Ok(project)
    }

    /// Records the outcome of a create/delete. The caller reloads the index
    /// either way.
    pub fn finish_mutation(&mut self, result: Result<(), String>) {
        self.mutation_in_flight = None;
        if let Err(message) = result {
            warn!(error = %message, "project mutation failed");
            self.mutation_error = Some(message);
        }
    }
}
