use tracing::info;

use super::{require_workspace, App, AppAction, AppCommand};
use crate::core::projects::{ActiveProjectChange, ConnectivityOutcome};
use crate::core::validation::ValidationError;

pub(super) fn handle_project_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::LoadProjects => {
            if !require_workspace(app) {
                return Vec::new();
            }
            vec![load_projects(app)]
        }
        AppAction::ConnectivityChecked { generation, result } => {
            match app.projects.apply_connectivity(generation, result) {
                ConnectivityOutcome::Stale => Vec::new(),
                ConnectivityOutcome::Disconnected => {
                    app.chat.begin_load(None);
                    Vec::new()
                }
                ConnectivityOutcome::FetchIndex(generation) => {
                    vec![AppCommand::FetchProjectIndex { generation }]
                }
            }
        }
        AppAction::ProjectIndexLoaded { generation, result } => {
            match app.projects.apply_index(generation, result) {
                Some(ActiveProjectChange::Changed(project_id)) => {
                    load_chat(app, project_id.as_deref())
                }
                Some(ActiveProjectChange::Unchanged) | None => Vec::new(),
            }
        }
        AppAction::SelectProject { project_id } => {
            if !require_workspace(app) {
                return Vec::new();
            }
            match app.projects.select_project(&project_id) {
                Ok(true) => load_chat(app, Some(project_id.as_str())),
                Ok(false) => Vec::new(),
                Err(err) => {
                    app.set_status(err.to_string());
                    Vec::new()
                }
            }
        }
        AppAction::CreateProject { name } => {
            if !require_workspace(app) {
                return Vec::new();
            }
            match app.projects.begin_create(&name) {
                Ok(name) => vec![AppCommand::CreateProject { name }],
                Err(err) => {
                    app.set_status(err.to_string());
                    Vec::new()
                }
            }
        }
        AppAction::ProjectCreated { result } => {
            match &result {
                Ok(()) => app.set_status("Project created"),
                Err(message) => app.set_status(format!("Create failed: {message}")),
            }
            app.projects.finish_mutation(result);
            vec![load_projects(app)]
        }
        AppAction::RequestDeleteProject { project_id } => {
            if !require_workspace(app) {
                return Vec::new();
            }
            let target = project_id
                .or_else(|| app.projects.active_project_id().map(str::to_string));
            let Some(target) = target else {
                app.set_status(ValidationError::NoActiveProject.to_string());
                return Vec::new();
            };
            let prompt = match app.projects.request_delete(&target) {
                Ok(project) => format!(
                    "Delete project '{}'? /confirm to delete, /cancel to keep it",
                    project.name
                ),
                Err(err) => err.to_string(),
            };
            app.set_status(prompt);
            Vec::new()
        }
        AppAction::ConfirmDeleteProject => match app.projects.confirm_delete() {
            Ok(project) => {
                info!(project = %project.id, "deleting project");
                vec![AppCommand::DeleteProject {
                    project_id: project.id,
                }]
            }
            Err(err) => {
                app.set_status(err.to_string());
                Vec::new()
            }
        },
        AppAction::CancelDeleteProject => {
            if app.projects.cancel_delete().is_some() {
                app.set_status("Delete cancelled");
            }
            Vec::new()
        }
        AppAction::ProjectDeleted { result } => {
            let succeeded = result.is_ok();
            match &result {
                Ok(()) => app.set_status("Project deleted"),
                Err(message) => app.set_status(format!("Delete failed: {message}")),
            }
            app.projects.finish_mutation(result);
            if succeeded {
                vec![load_projects(app)]
            } else {
                Vec::new()
            }
        }
        _ => unreachable!("non-project action routed to project handler"),
    }
}

pub(super) fn load_projects(app: &mut App) -> AppCommand {
    AppCommand::CheckConnectivity {
        generation: app.projects.begin_load(),
    }
}

/// Follows the active project with the chat log; no project clears it
/// without a fetch.
pub(super) fn load_chat(app: &mut App, project_id: Option<&str>) -> Vec<AppCommand> {
    app.chat
        .begin_load(project_id)
        .zip(project_id)
        .map(|(generation, project_id)| AppCommand::FetchChat {
            project_id: project_id.to_string(),
            generation,
        })
        .into_iter()
        .collect()
}
