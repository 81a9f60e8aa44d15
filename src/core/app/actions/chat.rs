use tracing::debug;

use super::projects::load_chat;
use super::{require_workspace, App, AppAction, AppCommand};
use crate::core::chat::RunSettlement;

pub(super) fn handle_chat_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::ReloadChat => {
            if !require_workspace(app) {
                return Vec::new();
            }
            let project_id = app.projects.active_project_id().map(str::to_string);
            load_chat(app, project_id.as_deref())
        }
        AppAction::ChatLoaded {
            project_id,
            generation,
            result,
        } => {
            app.chat.apply_load(&project_id, generation, result);
            Vec::new()
        }
        AppAction::SubmitMessage { text } => {
            if !require_workspace(app) {
                return Vec::new();
            }
            let project_id = app.projects.active_project_id();
            let agent_id = app.agents.active_agent_id();
            match app.chat.begin_send(project_id, agent_id, &text) {
                Ok(ticket) => vec![AppCommand::RunAgent(ticket)],
                Err(err) => {
                    debug!(reason = %err, "send rejected");
                    Vec::new()
                }
            }
        }
        AppAction::RunCompleted { send_id, result } => {
            if let Err(message) = &result {
                app.set_status(format!("Run failed: {message}"));
            }
            match app.chat.apply_run_result(send_id, result) {
                RunSettlement::Reconcile {
                    project_id,
                    generation,
                } => vec![AppCommand::FetchChat {
                    project_id,
                    generation,
                }],
                RunSettlement::Dropped | RunSettlement::Unknown => Vec::new(),
            }
        }
        _ => unreachable!("non-chat action routed to chat handler"),
    }
}
