use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::WorkspaceBackend;
use crate::core::agents::ProfileRequest;
use crate::core::app::{AppAction, AppActionDispatcher, AppCommand};
use crate::core::chat::SendTicket;
use crate::core::session::check_session;

#[derive(Clone)]
pub struct ExecutorContext {
    pub backend: Arc<dyn WorkspaceBackend>,
    pub dispatcher: AppActionDispatcher,
    pub cancel_token: CancellationToken,
}

pub fn spawn_command(ctx: ExecutorContext, command: AppCommand) {
    tokio::spawn(async move {
        let label = command.label();
        debug!(command = label, "request started");
        let action = tokio::select! {
            _ = ctx.cancel_token.cancelled() => {
                debug!(command = label, "request abandoned");
                return;
            }
            action = execute(ctx.backend.as_ref(), command) => action,
        };
        debug!(command = label, "request finished");
        ctx.dispatcher.dispatch_many([action]);
    });
}

/// Performs the round-trip for `command` and wraps the outcome in the
/// completion action, carrying the fence token through unchanged.
pub async fn execute(backend: &dyn WorkspaceBackend, command: AppCommand) -> AppAction {
    match command {
        AppCommand::CheckSession { generation } => AppAction::SessionChecked {
            generation,
            session: check_session(backend).await,
        },
        AppCommand::Login { email, password } => AppAction::LoginFinished {
            result: backend
                .login(&email, &password)
                .await
                .map_err(|e| e.to_string()),
        },
        AppCommand::FetchAgents { generation } => AppAction::AgentsLoaded {
            generation,
            result: backend.list_agents().await.map_err(|e| e.to_string()),
        },
        AppCommand::FetchAgentProfile(ProfileRequest {
            agent_id,
            generation,
        }) => {
            let result = backend
                .agent_profile(&agent_id)
                .await
                .map_err(|e| e.to_string());
            AppAction::AgentProfileLoaded {
                agent_id,
                generation,
                result,
            }
        }
        AppCommand::CheckConnectivity { generation } => AppAction::ConnectivityChecked {
            generation,
            result: backend.connectivity().await.map_err(|e| e.to_string()),
        },
        AppCommand::FetchProjectIndex { generation } => AppAction::ProjectIndexLoaded {
            generation,
            result: backend.list_projects().await.map_err(|e| e.to_string()),
        },
        AppCommand::CreateProject { name } => AppAction::ProjectCreated {
            result: backend
                .create_project(&name)
                .await
                .map_err(|e| e.to_string()),
        },
        AppCommand::DeleteProject { project_id } => AppAction::ProjectDeleted {
            result: backend
                .delete_project(&project_id)
                .await
                .map_err(|e| e.to_string()),
        },
        AppCommand::FetchChat {
            project_id,
            generation,
        } => {
            let result = backend
                .chat_log(&project_id)
                .await
                .map_err(|e| e.to_string());
            AppAction::ChatLoaded {
                project_id,
                generation,
                result,
            }
        }
        AppCommand::RunAgent(SendTicket {
            send_id,
            project_id,
            agent_id,
            message,
        }) => AppAction::RunCompleted {
            send_id,
            result: backend
                .run_agent(&project_id, &agent_id, &message)
                .await
                .map_err(|e| e.to_string()),
        },
    }
}
