mod agents;
mod chat;
mod projects;
mod session;

use tokio::sync::mpsc;
use tracing::debug;

use super::App;
use crate::api::{Agent, AgentProfileResponse, ChatEntry, Project, RunResponse};
use crate::core::agents::ProfileRequest;
use crate::core::chat::SendTicket;
use crate::core::session::Session;

/// Every input to [`App`]: user intents, and network completions carrying
/// the fence token captured when their request started.
#[derive(Debug)]
pub enum AppAction {
    CheckSession,
    SessionChecked {
        generation: u64,
        session: Session,
    },
    SubmitLogin {
        email: String,
        password: String,
    },
    LoginFinished {
        result: Result<Option<String>, String>,
    },
    LoadAgents,
    AgentsLoaded {
        generation: u64,
        result: Result<Vec<Agent>, String>,
    },
    SelectAgent {
        agent_id: String,
    },
    ReloadProfile,
    AgentProfileLoaded {
        agent_id: String,
        generation: u64,
        result: Result<AgentProfileResponse, String>,
    },
    LoadProjects,
    ConnectivityChecked {
        generation: u64,
        result: Result<bool, String>,
    },
    ProjectIndexLoaded {
        generation: u64,
        result: Result<Vec<Project>, String>,
    },
    SelectProject {
        project_id: String,
    },
    CreateProject {
        name: String,
    },
    ProjectCreated {
        result: Result<(), String>,
    },
    /// Stages a delete; `None` means the active project.
    RequestDeleteProject {
        project_id: Option<String>,
    },
    ConfirmDeleteProject,
    CancelDeleteProject,
    ProjectDeleted {
        result: Result<(), String>,
    },
    ReloadChat,
    ChatLoaded {
        project_id: String,
        generation: u64,
        result: Result<Vec<ChatEntry>, String>,
    },
    SubmitMessage {
        text: String,
    },
    RunCompleted {
        send_id: u64,
        result: Result<RunResponse, String>,
    },
    SetStatus {
        message: String,
    },
    ClearStatus,
    Quit,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(action);
        }
    }
}

/// Exactly one round-trip to the workspace service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    CheckSession { generation: u64 },
    Login { email: String, password: String },
    FetchAgents { generation: u64 },
    FetchAgentProfile(ProfileRequest),
    CheckConnectivity { generation: u64 },
    FetchProjectIndex { generation: u64 },
    CreateProject { name: String },
    DeleteProject { project_id: String },
    FetchChat { project_id: String, generation: u64 },
    RunAgent(SendTicket),
}

impl AppCommand {
    /// Short name for logs; never includes credentials.
    pub fn label(&self) -> &'static str {
        match self {
            AppCommand::CheckSession { .. } => "check-session",
            AppCommand::Login { .. } => "login",
            AppCommand::FetchAgents { .. } => "fetch-agents",
            AppCommand::FetchAgentProfile(_) => "fetch-agent-profile",
            AppCommand::CheckConnectivity { .. } => "check-connectivity",
            AppCommand::FetchProjectIndex { .. } => "fetch-project-index",
            AppCommand::CreateProject { .. } => "create-project",
            AppCommand::DeleteProject { .. } => "delete-project",
            AppCommand::FetchChat { .. } => "fetch-chat",
            AppCommand::RunAgent(_) => "run-agent",
        }
    }
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        commands.extend(apply_action(app, action));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::CheckSession
        | AppAction::SessionChecked { .. }
        | AppAction::SubmitLogin { .. }
        | AppAction::LoginFinished { .. } => session::handle_session_action(app, action),

        AppAction::LoadAgents
        | AppAction::AgentsLoaded { .. }
        | AppAction::SelectAgent { .. }
        | AppAction::ReloadProfile
        | AppAction::AgentProfileLoaded { .. } => agents::handle_agent_action(app, action),

        AppAction::LoadProjects
        | AppAction::ConnectivityChecked { .. }
        | AppAction::ProjectIndexLoaded { .. }
        | AppAction::SelectProject { .. }
        | AppAction::CreateProject { .. }
        | AppAction::ProjectCreated { .. }
        | AppAction::RequestDeleteProject { .. }
        | AppAction::ConfirmDeleteProject
        | AppAction::CancelDeleteProject
        | AppAction::ProjectDeleted { .. } => projects::handle_project_action(app, action),

        AppAction::ReloadChat
        | AppAction::ChatLoaded { .. }
        | AppAction::SubmitMessage { .. }
        | AppAction::RunCompleted { .. } => chat::handle_chat_action(app, action),

        AppAction::SetStatus { message } => {
            app.set_status(message);
            Vec::new()
        }
        AppAction::ClearStatus => {
            app.status = None;
            Vec::new()
        }
        AppAction::Quit => {
            app.exit_requested = true;
            Vec::new()
        }
    }
}

/// Workspace intents are ignored until the session gate has opened.
fn require_workspace(app: &mut App) -> bool {
    if app.session.is_authenticated() {
        return true;
    }
    debug!("workspace action while signed out; ignoring");
    app.set_status("Not signed in");
    false
}
