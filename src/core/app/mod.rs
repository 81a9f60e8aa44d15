//! The single state container and the inputs that mutate it.

use crate::api::{Agent, ChatEntry};
use crate::core::agents::AgentStore;
use crate::core::chat::ChatReconciler;
use crate::core::config::Config;
use crate::core::projects::ProjectStore;
use crate::core::session::SessionGate;
use crate::core::view::visible_messages;

pub mod actions;

pub use actions::{apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand};

pub struct App {
    pub session: SessionGate,
    pub agents: AgentStore,
    pub projects: ProjectStore,
    pub chat: ChatReconciler,
    pub status: Option<String>,
    pub greeting: String,
    pub exit_requested: bool,
}

impl App {
    pub fn new(default_roster: Vec<Agent>, login_email: Option<String>, greeting: String) -> Self {
        Self {
            session: SessionGate::new(login_email),
            agents: AgentStore::new(default_roster),
            projects: ProjectStore::new(),
            chat: ChatReconciler::new(),
            status: None,
            greeting,
            exit_requested: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.default_roster(),
            config.login_email.clone(),
            config.greeting(),
        )
    }

    /// What the message pane shows for the active agent.
    pub fn visible_messages(&self) -> Vec<ChatEntry> {
        visible_messages(
            self.chat.entries(),
            self.agents.active_agent_id(),
            &self.greeting,
        )
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}
