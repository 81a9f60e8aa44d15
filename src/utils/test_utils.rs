//! In-memory stand-in for the workspace service.
//!
//! Every trait call is recorded, and each endpoint's answer can be scripted.
//! Runs append the user message and the reply to the stored log, like the
//! real service does, so reconcile loads see server-confirmed entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::StatusCode;

use crate::api::{
    Agent, AgentProfileResponse, ApiError, ChatEntry, ChatRole, Project, RunOutput, RunResponse,
    SessionStatus, WorkspaceBackend,
};
use crate::core::app::App;
use crate::core::builtin_agents::load_builtin_agents;

fn failure(message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.to_string(),
    }
}

/// Fixed clock used for scripted log entries.
pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        + ChronoDuration::minutes(minute)
}

pub fn entry(project: &str, agent: &str, role: ChatRole, text: &str, minute: i64) -> ChatEntry {
    ChatEntry {
        ts: at_minute(minute),
        project_id: project.to_string(),
        agent_id: agent.to_string(),
        role,
        text: text.to_string(),
        run_id: None,
    }
}

pub fn create_test_app() -> App {
    App::new(load_builtin_agents(), None, "Hello from the desk".to_string())
}

struct FakeState {
    session: Result<SessionStatus, String>,
    password: Option<String>,
    login_error: Option<String>,
    connected: Result<bool, String>,
    agents: Result<Vec<Agent>, String>,
    profiles: HashMap<String, String>,
    profile_error: Option<String>,
    projects: Result<Vec<Project>, String>,
    next_project: u32,
    mutation_error: Option<String>,
    logs: HashMap<String, Vec<ChatEntry>>,
    chat_error: Option<String>,
    chat_delays: HashMap<String, Duration>,
    run_reply: Result<Option<String>, String>,
    next_run: u32,
    calls: Vec<String>,
}

#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Signed out, connected, empty roster and no projects.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                session: Ok(SessionStatus {
                    authenticated: false,
                    email: None,
                }),
                password: None,
                login_error: None,
                connected: Ok(true),
                agents: Ok(Vec::new()),
                profiles: HashMap::new(),
                profile_error: None,
                projects: Ok(Vec::new()),
                next_project: 0,
                mutation_error: None,
                logs: HashMap::new(),
                chat_error: None,
                chat_delays: HashMap::new(),
                run_reply: Ok(Some("Done".to_string())),
                next_run: 0,
                calls: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    pub fn set_session(&self, authenticated: bool, email: Option<&str>) {
        self.state().session = Ok(SessionStatus {
            authenticated,
            email: email.map(str::to_string),
        });
    }

    pub fn fail_session(&self, message: &str) {
        self.state().session = Err(message.to_string());
    }

    /// Credentials accepted by `login`; a successful login also flips the
    /// session to authenticated for that email.
    pub fn accept_password(&self, password: &str) {
        self.state().password = Some(password.to_string());
    }

    pub fn fail_login(&self, message: &str) {
        self.state().login_error = Some(message.to_string());
    }

    pub fn set_connected(&self, connected: bool) {
        self.state().connected = Ok(connected);
    }

    pub fn fail_connectivity(&self, message: &str) {
        self.state().connected = Err(message.to_string());
    }

    pub fn set_agents(&self, agents: Vec<Agent>) {
        self.state().agents = Ok(agents);
    }

    pub fn fail_agents(&self, message: &str) {
        self.state().agents = Err(message.to_string());
    }

    pub fn set_profile(&self, agent_id: &str, content: &str) {
        self.state()
            .profiles
            .insert(agent_id.to_string(), content.to_string());
    }

    pub fn fail_profiles(&self, message: &str) {
        self.state().profile_error = Some(message.to_string());
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        self.state().projects = Ok(projects);
    }

    pub fn fail_projects(&self, message: &str) {
        self.state().projects = Err(message.to_string());
    }

    pub fn fail_mutations(&self, message: &str) {
        self.state().mutation_error = Some(message.to_string());
    }

    pub fn set_log(&self, project_id: &str, entries: Vec<ChatEntry>) {
        self.state().logs.insert(project_id.to_string(), entries);
    }

    pub fn log(&self, project_id: &str) -> Vec<ChatEntry> {
        self.state()
            .logs
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_chat(&self, message: &str) {
        self.state().chat_error = Some(message.to_string());
    }

    /// Holds `chat_log(project_id)` responses back for `delay`.
    pub fn delay_chat(&self, project_id: &str, delay: Duration) {
        self.state()
            .chat_delays
            .insert(project_id.to_string(), delay);
    }

    /// `None` makes runs succeed without output text.
    pub fn set_run_reply(&self, reply: Option<&str>) {
        self.state().run_reply = Ok(reply.map(str::to_string));
    }

    pub fn fail_runs(&self, message: &str) {
        self.state().run_reply = Err(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl WorkspaceBackend for FakeBackend {
    async fn session_status(&self) -> Result<SessionStatus, ApiError> {
        self.record("session".to_string());
        self.state().session.clone().map_err(|message| failure(&message))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Option<String>, ApiError> {
        self.record(format!("login {email}"));
        let mut state = self.state();
        if let Some(message) = state.login_error.clone() {
            return Err(failure(&message));
        }
        if state.password.as_deref() != Some(password) {
            return Ok(Some("Invalid credentials".to_string()));
        }
        state.session = Ok(SessionStatus {
            authenticated: true,
            email: Some(email.to_string()),
        });
        Ok(None)
    }

    async fn connectivity(&self) -> Result<bool, ApiError> {
        self.record("connectivity".to_string());
        self.state().connected.clone().map_err(|message| failure(&message))
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.record("agents".to_string());
        self.state().agents.clone().map_err(|message| failure(&message))
    }

    async fn agent_profile(&self, agent_id: &str) -> Result<AgentProfileResponse, ApiError> {
        self.record(format!("profile {agent_id}"));
        let state = self.state();
        if let Some(message) = state.profile_error.as_deref() {
            return Err(failure(message));
        }
        let content = state
            .profiles
            .get(agent_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message: "Agent not found".to_string(),
            })?;
        Ok(AgentProfileResponse {
            agent: Some(Agent::new(agent_id, "")),
            content,
        })
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.record("projects".to_string());
        self.state().projects.clone().map_err(|message| failure(&message))
    }

    async fn create_project(&self, name: &str) -> Result<(), ApiError> {
        self.record(format!("create {name}"));
        let mut state = self.state();
        if let Some(message) = state.mutation_error.clone() {
            return Err(failure(&message));
        }
        state.next_project += 1;
        let id = format!("proj-{}", state.next_project);
        if let Ok(projects) = state.projects.as_mut() {
            projects.push(Project::new(id, name));
        }
        Ok(())
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete {project_id}"));
        let mut state = self.state();
        if let Some(message) = state.mutation_error.clone() {
            return Err(failure(&message));
        }
        if let Ok(projects) = state.projects.as_mut() {
            projects.retain(|project| project.id != project_id);
        }
        state.logs.remove(project_id);
        Ok(())
    }

    async fn chat_log(&self, project_id: &str) -> Result<Vec<ChatEntry>, ApiError> {
        self.record(format!("chat {project_id}"));
        let delay = self.state().chat_delays.get(project_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state();
        if let Some(message) = state.chat_error.as_deref() {
            return Err(failure(message));
        }
        Ok(state.logs.get(project_id).cloned().unwrap_or_default())
    }

    async fn run_agent(
        &self,
        project_id: &str,
        agent_id: &str,
        message: &str,
    ) -> Result<RunResponse, ApiError> {
        self.record(format!("run {project_id} {agent_id} {message}"));
        let mut state = self.state();
        let reply = state.run_reply.clone().map_err(|message| failure(&message))?;
        state.next_run += 1;
        let run_id = format!("run-{}", state.next_run);

        let log = state.logs.entry(project_id.to_string()).or_default();
        let minute = log.len() as i64 + 100;
        log.push(entry(project_id, agent_id, ChatRole::User, message, minute));
        let mut reply_entry = entry(
            project_id,
            agent_id,
            ChatRole::Assistant,
            reply.as_deref().unwrap_or(""),
            minute + 1,
        );
        reply_entry.run_id = Some(run_id.clone());
        log.push(reply_entry);

        Ok(RunResponse {
            output: Some(RunOutput { content: reply }),
            run_id: Some(run_id),
        })
    }
}
