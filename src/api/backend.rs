//! Transport-neutral contract for the workspace service.
//!
//! Executors only ever talk to `dyn WorkspaceBackend`, so the HTTP client and
//! the in-memory test double are interchangeable.

use async_trait::async_trait;

use super::{
    Agent, AgentProfileResponse, ApiError, ChatEntry, Project, RunResponse, SessionStatus,
};

#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    async fn session_status(&self) -> Result<SessionStatus, ApiError>;

    /// Returns `Ok(None)` on success and `Ok(Some(message))` when the
    /// service rejected the credentials with a readable reason.
    async fn login(&self, email: &str, password: &str) -> Result<Option<String>, ApiError>;

    async fn connectivity(&self) -> Result<bool, ApiError>;

    async fn list_agents(&self) -> Result<Vec<Agent>, ApiError>;

    async fn agent_profile(&self, agent_id: &str) -> Result<AgentProfileResponse, ApiError>;

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn create_project(&self, name: &str) -> Result<(), ApiError>;

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError>;

    async fn chat_log(&self, project_id: &str) -> Result<Vec<ChatEntry>, ApiError>;

    async fn run_agent(
        &self,
        project_id: &str,
        agent_id: &str,
        message: &str,
    ) -> Result<RunResponse, ApiError>;
}
