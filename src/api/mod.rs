//! Wire payloads exchanged with the workspace service.
//!
//! Field names follow the service's JSON exactly; everything the client keeps
//! in its own state is converted into the core types at the edges.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod backend;
pub mod client;

pub use backend::WorkspaceBackend;
pub use client::{auth_start_url, ApiError, WorkspaceClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Accepts an RFC 3339 string or epoch milliseconds.
fn deserialize_ts<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: serde_json::Value = serde_json::Value::deserialize(deserializer)?;
    match val {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(|| serde::de::Error::custom("invalid epoch milliseconds for ts")),
        _ => Err(serde::de::Error::custom("expected string or number for ts")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    #[serde(deserialize_with = "deserialize_ts")]
    pub ts: DateTime<Utc>,
    pub project_id: String,
    pub agent_id: String,
    pub role: ChatRole,
    pub text: String,
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectivityResponse {
    #[serde(default)]
    pub connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct AgentsResponse {
    #[serde(default)]
    pub agents: Vec<Agent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentProfileResponse {
    pub agent: Option<Agent>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectIndex {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectIndexResponse {
    #[serde(default)]
    pub index: ProjectIndex,
}

#[derive(Serialize)]
pub struct CreateProjectRequest<'a> {
    pub name: &'a str,
}

#[derive(Serialize)]
pub struct DeleteProjectRequest<'a> {
    pub id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatLogResponse {
    #[serde(default)]
    pub entries: Vec<ChatEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest<'a> {
    pub agent_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub output: Option<RunOutput>,
    #[serde(default)]
    pub run_id: Option<String>,
}

impl RunResponse {
    pub fn output_text(&self) -> Option<&str> {
        self.output.as_ref().and_then(|output| output.content.as_deref())
    }
}
