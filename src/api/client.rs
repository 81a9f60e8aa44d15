use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::backend::WorkspaceBackend;
use super::{
    Agent, AgentProfileResponse, AgentsResponse, ChatEntry, ChatLogResponse, ConnectivityResponse,
    CreateProjectRequest, DeleteProjectRequest, LoginRequest, LoginResponse, Project,
    ProjectIndexResponse, RunRequest, RunResponse, SessionStatus,
};
use crate::utils::url::normalize_base_url;

const LOGIN_FAILED: &str = "Login failed";

/// Failure of a single round-trip to the workspace service.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response.
    Transport(reqwest::Error),
    /// The service answered with a non-2xx status.
    Status {
        status: StatusCode,
        /// Structured error field, raw body text, or `HTTP <status>`.
        message: String,
    },
    /// A 2xx body that does not match the expected shape.
    Decode(String),
    /// The configured base URL cannot address the endpoint.
    InvalidUrl(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(source) => write!(f, "Network error: {source}"),
            ApiError::Status { message, .. } => write!(f, "{message}"),
            ApiError::Decode(detail) => write!(f, "Unexpected response: {detail}"),
            ApiError::InvalidUrl(url) => write!(f, "Invalid service URL: {url}"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Transport(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        ApiError::Transport(source)
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Picks the message shown for a non-2xx response: a structured error field
/// when the body is JSON, else the raw body, else a generic status line.
pub fn error_message_for(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&value) {
            return summary;
        }
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("HTTP {}", status.as_u16())
}

/// Builds the external storage connect URL. Following the redirect is left to
/// whoever opens it.
pub fn auth_start_url(base_url: &str, return_to: &str) -> Result<Url, ApiError> {
    let mut url = endpoint(base_url, &["auth", "start"])?;
    url.query_pairs_mut().append_pair("returnTo", return_to);
    Ok(url)
}

fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let normalized = normalize_base_url(base_url);
    let mut url =
        Url::parse(&normalized).map_err(|_| ApiError::InvalidUrl(normalized.clone()))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(normalized.clone()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// HTTP implementation of [`WorkspaceBackend`].
///
/// The session marker is an opaque cookie, so the client keeps a cookie store
/// and every request carries it.
#[derive(Clone)]
pub struct WorkspaceClient {
    http: reqwest::Client,
    base_url: String,
}

impl WorkspaceClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint(&self.base_url, segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        decode_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(segments)?;
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_message_for(status, &body),
    })
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[async_trait]
impl WorkspaceBackend for WorkspaceClient {
    async fn session_status(&self) -> Result<SessionStatus, ApiError> {
        self.get_json(&["session"]).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Option<String>, ApiError> {
        let url = self.url(&["login"])?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<LoginResponse>(&body).ok();

        match parsed {
            Some(LoginResponse { ok: true, .. }) if status.is_success() => Ok(None),
            Some(LoginResponse { error, .. }) => Ok(Some(
                error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| LOGIN_FAILED.to_string()),
            )),
            None => Ok(Some(LOGIN_FAILED.to_string())),
        }
    }

    async fn connectivity(&self) -> Result<bool, ApiError> {
        let response: ConnectivityResponse = self.get_json(&["auth", "status"]).await?;
        Ok(response.connected)
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, ApiError> {
        let response: AgentsResponse = self.get_json(&["agents"]).await?;
        Ok(response.agents)
    }

    async fn agent_profile(&self, agent_id: &str) -> Result<AgentProfileResponse, ApiError> {
        self.get_json(&["agents", agent_id]).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response: ProjectIndexResponse =
            self.get_json(&["kb", "projects", "index"]).await?;
        Ok(response.index.projects)
    }

    async fn create_project(&self, name: &str) -> Result<(), ApiError> {
        self.post_json(&["kb", "projects", "create"], &CreateProjectRequest { name })
            .await?;
        Ok(())
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        self.post_json(
            &["kb", "projects", "delete"],
            &DeleteProjectRequest { id: project_id },
        )
        .await?;
        Ok(())
    }

    async fn chat_log(&self, project_id: &str) -> Result<Vec<ChatEntry>, ApiError> {
        let response: ChatLogResponse =
            self.get_json(&["kb", "projects", project_id, "chat"]).await?;
        Ok(response.entries)
    }

    async fn run_agent(
        &self,
        project_id: &str,
        agent_id: &str,
        message: &str,
    ) -> Result<RunResponse, ApiError> {
        let response = self
            .post_json(
                &["kb", "projects", project_id, "run"],
                &RunRequest { agent_id, message },
            )
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}
