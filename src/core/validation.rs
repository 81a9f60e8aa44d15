use std::error::Error as StdError;
use std::fmt;

/// Input rejected locally, before any request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyProjectName,
    EmptyMessage,
    NoActiveProject,
    NoActiveAgent,
    MissingCredentials,
    LoginInProgress,
    UnknownAgent(String),
    UnknownProject(String),
    NothingToConfirm,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyProjectName => write!(f, "Project name cannot be empty"),
            ValidationError::EmptyMessage => write!(f, "Message is empty"),
            ValidationError::NoActiveProject => write!(f, "No project selected"),
            ValidationError::NoActiveAgent => write!(f, "No agent selected"),
            ValidationError::MissingCredentials => write!(f, "Email and password are required"),
            ValidationError::LoginInProgress => write!(f, "Login already in progress"),
            ValidationError::UnknownAgent(id) => write!(f, "Unknown agent: {id}"),
            ValidationError::UnknownProject(id) => write!(f, "Unknown project: {id}"),
            ValidationError::NothingToConfirm => write!(f, "Nothing to confirm"),
        }
    }
}

impl StdError for ValidationError {}
