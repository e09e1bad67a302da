use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Endpoint a failure belongs to; used in user-visible messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Occupations,
    Occupation,
    Rankings,
    Health,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Occupations => "occupations",
            Self::Occupation => "occupation",
            Self::Rankings => "rankings",
            Self::Health => "health status",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to load {resource} ({})", .status.as_u16())]
    Status {
        resource: Resource,
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("failed to load {resource}: {source}")]
    Transport {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to load {resource}: malformed response body: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid api base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Server-provided `detail`, when the failure body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}
