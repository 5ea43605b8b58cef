use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the remote table service on a non-2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The table service answered with an error body.
    #[error("{message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("table returned no rows for a returning statement")]
    EmptyResponse,
}

impl TableError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            code: None,
            message: message.into(),
        }
    }

    pub fn transport(err: impl ToString) -> Self {
        Self::Transport(err.to_string())
    }

    /// True when the table service itself reported the failure, as opposed to
    /// the request never completing or returning an unusable payload.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn from_body(status: u16, body: TableErrorBody) -> Self {
        let message = body
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::Rejected {
            code: body.code,
            message,
        }
    }
}
