use thiserror::Error;

pub type HubResult<T> = std::result::Result<T, HubError>;

/// Errors surfaced by the hub wire layer.
///
/// `Transport` is a network-level failure and is always distinct from an
/// application-level denial, which reaches callers either as
/// `SlotOutcome::Denied` (handshakes) or `PermissionDenied` (submissions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// Network-level failure talking to the control API or blob backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The hub refused the request outright.
    #[error("permission denied by the hub")]
    PermissionDenied,

    /// The hub answered with a status the protocol does not account for.
    #[error("unexpected hub response ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The hub answered 200 with a body we cannot make sense of.
    #[error("invalid hub response: {0}")]
    InvalidResponse(String),

    /// A local artifact file could not be opened or read.
    #[error("failed to read {path}: {reason}")]
    FileRead { path: String, reason: String },
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
