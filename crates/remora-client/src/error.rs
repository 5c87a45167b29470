use remora_wire::{Decoded, ErrorKind, WireError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure of the transport itself, before any response could be decoded.
///
/// These are the only errors the poller treats as transient; everything else
/// propagates to the caller immediately.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {details}")]
    Network { details: String },
    #[error("server error (status {status}): {details}")]
    Server { status: u16, details: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to decode server response: {details}")]
    Decode { details: String },
    #[error("session invalid: {details}")]
    SessionInvalid { details: String },
    #[error("not found: {details}")]
    NotFound { details: String },
    #[error("transfer failed: {details}")]
    Transfer { details: String },
    #[error("timed out: {details}")]
    TimedOut { details: String },
    #[error("remote computation failed: {message}")]
    RemoteComputation { message: String },
    #[error("server error ({code}): {message}")]
    Server { code: String, message: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Map a server-reported error into the client taxonomy. Codes the client
    /// does not know keep their wire code so nothing is silently collapsed.
    pub(crate) fn from_wire(err: WireError) -> Self {
        match err.kind {
            ErrorKind::DecodeFailure => Self::Decode {
                details: err.message,
            },
            ErrorKind::SessionInvalid => Self::SessionInvalid {
                details: err.message,
            },
            ErrorKind::NotFound => Self::NotFound {
                details: err.message,
            },
            ErrorKind::TransferFailure => Self::Transfer {
                details: err.message,
            },
            ErrorKind::TimedOut => Self::TimedOut {
                details: err.message,
            },
            ErrorKind::RemoteComputationFailed => Self::RemoteComputation {
                message: err.message,
            },
            ErrorKind::Unknown(code) => Self::Server {
                code,
                message: err.message,
            },
        }
    }

    /// A decoded variant that is valid for the request category but not for
    /// the specific operation (e.g. `delete_session_response` answering
    /// `create_session`).
    pub(crate) fn unexpected(operation: &'static str, decoded: &Decoded) -> Self {
        Self::Decode {
            details: format!("unexpected response to {operation}: {decoded:?}"),
        }
    }
}
