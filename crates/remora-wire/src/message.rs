use serde::{Deserialize, Serialize};

/// A request sent to the compute service.
///
/// Every request carries a client-generated `request_id` so that server logs
/// and client logs can be correlated. All requests except `create_session`
/// are scoped to an open session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientRequest {
    CreateSession {
        request_id: String,
    },
    DeleteSession {
        request_id: String,
        session_id: String,
    },
    Compute {
        request_id: String,
        session_id: String,
        op: String,
        inputs: Vec<String>,
        #[serde(default)]
        params: serde_json::Value,
    },
    FollowUp {
        request_id: String,
        session_id: String,
        pending_computation_id: String,
    },
    Upload {
        request_id: String,
        session_id: String,
        transfer_id: String,
        payload: String,
    },
    Download {
        request_id: String,
        session_id: String,
        transfer_id: String,
    },
}

impl ClientRequest {
    /// URL path this request is posted to.
    pub fn route(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create_session",
            Self::DeleteSession { .. } => "delete_session",
            Self::Compute { .. } => "compute",
            Self::FollowUp { .. } => "follow_up",
            Self::Upload { .. } => "upload",
            Self::Download { .. } => "download",
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            Self::CreateSession { request_id }
            | Self::DeleteSession { request_id, .. }
            | Self::Compute { request_id, .. }
            | Self::FollowUp { request_id, .. }
            | Self::Upload { request_id, .. }
            | Self::Download { request_id, .. } => request_id,
        }
    }
}

/// One message from the compute service.
///
/// The `kind` discriminant is the closed set of response kinds the service
/// emits; anything else is rejected by the decoder rather than silently
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    ComputationResponse {
        result: ResultPayload,
        #[serde(default)]
        messages: Vec<ServerNote>,
    },
    PendingComputationResponse {
        pending_computation_id: String,
    },
    CreateSessionResponse {
        id: String,
        upload_prefix: String,
        download_prefix: String,
    },
    DeleteSessionResponse {},
    DataTransferResponse {
        transfer_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },
    ErrorResponse {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ComputationResponse { .. } => "computation_response",
            Self::PendingComputationResponse { .. } => "pending_computation_response",
            Self::CreateSessionResponse { .. } => "create_session_response",
            Self::DeleteSessionResponse {} => "delete_session_response",
            Self::DataTransferResponse { .. } => "data_transfer_response",
            Self::ErrorResponse { .. } => "error_response",
        }
    }
}

/// The value a finished computation produced: either inline JSON or a handle
/// to a blob stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultPayload {
    Inline { value: serde_json::Value },
    Stored { transfer_id: String },
}

/// A human-readable note the server attaches to a computation response.
/// Relayed to the client's log at the given level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerNote {
    pub level: String,
    pub message: String,
}

/// Machine-readable error classification carried by `error_response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    DecodeFailure,
    SessionInvalid,
    NotFound,
    TransferFailure,
    TimedOut,
    RemoteComputationFailed,
    Unknown(String),
}

impl ErrorKind {
    pub fn from_wire_code(code: &str) -> Self {
        match code {
            "decode_failure" => Self::DecodeFailure,
            "session_invalid" | "session_expired" => Self::SessionInvalid,
            "not_found" => Self::NotFound,
            "transfer_failure" => Self::TransferFailure,
            "timed_out" => Self::TimedOut,
            "remote_computation_failed" | "computation_failed" => Self::RemoteComputationFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecodeFailure => f.write_str("decode_failure"),
            Self::SessionInvalid => f.write_str("session_invalid"),
            Self::NotFound => f.write_str("not_found"),
            Self::TransferFailure => f.write_str("transfer_failure"),
            Self::TimedOut => f.write_str("timed_out"),
            Self::RemoteComputationFailed => f.write_str("remote_computation_failed"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}
