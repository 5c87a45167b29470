use thiserror::Error;

use crate::message::{ClientRequest, ErrorKind, ResultPayload, ServerMessage, ServerNote};

/// Which kind of request produced a response.
///
/// The wire format is not self-describing across all variants (a bare
/// `computation_response` could answer either a submission or a status poll),
/// so the decoder takes the request category as a hint and rejects variants
/// the category cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCategory {
    Session,
    Computation,
    JobStatus,
    Transfer,
}

impl RequestCategory {
    fn accepts(self, kind: &str) -> bool {
        // error_response is valid for every category.
        match kind {
            "error_response" => true,
            "create_session_response" | "delete_session_response" => self == Self::Session,
            "computation_response" | "pending_computation_response" => {
                matches!(self, Self::Computation | Self::JobStatus)
            }
            "data_transfer_response" => self == Self::Transfer,
            _ => false,
        }
    }
}

impl ClientRequest {
    pub fn category(&self) -> RequestCategory {
        match self {
            Self::CreateSession { .. } | Self::DeleteSession { .. } => RequestCategory::Session,
            Self::Compute { .. } => RequestCategory::Computation,
            Self::FollowUp { .. } => RequestCategory::JobStatus,
            Self::Upload { .. } | Self::Download { .. } => RequestCategory::Transfer,
        }
    }
}

/// One raw server message, classified into exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Computation {
        result: ResultPayload,
        notes: Vec<ServerNote>,
    },
    Pending {
        pending_computation_id: String,
    },
    Session(SessionEvent),
    Transfer(TransferEvent),
    Error(WireError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Created {
        id: String,
        upload_prefix: String,
        download_prefix: String,
    },
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    pub transfer_id: String,
    /// Base64 payload; present on download responses, absent on upload acks.
    pub payload: Option<String>,
}

/// A server-reported (or decoder-synthesized) error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct WireError {
    pub kind: ErrorKind,
    pub message: String,
}

const KNOWN_KINDS: [&str; 6] = [
    "computation_response",
    "pending_computation_response",
    "create_session_response",
    "delete_session_response",
    "data_transfer_response",
    "error_response",
];

fn decode_failure(message: String) -> Decoded {
    Decoded::Error(WireError {
        kind: ErrorKind::DecodeFailure,
        message,
    })
}

/// Classify one raw server message.
///
/// Total and pure: every input maps to exactly one `Decoded` variant and
/// malformed or unrecognized input becomes `Decoded::Error` with kind
/// `decode_failure` rather than an `Err` or a panic. Retry and propagation
/// decisions belong to the caller.
pub fn decode(raw: &[u8], category: RequestCategory) -> Decoded {
    let value: serde_json::Value = match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(err) => return decode_failure(format!("malformed server message: {err}")),
    };

    let Some(kind) = value.get("kind").and_then(|k| k.as_str()).map(String::from) else {
        return decode_failure("server message has no `kind` discriminant".to_string());
    };

    if !KNOWN_KINDS.contains(&kind.as_str()) {
        return decode_failure(format!("unrecognized message kind `{kind}`"));
    }

    if !category.accepts(&kind) {
        return decode_failure(format!("`{kind}` cannot answer a {category:?} request"));
    }

    let message: ServerMessage = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(err) => return decode_failure(format!("invalid `{kind}` message: {err}")),
    };

    match message {
        ServerMessage::ComputationResponse { result, messages } => Decoded::Computation {
            result,
            notes: messages,
        },
        ServerMessage::PendingComputationResponse {
            pending_computation_id,
        } => Decoded::Pending {
            pending_computation_id,
        },
        ServerMessage::CreateSessionResponse {
            id,
            upload_prefix,
            download_prefix,
        } => Decoded::Session(SessionEvent::Created {
            id,
            upload_prefix,
            download_prefix,
        }),
        ServerMessage::DeleteSessionResponse {} => Decoded::Session(SessionEvent::Deleted),
        ServerMessage::DataTransferResponse {
            transfer_id,
            payload,
        } => Decoded::Transfer(TransferEvent {
            transfer_id,
            payload,
        }),
        ServerMessage::ErrorResponse { code, message } => Decoded::Error(WireError {
            kind: ErrorKind::from_wire_code(&code),
            message,
        }),
    }
}
