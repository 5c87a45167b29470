use std::sync::Arc;

use tracing::{debug, info, warn};

use remora_wire::{ClientRequest, Decoded, RequestCategory, ResultPayload, ServerNote, decode};

use crate::error::{ClientError, Result};
use crate::new_request_id;
use crate::session::Session;
use crate::transfer::TransferHandle;
use crate::transport::Transport;

/// One unit of work: an operation name, the handles it reads, and
/// operation-specific parameters. Consumed by `Dispatcher::submit`.
///
/// Referenced handles must already be uploaded; submission never triggers
/// uploads.
#[derive(Debug, Clone)]
pub struct ComputationRequest {
    pub op: String,
    pub inputs: Vec<TransferHandle>,
    pub params: serde_json::Value,
}

impl ComputationRequest {
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            inputs: Vec::new(),
            params: serde_json::Value::Null,
        }
    }

    pub fn input(mut self, handle: &TransferHandle) -> Self {
        self.inputs.push(handle.clone());
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

/// Token for a computation the server accepted but has not finished.
/// Hand it to the poller; it is useless once a terminal state is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobToken(String);

impl JobToken {
    pub(crate) fn from_raw(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a submission produced: exactly one of a finished result or a pending
/// job token.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationOutcome {
    Completed(ComputationResult),
    Pending(JobToken),
}

/// Terminal value of a computation.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationResult {
    Inline(serde_json::Value),
    Stored(TransferHandle),
}

impl From<ResultPayload> for ComputationResult {
    fn from(payload: ResultPayload) -> Self {
        match payload {
            ResultPayload::Inline { value } => Self::Inline(value),
            ResultPayload::Stored { transfer_id } => Self::Stored(TransferHandle::new(transfer_id)),
        }
    }
}

/// Submits computations scoped to a session.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submit one computation. Returns the finished result when the server
    /// completed it synchronously, or a `JobToken` to poll.
    pub async fn submit(
        &self,
        session: &Session,
        request: ComputationRequest,
    ) -> Result<ComputationOutcome> {
        let wire = ClientRequest::Compute {
            request_id: new_request_id(),
            session_id: session.id.clone(),
            op: request.op,
            inputs: request
                .inputs
                .into_iter()
                .map(|handle| handle.id().to_string())
                .collect(),
            params: request.params,
        };
        debug!(
            target: "remora::dispatch",
            request_id = wire.request_id(),
            session_id = %session.id,
            "submitting computation"
        );

        let raw = self.transport.send(&wire).await?;
        match decode(&raw, RequestCategory::Computation) {
            Decoded::Computation { result, notes } => {
                relay_notes(&notes);
                Ok(ComputationOutcome::Completed(result.into()))
            }
            Decoded::Pending {
                pending_computation_id,
            } => {
                debug!(
                    target: "remora::dispatch",
                    job = %pending_computation_id,
                    "computation accepted, pending"
                );
                Ok(ComputationOutcome::Pending(JobToken(
                    pending_computation_id,
                )))
            }
            Decoded::Error(err) => Err(ClientError::from_wire(err)),
            other => Err(ClientError::unexpected("compute", &other)),
        }
    }
}

/// Forward server-side notes into the local log at their reported level.
pub(crate) fn relay_notes(notes: &[ServerNote]) {
    for note in notes {
        match note.level.as_str() {
            "debug" => debug!(target: "remora::dispatch", "server: {}", note.message),
            "warn" | "warning" => warn!(target: "remora::dispatch", "server: {}", note.message),
            _ => info!(target: "remora::dispatch", "server: {}", note.message),
        }
    }
}
