use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::debug;

use remora_wire::{ClientRequest, Decoded, RequestCategory, TransferEvent, decode};

use crate::error::{ClientError, Result};
use crate::new_request_id;
use crate::session::Session;
use crate::transport::Transport;

/// Opaque reference to a blob stored on the compute service.
///
/// Handles are cheap to clone and are what computation requests reference;
/// the payload itself never travels with a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferHandle(String);

impl TransferHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moves bulk payloads to and from the compute service, independent of
/// computation control flow.
pub struct DataTransmitter {
    transport: Arc<dyn Transport>,
}

impl DataTransmitter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Upload a payload scoped to `session` and return its handle.
    ///
    /// The transfer id is the hex SHA-512 of the content, so identical
    /// payloads get identical ids. Whether the server short-circuits a
    /// re-upload of known content is server policy; callers must not assume
    /// deduplication.
    pub async fn upload(&self, session: &Session, data: &[u8]) -> Result<TransferHandle> {
        let transfer_id = content_id(data);
        debug!(
            target: "remora::transfer",
            session_id = %session.id,
            transfer_id = %transfer_id,
            bytes = data.len(),
            "uploading payload"
        );
        let request = ClientRequest::Upload {
            request_id: new_request_id(),
            session_id: session.id.clone(),
            transfer_id,
            payload: STANDARD.encode(data),
        };
        let raw = self
            .transport
            .send(&request)
            .await
            .map_err(|err| ClientError::Transfer {
                details: err.to_string(),
            })?;
        match decode(&raw, RequestCategory::Transfer) {
            Decoded::Transfer(TransferEvent { transfer_id, .. }) => {
                Ok(TransferHandle::new(transfer_id))
            }
            Decoded::Error(err) => Err(ClientError::from_wire(err)),
            other => Err(ClientError::unexpected("upload", &other)),
        }
    }

    /// Download the full payload behind `handle`. No streaming contract:
    /// chunking, if any, is internal to the transport.
    pub async fn download(&self, session: &Session, handle: &TransferHandle) -> Result<Vec<u8>> {
        let request = ClientRequest::Download {
            request_id: new_request_id(),
            session_id: session.id.clone(),
            transfer_id: handle.id().to_string(),
        };
        let raw = self
            .transport
            .send(&request)
            .await
            .map_err(|err| ClientError::Transfer {
                details: err.to_string(),
            })?;
        match decode(&raw, RequestCategory::Transfer) {
            Decoded::Transfer(TransferEvent {
                payload: Some(payload),
                ..
            }) => {
                let data = STANDARD
                    .decode(payload)
                    .map_err(|err| ClientError::Transfer {
                        details: format!("invalid payload encoding: {err}"),
                    })?;
                debug!(
                    target: "remora::transfer",
                    session_id = %session.id,
                    transfer_id = %handle,
                    bytes = data.len(),
                    "downloaded payload"
                );
                Ok(data)
            }
            Decoded::Transfer(TransferEvent { payload: None, .. }) => Err(ClientError::Transfer {
                details: format!("download response for {handle} carried no payload"),
            }),
            Decoded::Error(err) => Err(ClientError::from_wire(err)),
            other => Err(ClientError::unexpected("download", &other)),
        }
    }
}

fn content_id(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}
