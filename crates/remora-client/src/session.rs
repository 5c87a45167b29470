use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use remora_wire::{ClientRequest, Decoded, RequestCategory, SessionEvent, decode};

use crate::error::{ClientError, Result};
use crate::new_request_id;
use crate::transport::Transport;

/// A logical working context on the compute service.
///
/// Immutable once created. The upload and download prefixes are local-only
/// metadata telling the data transmitter where session-scoped blobs live;
/// the service garbage-collects everything under them when the session is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub upload_prefix: String,
    pub download_prefix: String,
    pub created_at: DateTime<Utc>,
}

/// Creates and deletes sessions. Holds no session state itself.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Open a new session.
    ///
    /// Not idempotent: every call creates an independent remote session, and
    /// the caller is responsible for closing each one it opens.
    pub async fn open(&self) -> Result<Session> {
        let request = ClientRequest::CreateSession {
            request_id: new_request_id(),
        };
        let raw = self.transport.send(&request).await?;
        match decode(&raw, RequestCategory::Session) {
            Decoded::Session(SessionEvent::Created {
                id,
                upload_prefix,
                download_prefix,
            }) => {
                debug!(target: "remora::session", session_id = %id, "session opened");
                Ok(Session {
                    id,
                    upload_prefix,
                    download_prefix,
                    created_at: Utc::now(),
                })
            }
            Decoded::Error(err) => Err(ClientError::from_wire(err)),
            other => Err(ClientError::unexpected("create_session", &other)),
        }
    }

    /// Close a session, releasing its server-side resources.
    ///
    /// Call at most once per session. Closing the same session twice is out
    /// of contract: the server may reject the second call or may have already
    /// reused the id, and this client does not guard against it.
    pub async fn close(&self, session: &Session) -> Result<()> {
        let request = ClientRequest::DeleteSession {
            request_id: new_request_id(),
            session_id: session.id.clone(),
        };
        let raw = self.transport.send(&request).await?;
        match decode(&raw, RequestCategory::Session) {
            Decoded::Session(SessionEvent::Deleted) => {
                debug!(target: "remora::session", session_id = %session.id, "session closed");
                Ok(())
            }
            Decoded::Error(err) => Err(ClientError::from_wire(err)),
            other => Err(ClientError::unexpected("delete_session", &other)),
        }
    }
}
