use std::sync::Arc;

use crate::config::RemoraConfig;
use crate::dispatch::{ComputationOutcome, ComputationRequest, ComputationResult, Dispatcher};
use crate::error::{ClientError, Result};
use crate::poll::{PollPolicy, Poller};
use crate::session::{Session, SessionManager};
use crate::transfer::{DataTransmitter, TransferHandle};
use crate::transport::{HttpTransport, Transport};

/// High-level entry point tying the components together around one tracked
/// session.
///
/// The components underneath are session-agnostic; this facade tracks at most
/// one open session at a time and threads it through every call. Callers that
/// need several concurrent sessions use the components directly.
pub struct Client {
    transport: Arc<dyn Transport>,
    sessions: SessionManager,
    dispatcher: Dispatcher,
    poller: Poller,
    transmitter: DataTransmitter,
    session: Option<Session>,
}

impl Client {
    /// Build a client over the production HTTP transport.
    pub fn from_config(config: &RemoraConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport))
    }

    /// Build a client over any transport. This is the seam tests use.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            sessions: SessionManager::new(transport.clone()),
            dispatcher: Dispatcher::new(transport.clone()),
            poller: Poller::new(transport.clone()),
            transmitter: DataTransmitter::new(transport.clone()),
            transport,
            session: None,
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poller = Poller::with_policy(self.transport.clone(), policy);
        self
    }

    /// The currently open session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Open a session and start tracking it.
    ///
    /// Fails with `SessionInvalid` when a session is already open; close it
    /// first. This keeps the facade's one-session bookkeeping honest rather
    /// than silently leaking the previous remote session.
    pub async fn open_session(&mut self) -> Result<&Session> {
        if let Some(session) = &self.session {
            return Err(ClientError::SessionInvalid {
                details: format!("session {} is already open", session.id),
            });
        }
        let session = self.sessions.open().await?;
        Ok(self.session.insert(session))
    }

    /// Close the tracked session. A no-op when none is open.
    pub async fn close_session(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => self.sessions.close(&session).await,
            None => Ok(()),
        }
    }

    pub async fn upload(&self, data: &[u8]) -> Result<TransferHandle> {
        self.transmitter.upload(self.current()?, data).await
    }

    pub async fn download(&self, handle: &TransferHandle) -> Result<Vec<u8>> {
        self.transmitter.download(self.current()?, handle).await
    }

    /// Submit a computation without waiting for it to finish.
    pub async fn submit(&self, request: ComputationRequest) -> Result<ComputationOutcome> {
        self.dispatcher.submit(self.current()?, request).await
    }

    /// Submit a computation and drive it to a terminal result, polling through
    /// any pending phase.
    pub async fn compute(&self, request: ComputationRequest) -> Result<ComputationResult> {
        let session = self.current()?;
        match self.dispatcher.submit(session, request).await? {
            ComputationOutcome::Completed(result) => Ok(result),
            ComputationOutcome::Pending(job) => self.poller.run(session, job).await,
        }
    }

    fn current(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| ClientError::SessionInvalid {
            details: "no session open".to_string(),
        })
    }
}
