// Client for the Remora remote computation service.
//
// The flow mirrors the service's protocol: open a session, upload payloads,
// submit a computation scoped to the session, poll pending jobs to a terminal
// state, download results. All components borrow the `Session` for the
// duration of a call and keep no session state of their own.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod session;
pub mod transfer;
pub mod transport;

pub use client::Client;
pub use config::{RemoraConfig, load_config};
pub use dispatch::{ComputationOutcome, ComputationRequest, ComputationResult, Dispatcher, JobToken};
pub use error::{ClientError, Result, TransportError};
pub use poll::{Backoff, PollPolicy, PollState, Poller};
pub use session::{Session, SessionManager};
pub use transfer::{DataTransmitter, TransferHandle};
pub use transport::{HttpTransport, Transport};

pub(crate) fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
