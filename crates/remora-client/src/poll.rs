use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use remora_wire::{ClientRequest, Decoded, RequestCategory, decode};

use crate::dispatch::{ComputationResult, JobToken, relay_notes};
use crate::error::{ClientError, Result};
use crate::new_request_id;
use crate::session::Session;
use crate::transport::Transport;

/// Delay schedule between poll ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same interval between every tick.
    Fixed,
    /// Interval doubles each tick, capped.
    Exponential { cap: Duration },
}

impl Backoff {
    fn delay(self, interval: Duration, tick: u32) -> Duration {
        match self {
            Self::Fixed => interval,
            Self::Exponential { cap } => {
                let factor = 1u32 << tick.min(16);
                interval.saturating_mul(factor).min(cap)
            }
        }
    }
}

/// Polling cadence and budgets. Everything here is injectable so tests can
/// exercise retry and timeout behavior deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Base delay between ticks.
    pub interval: Duration,
    /// Total budget measured from the first tick; once elapsed, the poll
    /// reaches `TimedOut` and stops.
    pub timeout: Duration,
    pub backoff: Backoff,
    /// Consecutive transport failures tolerated before the poll fails.
    pub max_transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
            backoff: Backoff::Fixed,
            max_transient_retries: 3,
        }
    }
}

/// Poll progress. `Result`, `Failed`, and `TimedOut` are terminal.
#[derive(Debug)]
pub enum PollState {
    Pending,
    Result(ComputationResult),
    Failed(ClientError),
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Drives a pending job token to a terminal state.
///
/// One `follow_up` round-trip per tick, with the policy's delay between
/// ticks; the inter-tick sleep is the only suspension point besides the
/// round-trips themselves. Abandoning the poll does not cancel the remote
/// computation; it runs to completion or failure server-side regardless.
pub struct Poller {
    transport: Arc<dyn Transport>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_policy(transport, PollPolicy::default())
    }

    pub fn with_policy(transport: Arc<dyn Transport>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll `job` until it reaches a terminal state. The token is consumed:
    /// it identifies nothing once the job is terminal.
    pub async fn run(&self, session: &Session, job: JobToken) -> Result<ComputationResult> {
        let started = Instant::now();
        let mut tick: u32 = 0;
        let mut transient_failures: u32 = 0;

        loop {
            let state = match self.tick(session, &job).await {
                Ok(decoded) => {
                    transient_failures = 0;
                    Self::transition(decoded)
                }
                Err(err) => {
                    transient_failures += 1;
                    if transient_failures > self.policy.max_transient_retries {
                        PollState::Failed(err.into())
                    } else {
                        warn!(
                            target: "remora::poll",
                            job = %job,
                            consecutive_failures = transient_failures,
                            "transient transport error while polling: {err}"
                        );
                        PollState::Pending
                    }
                }
            };

            let state = if state.is_terminal() || started.elapsed() < self.policy.timeout {
                state
            } else {
                PollState::TimedOut
            };

            match state {
                PollState::Result(result) => {
                    debug!(target: "remora::poll", job = %job, ticks = tick + 1, "job finished");
                    return Ok(result);
                }
                PollState::Failed(err) => return Err(err),
                PollState::TimedOut => {
                    return Err(ClientError::TimedOut {
                        details: format!(
                            "job {job}: no terminal state after {:.1}s",
                            started.elapsed().as_secs_f64()
                        ),
                    });
                }
                PollState::Pending => {}
            }

            tokio::time::sleep(self.policy.backoff.delay(self.policy.interval, tick)).await;
            tick += 1;
        }
    }

    /// One status round-trip.
    async fn tick(
        &self,
        session: &Session,
        job: &JobToken,
    ) -> std::result::Result<Decoded, crate::error::TransportError> {
        let request = ClientRequest::FollowUp {
            request_id: new_request_id(),
            session_id: session.id.clone(),
            pending_computation_id: job.as_str().to_string(),
        };
        let raw = self.transport.send(&request).await?;
        Ok(decode(&raw, RequestCategory::JobStatus))
    }

    /// Map one decoded status response onto the state machine.
    fn transition(decoded: Decoded) -> PollState {
        match decoded {
            Decoded::Computation { result, notes } => {
                relay_notes(&notes);
                PollState::Result(result.into())
            }
            Decoded::Pending { .. } => PollState::Pending,
            Decoded::Error(err) => PollState::Failed(ClientError::from_wire(err)),
            other => PollState::Failed(ClientError::unexpected("follow_up", &other)),
        }
    }
}
