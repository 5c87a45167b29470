//! Full protocol flow against an in-process fake service: open a session,
//! upload a payload, run a computation through its pending phase, download
//! the stored result, close the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};

use remora_client::{
    Backoff, Client, ClientError, ComputationRequest, ComputationResult, PollPolicy, Transport,
    TransportError,
};
use remora_wire::{ClientRequest, ResultPayload, ServerMessage};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Minimal in-memory rendition of the compute service. Computations answer
/// `pending` a configured number of times before finishing; `sum_columns`
/// actually sums the columns of its CSV input so the downloaded result is
/// meaningful.
struct FakeService {
    state: Mutex<FakeServiceState>,
    pending_rounds: u32,
}

struct FakeServiceState {
    blobs: HashMap<String, Vec<u8>>,
    jobs: HashMap<String, JobState>,
    sessions: Vec<String>,
    seen_routes: Vec<&'static str>,
    next_job: u32,
}

struct JobState {
    remaining_pending: u32,
    result_transfer_id: String,
}

impl FakeService {
    fn new(pending_rounds: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeServiceState {
                blobs: HashMap::new(),
                jobs: HashMap::new(),
                sessions: Vec::new(),
                seen_routes: Vec::new(),
                next_job: 0,
            }),
            pending_rounds,
        })
    }

    fn seen_routes(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().seen_routes.clone()
    }

    fn sum_columns(input: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(input);
        let mut sums: Vec<i64> = Vec::new();
        for line in text.lines() {
            for (i, cell) in line.split(',').enumerate() {
                let value: i64 = cell.trim().parse().unwrap();
                if i == sums.len() {
                    sums.push(value);
                } else {
                    sums[i] += value;
                }
            }
        }
        sums.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
            .into_bytes()
    }

    fn handle(&self, request: &ClientRequest) -> ServerMessage {
        let mut state = self.state.lock().unwrap();
        state.seen_routes.push(request.route());
        match request {
            ClientRequest::CreateSession { .. } => {
                let id = format!("s{}", state.sessions.len() + 1);
                state.sessions.push(id.clone());
                ServerMessage::CreateSessionResponse {
                    upload_prefix: format!("uploads/{id}/"),
                    download_prefix: format!("downloads/{id}/"),
                    id,
                }
            }
            ClientRequest::DeleteSession { session_id, .. } => {
                match state.sessions.iter().position(|s| s == session_id) {
                    Some(index) => {
                        state.sessions.remove(index);
                        ServerMessage::DeleteSessionResponse {}
                    }
                    None => ServerMessage::ErrorResponse {
                        code: "session_invalid".to_string(),
                        message: format!("unknown session {session_id}"),
                    },
                }
            }
            ClientRequest::Upload {
                transfer_id,
                payload,
                ..
            } => {
                let data = STANDARD.decode(payload).unwrap();
                state.blobs.insert(transfer_id.clone(), data);
                ServerMessage::DataTransferResponse {
                    transfer_id: transfer_id.clone(),
                    payload: None,
                }
            }
            ClientRequest::Download { transfer_id, .. } => match state.blobs.get(transfer_id) {
                Some(data) => ServerMessage::DataTransferResponse {
                    transfer_id: transfer_id.clone(),
                    payload: Some(STANDARD.encode(data)),
                },
                None => ServerMessage::ErrorResponse {
                    code: "not_found".to_string(),
                    message: format!("no transfer with id {transfer_id}"),
                },
            },
            ClientRequest::Compute { op, inputs, .. } => {
                assert_eq!(op, "sum_columns");
                let input = state.blobs.get(&inputs[0]).unwrap().clone();
                let output = Self::sum_columns(&input);
                let result_transfer_id = format!("out{}", state.next_job + 1);
                state.blobs.insert(result_transfer_id.clone(), output);

                state.next_job += 1;
                if self.pending_rounds == 0 {
                    return ServerMessage::ComputationResponse {
                        result: ResultPayload::Stored {
                            transfer_id: result_transfer_id,
                        },
                        messages: vec![],
                    };
                }
                let job_id = "abc".to_string();
                state.jobs.insert(
                    job_id.clone(),
                    JobState {
                        remaining_pending: self.pending_rounds,
                        result_transfer_id,
                    },
                );
                ServerMessage::PendingComputationResponse {
                    pending_computation_id: job_id,
                }
            }
            ClientRequest::FollowUp {
                pending_computation_id,
                ..
            } => {
                let job = state.jobs.get_mut(pending_computation_id).unwrap();
                if job.remaining_pending > 0 {
                    job.remaining_pending -= 1;
                    ServerMessage::PendingComputationResponse {
                        pending_computation_id: pending_computation_id.clone(),
                    }
                } else {
                    ServerMessage::ComputationResponse {
                        result: ResultPayload::Stored {
                            transfer_id: job.result_transfer_id.clone(),
                        },
                        messages: vec![],
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Transport for FakeService {
    async fn send(&self, request: &ClientRequest) -> Result<Vec<u8>, TransportError> {
        Ok(serde_json::to_vec(&self.handle(request)).unwrap())
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(60),
        backoff: Backoff::Fixed,
        max_transient_retries: 3,
    }
}

#[tokio::test(start_paused = true)]
async fn full_session_flow_sums_columns() {
    init_tracing();
    let service = FakeService::new(3);
    let mut client =
        Client::with_transport(service.clone() as Arc<dyn Transport>).with_poll_policy(fast_policy());

    client.open_session().await.unwrap();

    let input = client.upload(b"1,2,3\n4,5,6").await.unwrap();
    let result = client
        .compute(ComputationRequest::new("sum_columns").input(&input))
        .await
        .unwrap();

    let handle = match result {
        ComputationResult::Stored(handle) => handle,
        other => panic!("expected stored result, got {other:?}"),
    };
    let output = client.download(&handle).await.unwrap();
    assert_eq!(output, b"5,7,9");

    client.close_session().await.unwrap();
    assert!(client.session().is_none());

    // One round-trip per step; three pending follow-ups before the result.
    assert_eq!(
        service.seen_routes(),
        vec![
            "create_session",
            "upload",
            "compute",
            "follow_up",
            "follow_up",
            "follow_up",
            "follow_up",
            "download",
            "delete_session",
        ]
    );
}

#[tokio::test]
async fn closing_a_session_twice_is_rejected_by_the_service() {
    init_tracing();
    let service = FakeService::new(0);
    let manager = remora_client::SessionManager::new(service.clone() as Arc<dyn Transport>);

    let session = manager.open().await.unwrap();
    manager.close(&session).await.unwrap();

    let err = manager.close(&session).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionInvalid { .. }));
}

#[tokio::test(start_paused = true)]
async fn synchronous_completion_skips_the_pending_phase() {
    init_tracing();
    let service = FakeService::new(0);
    let mut client =
        Client::with_transport(service.clone() as Arc<dyn Transport>).with_poll_policy(fast_policy());

    client.open_session().await.unwrap();
    let input = client.upload(b"10,20\n30,40").await.unwrap();
    let result = client
        .compute(ComputationRequest::new("sum_columns").input(&input))
        .await
        .unwrap();

    let handle = match result {
        ComputationResult::Stored(handle) => handle,
        other => panic!("expected stored result, got {other:?}"),
    };
    assert_eq!(client.download(&handle).await.unwrap(), b"40,60");
}
