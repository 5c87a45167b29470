use async_trait::async_trait;
use reqwest::header;
use tracing::debug;

use remora_wire::ClientRequest;

use crate::config::RemoraConfig;
use crate::error::{ClientError, Result, TransportError};

/// One network round-trip: send a request, return the raw response body.
///
/// The body is handed to `remora_wire::decode` by whichever component made
/// the request; the transport itself never interprets it. Implementations
/// must be shareable across components (`Arc<dyn Transport>`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ClientRequest)
    -> std::result::Result<Vec<u8>, TransportError>;
}

/// Production transport: JSON over HTTPS, one route per request kind.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &RemoraConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(api_key) = &config.api_key {
            let value = header::HeaderValue::from_str(api_key).map_err(|_| {
                ClientError::Configuration("API key contains invalid header characters".to_string())
            })?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ClientRequest,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let url = format!("{}/{}", self.base_url, request.route());
        debug!(
            target: "remora::transport",
            route = request.route(),
            request_id = request.request_id(),
            "sending request"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network {
                details: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network {
                details: e.to_string(),
            })?;

        // 4xx bodies are normally `error_response` messages and flow through
        // to the decoder. 5xx means the service itself failed; there is no
        // message worth decoding.
        if status.is_server_error() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                details: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}
