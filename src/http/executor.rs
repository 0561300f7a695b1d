use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use dashmap::DashMap;
use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, redirect};
use tracing::{debug, warn};

use crate::error::HttpError;
use crate::model::{DEFAULT_USER_AGENT, RequestSpec, TransportOptions};
use crate::vars::VariableStore;

use super::builders::build_request;
use super::pool::{ExchangeBuffers, ResponseRecord};

/// Timing and size facts of one exchange. The request and response
/// themselves are written into the caller's [`ExchangeBuffers`].
#[derive(Debug)]
pub struct ExecutionFacts {
    pub elapsed: Duration,
    pub bytes_sent: u64,
    pub error: Option<HttpError>,
    /// Body as rendered text; used when the recorded request body is empty.
    pub body_text: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

/// Performs one HTTP exchange.
///
/// Implementations never fail outright: transport problems are reported
/// through [`ExecutionFacts::error`] and whatever was received stays in the
/// buffers.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        spec: &RequestSpec,
        options: &TransportOptions,
        store: &VariableStore,
        exchange: &mut ExchangeBuffers,
    ) -> ExecutionFacts;
}

#[derive(Debug, Default)]
struct Attempt {
    body_text: String,
    bytes_sent: u64,
}

/// reqwest-backed executor. Keeps one client per distinct set of transport options.
#[derive(Debug, Default)]
pub struct ReqwestExecutor {
    clients: DashMap<TransportOptions, Client>,
}

impl ReqwestExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, options: &TransportOptions) -> Result<Client, HttpError> {
        if let Some(client) = self.clients.get(options) {
            return Ok(client.value().clone());
        }
        let client = build_client(options)?;
        self.clients.insert(options.clone(), client.clone());
        Ok(client)
    }

    async fn send(
        &self,
        spec: &RequestSpec,
        options: &TransportOptions,
        store: &VariableStore,
        exchange: &mut ExchangeBuffers,
        attempt: &mut Attempt,
    ) -> Result<(), HttpError> {
        let client = self.client_for(options)?;
        let built = build_request(&client, spec, store, &mut exchange.request)?;
        attempt.body_text = built.body_text;
        attempt.bytes_sent = exchange.request.wire_len();

        let response = client
            .execute(built.request)
            .await
            .map_err(|source| HttpError::RequestFailed { source })?;
        record_response(response, &mut exchange.response).await
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(
        &self,
        spec: &RequestSpec,
        options: &TransportOptions,
        store: &VariableStore,
        exchange: &mut ExchangeBuffers,
    ) -> ExecutionFacts {
        let started_at = Local::now();
        let start = Instant::now();
        let mut attempt = Attempt::default();
        let error = self
            .send(spec, options, store, exchange, &mut attempt)
            .await
            .err();
        let elapsed = start.elapsed();
        let ended_at = Local::now();

        if let Some(err) = error.as_ref() {
            if err.is_timeout() {
                warn!("Request to {} timed out: {}", exchange.request.url, err);
            } else {
                debug!("Request to {} failed: {}", exchange.request.url, err);
            }
        }

        ExecutionFacts {
            elapsed,
            bytes_sent: attempt.bytes_sent,
            error,
            body_text: attempt.body_text,
            started_at,
            ended_at,
        }
    }
}

fn build_client(options: &TransportOptions) -> Result<Client, HttpError> {
    let redirect_policy = if options.follow_redirects {
        redirect::Policy::limited(options.max_redirects)
    } else {
        redirect::Policy::none()
    };
    let mut builder = Client::builder()
        .user_agent(options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
        .redirect(redirect_policy)
        .danger_accept_invalid_certs(options.insecure);
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = options.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    builder
        .build()
        .map_err(|source| HttpError::BuildClientFailed { source })
}

/// Copies status, headers, and body into `record`. A body read failure keeps
/// the bytes received so far.
async fn record_response(
    response: reqwest::Response,
    record: &mut ResponseRecord,
) -> Result<(), HttpError> {
    record.status = response.status().as_u16();
    record.content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(-1);
    for (name, value) in response.headers() {
        record.headers.push((
            name.as_str().to_owned(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        ));
    }

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|source| HttpError::ReadBodyFailed { source })?;
        record.body.extend_from_slice(&bytes);
    }
    Ok(())
}
