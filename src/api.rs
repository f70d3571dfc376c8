//! API Operations
//!
//! Typed entry points over the upstream API. Each operation builds one
//! request descriptor and submits it to the shared [`RequestQueue`], with the
//! [`RetryExecutor`] wrapped around the network call inside the queued thunk.
//! The client is the single service object that owns the process-wide queue;
//! clone it (cheap) rather than building a second one.

use crate::cancel::CancellationToken;
use crate::config::RelayConfig;
use crate::error::ApiError;
use crate::queue::{PendingCall, QueueStats, RequestQueue};
use crate::retry::{RetryAttempt, RetryExecutor};
use crate::transport::{ApiRequest, HttpTransport, Transport, TransportResponse};
use crate::types::{ApiResponse, DetailResponse, MalId, SearchResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default page size, also the largest page the upstream API serves.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Clone)]
pub struct JikanClient {
    transport: Arc<dyn Transport>,
    queue: RequestQueue,
    retry: RetryExecutor,
}

impl JikanClient {
    pub fn new(transport: Arc<dyn Transport>, queue: RequestQueue, retry: RetryExecutor) -> Self {
        Self {
            transport,
            queue,
            retry,
        }
    }

    /// Build a client with an HTTP transport, pacer and retry policy from config.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.api.transport_options())?;
        Ok(Self::new(
            Arc::new(transport),
            RequestQueue::new(config.pacing.pacer()),
            RetryExecutor::new(config.retry.policy()),
        ))
    }

    /// `GET /anime?q={term}&page={page}&limit={page_size}`
    ///
    /// The call is enqueued before this returns; await the handle for the
    /// result. Call from within a tokio runtime, otherwise the handle
    /// resolves `QueueClosed`. Blank terms are not rejected here; whether to
    /// search at all is the caller's policy.
    pub fn search(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
        cancel: Option<&CancellationToken>,
    ) -> PendingCall<SearchResponse> {
        debug_assert!(page >= 1, "page is 1-based");
        debug_assert!(page_size > 0, "page_size must be positive");

        let request = ApiRequest::get("anime")
            .with_query("q", term)
            .with_query("page", page)
            .with_query("limit", page_size);

        info!(term = %term, page, page_size, "Queueing anime search");
        self.submit(request, cancel.cloned())
    }

    /// `GET /anime/{id}`
    pub fn get_by_id(&self, id: MalId) -> PendingCall<DetailResponse> {
        self.get_by_id_with_cancel(id, None)
    }

    pub fn get_by_id_with_cancel(
        &self,
        id: MalId,
        cancel: Option<&CancellationToken>,
    ) -> PendingCall<DetailResponse> {
        let request = ApiRequest::get(format!("anime/{}", id));
        info!(mal_id = id, "Queueing anime detail lookup");
        self.submit(request, cancel.cloned())
    }

    /// Enqueue one request; the retry loop runs inside the queued thunk so
    /// retries stay behind the single-flight gate.
    fn submit<T>(
        &self,
        request: ApiRequest,
        cancel: Option<CancellationToken>,
    ) -> PendingCall<ApiResponse<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let retry = self.retry.clone();
        let token = cancel.clone();

        self.queue.enqueue(
            move || async move {
                retry
                    .execute(
                        |attempt: RetryAttempt| {
                            let transport = Arc::clone(&transport);
                            let request = request.clone();
                            async move { fetch_json(transport.as_ref(), &request, attempt).await }
                        },
                        token.as_ref(),
                    )
                    .await
            },
            cancel,
        )
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn retry_executor(&self) -> &RetryExecutor {
        &self.retry
    }
}

/// Upstream error body, e.g.
/// `{"status":404,"type":"BadResponseException","message":"Resource does not exist"}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn status_error(response: &TransportResponse) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_default();
    ApiError::status(response.status, message)
}

async fn fetch_json<T>(
    transport: &dyn Transport,
    request: &ApiRequest,
    attempt: RetryAttempt,
) -> Result<ApiResponse<T>, ApiError>
where
    T: DeserializeOwned,
{
    debug!(request = %request, attempt = attempt.attempt, "Issuing request");
    let response = transport.get(request).await?;

    if !response.is_success() {
        return Err(status_error(&response));
    }

    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
