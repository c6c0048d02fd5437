//! Server side of `FetchQuote`: wraps the content source with request ids,
//! logging and metrics.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::RpcError;
use crate::metrics::Metrics;
use crate::models::{FETCH_QUOTE, FetchRequest, FetchResponse};
use crate::network::{CallResult, RpcService};
use crate::scrape::QuoteSource;

/// `20240131-235959-` followed by 8 hex chars. Only used to correlate log lines.
pub fn generate_request_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Local::now().format("%Y%m%d-%H%M%S"), &suffix[..8])
}

pub struct QuoteService<S> {
    source: S,
    metrics: Arc<Metrics>,
}

impl<S: QuoteSource> QuoteService<S> {
    pub fn new(source: S, metrics: Arc<Metrics>) -> Self {
        Self { source, metrics }
    }

    /// Always produces a response. Hard source failures are also returned as
    /// the call error so the transport reports the call as failed.
    pub async fn fetch_quote(&self, req: FetchRequest) -> CallResult {
        let request_id = generate_request_id();
        let span = tracing::info_span!("fetch_quote", request_id = %request_id);
        self.fetch_quote_inner(req).instrument(span).await
    }

    async fn fetch_quote_inner(&self, req: FetchRequest) -> CallResult {
        let url = self.source.resolve(&req.path);
        tracing::info!(path = %req.path, url = %url, "Received fetch quote request");

        let started = Instant::now();
        let outcome = self.source.fetch(&req.path).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(page) => {
                self.metrics.record(true, elapsed);
                tracing::info!(duration_ms = elapsed.as_millis() as u64, "Request completed successfully");
                CallResult {
                    response: FetchResponse {
                        quote: page.quote,
                        next_link: page.next_link,
                        previous_link: page.previous_link,
                        error: String::new(),
                    },
                    error: None,
                }
            }
            Err(err) => {
                self.metrics.record(false, elapsed);
                let message = err.to_string();
                tracing::error!(
                    error = %message,
                    hard = err.is_hard(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Failed to fetch quote"
                );
                CallResult {
                    response: FetchResponse::failed(message.clone()),
                    error: err.is_hard().then_some(message),
                }
            }
        }
    }
}

impl<S: QuoteSource> RpcService for QuoteService<S> {
    async fn call(&self, method: &str, params: FetchRequest) -> Result<CallResult, RpcError> {
        match method {
            FETCH_QUOTE => Ok(self.fetch_quote(params).await),
            other => Err(RpcError::UnknownMethod(other.to_string())),
        }
    }
}
