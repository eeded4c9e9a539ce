//! NATS consumer for subject `engine.ingest` (§4.8): decode, dedup-gated
//! pipeline run, and dead-letter handling on failure.
//!
//! Built on core NATS pub/sub (no broker redelivery), so the retry loop
//! the spec describes is implemented at the application level: a failed
//! document is republished with an incremented `X-Retry-Count` header
//! until `max_retries`, then routed to the DLQ subject. "Ack" has no
//! broker counterpart here; returning from the handler is the ack.

use std::sync::Arc;

use tracing::warn;
use wessley_core::{Context, Result};
use wessley_domain::ScrapedDocument;

use crate::pipeline::Pipeline;

/// Subscribes to [`wessley_bus::subjects::INGEST`] and runs every decoded
/// document through `pipeline`, forever (or until the subscription ends).
pub async fn run_consumer(client: async_nats::Client, pipeline: Arc<Pipeline>, max_retries: u32) -> Result<()> {
    wessley_bus::subscribe::<serde_json::Value, _, _>(
        &client,
        wessley_bus::subjects::INGEST,
        move |payload, message| {
            let client = client.clone();
            let pipeline = pipeline.clone();
            async move {
                handle_message(&client, &pipeline, max_retries, payload, message).await;
            }
        },
    )
    .await
}

async fn handle_message(
    client: &async_nats::Client,
    pipeline: &Pipeline,
    max_retries: u32,
    payload: serde_json::Value,
    message: async_nats::Message,
) {
    let doc: ScrapedDocument = match serde_json::from_value(payload.clone()) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "dropping ingest message that isn't a valid document");
            return;
        }
    };

    let inbound_headers = message.headers.clone().unwrap_or_default();
    let retry_count = wessley_bus::headers::read_retry_count(&inbound_headers);
    let ctx = Context::background();

    if let Err(e) = pipeline.process(&ctx, doc).await {
        if retry_count < max_retries {
            let mut next_headers = wessley_bus::headers::increment_retry_count(&inbound_headers);
            wessley_bus::headers::propagate_trace_context(&inbound_headers, &mut next_headers);
            if let Err(publish_err) =
                wessley_bus::publish(client, wessley_bus::subjects::INGEST, &payload, next_headers).await
            {
                warn!(error = %publish_err, "failed to republish ingest message for retry");
            }
        } else {
            let dlq_message = wessley_bus::dlq::DlqMessage {
                post: payload,
                error: e.to_string(),
                retries: retry_count,
            };
            if let Err(publish_err) = wessley_bus::publish(
                client,
                wessley_bus::subjects::INGEST_DLQ,
                &dlq_message,
                async_nats::HeaderMap::new(),
            )
            .await
            {
                warn!(error = %publish_err, "failed to publish to dead-letter subject");
            }
        }
    }
}
