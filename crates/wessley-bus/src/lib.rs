//! NATS-backed message bus and typed helpers (C10, §4.10).

pub mod dlq;
pub mod headers;
pub mod subjects;

use futures::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;
use wessley_core::{Error, Result};

/// JSON-encodes `message` and publishes it to `subject`, propagating any
/// trace-context headers already present on `ctx_headers`.
pub async fn publish<T: Serialize>(
    client: &async_nats::Client,
    subject: &str,
    message: &T,
    headers: async_nats::HeaderMap,
) -> Result<()> {
    let payload = serde_json::to_vec(message).map_err(|e| Error::Other(format!("encode message: {e}")))?;
    client
        .publish_with_headers(subject.to_string(), headers, payload.into())
        .await
        .map_err(|e| Error::Other(format!("publish {subject}: {e}")))?;
    Ok(())
}

/// Subscribes to `subject`, decoding each message as `T`. Messages that
/// fail to decode are dropped and logged, never surfaced to `handler`.
pub async fn subscribe<T, F, Fut>(client: &async_nats::Client, subject: &str, mut handler: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T, async_nats::Message) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut subscriber = client
        .subscribe(subject.to_string())
        .await
        .map_err(|e| Error::Other(format!("subscribe {subject}: {e}")))?;

    while let Some(message) = subscriber.next().await {
        match serde_json::from_slice::<T>(&message.payload) {
            Ok(decoded) => handler(decoded, message).await,
            Err(e) => warn!(subject, error = %e, "dropping message that failed to decode"),
        }
    }
    Ok(())
}

/// Publishes `request` to `subject` and decodes the reply as `R`.
pub async fn request<T: Serialize, R: DeserializeOwned>(
    client: &async_nats::Client,
    subject: &str,
    request: &T,
) -> Result<R> {
    let payload = serde_json::to_vec(request).map_err(|e| Error::Other(format!("encode request: {e}")))?;
    let reply = client
        .request(subject.to_string(), payload.into())
        .await
        .map_err(|e| Error::Other(format!("request {subject}: {e}")))?;
    serde_json::from_slice(&reply.payload).map_err(|e| Error::Other(format!("decode reply: {e}")))
}
