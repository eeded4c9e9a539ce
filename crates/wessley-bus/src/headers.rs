//! Retry-count and trace-context header conventions (§4.8, §4.10).

/// Header carrying the number of prior redelivery attempts.
pub const RETRY_COUNT: &str = "X-Retry-Count";

/// Reads `X-Retry-Count`, defaulting to 0 when absent or unparseable.
pub fn read_retry_count(headers: &async_nats::HeaderMap) -> u32 {
    headers
        .get(RETRY_COUNT)
        .map(|v| v.to_string())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Clones `headers` with `X-Retry-Count` incremented by one.
pub fn increment_retry_count(headers: &async_nats::HeaderMap) -> async_nats::HeaderMap {
    let mut out = headers.clone();
    let next = read_retry_count(headers) + 1;
    out.insert(RETRY_COUNT, next.to_string().as_str());
    out
}

/// Copies distributed-tracing headers from an inbound message onto an
/// outbound header map, so a republish or DLQ entry stays correlated with
/// its origin.
pub fn propagate_trace_context(from: &async_nats::HeaderMap, into: &mut async_nats::HeaderMap) {
    for name in ["traceparent", "tracestate"] {
        if let Some(value) = from.get(name) {
            into.insert(name, value.to_string().as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_defaults_to_zero() {
        let headers = async_nats::HeaderMap::new();
        assert_eq!(read_retry_count(&headers), 0);
    }

    #[test]
    fn increment_bumps_existing_count() {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert(RETRY_COUNT, "2");
        let bumped = increment_retry_count(&headers);
        assert_eq!(read_retry_count(&bumped), 3);
    }

    #[test]
    fn propagate_trace_context_copies_known_headers_only() {
        let mut from = async_nats::HeaderMap::new();
        from.insert("traceparent", "00-abc-def-01");
        from.insert("x-unrelated", "ignored");
        let mut into = async_nats::HeaderMap::new();
        propagate_trace_context(&from, &mut into);
        assert_eq!(into.get("traceparent").map(|v| v.to_string()), Some("00-abc-def-01".to_string()));
        assert!(into.get("x-unrelated").is_none());
    }
}
