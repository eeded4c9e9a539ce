//! Shared per-collector HTTP harness (§4.4): a dedicated client, a
//! ticker-style rate limiter, and a retry wrapper that honours the
//! retryable/terminal status-code split.

use std::sync::Arc;
use std::time::Duration;

use wessley_core::{Context, Error, RateLimiter, Result, RetryOptions};

/// Owns the HTTP client, rate limiter, and retry policy a single collector
/// instance uses for every outbound request.
pub struct CollectorHttp {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    retry: RetryOptions,
}

impl CollectorHttp {
    pub fn new(user_agent: &str, tick_interval: Duration, retry: RetryOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(wessley_core::constants::DEFAULT_HTTP_REQUEST_TIMEOUT)
            .connect_timeout(wessley_core::constants::DEFAULT_HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("build http client: {e}")))?;
        let rate = 1.0 / tick_interval.as_secs_f64().max(0.001);
        Ok(CollectorHttp {
            client,
            limiter: Arc::new(RateLimiter::new(rate, 1.0)),
            retry,
        })
    }

    /// GETs `url`, waiting for the ticker on every attempt and retrying per
    /// the status-code policy: `200` succeeds; `429`/`5xx` is retryable;
    /// any other non-200 is terminal (no retry).
    pub async fn get_text(&self, ctx: &Context, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            ctx.check()?;
            self.limiter.wait(ctx).await?;

            match self.send_once(url).await {
                Ok(body) => return Ok(body),
                Err(Error::TransientIo(msg)) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts.max(1) {
                        return Err(Error::TransientIo(msg));
                    }
                    let wait = self.retry.wait_for(attempt - 1);
                    ctx.sleep(wait).await?;
                }
                Err(terminal) => return Err(terminal),
            }
        }
    }

    async fn send_once(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::TransientIo(format!("http request to {url}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| Error::TerminalIo(format!("read body from {url}: {e}")))
        } else if status.as_u16() == 429 || status.is_server_error() {
            Err(Error::TransientIo(format!("http {status} from {url}")))
        } else {
            Err(Error::TerminalIo(format!("http {status} from {url}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retryable_status_eventually_exhausts_attempts() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let retry = RetryOptions {
            max_attempts: 2,
            initial_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
            jitter: false,
        };
        let http = CollectorHttp::new("wessley-test/1.0", Duration::from_millis(1), retry).unwrap();
        let ctx = Context::background();
        let result = http.get_text(&ctx, &server.uri()).await;
        assert!(matches!(result, Err(Error::TransientIo(_))));
    }

    #[tokio::test]
    async fn terminal_status_does_not_retry() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryOptions {
            max_attempts: 5,
            initial_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
            jitter: false,
        };
        let http = CollectorHttp::new("wessley-test/1.0", Duration::from_millis(1), retry).unwrap();
        let ctx = Context::background();
        let result = http.get_text(&ctx, &server.uri()).await;
        assert!(matches!(result, Err(Error::TerminalIo(_))));
    }

    #[tokio::test]
    async fn success_returns_body() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let http = CollectorHttp::new("wessley-test/1.0", Duration::from_millis(1), RetryOptions::default()).unwrap();
        let ctx = Context::background();
        let body = http.get_text(&ctx, &server.uri()).await.unwrap();
        assert_eq!(body, "hello");
    }
}
