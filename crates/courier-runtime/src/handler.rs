//! HTTP request handler

use bytes::Bytes;
use courier_core::response::responses;
use courier_core::{Body, Error, RequestContext, Result, REQUEST_ID_HEADER};
use courier_proxy::{ForwardProxy, ProxyOutcome};
use http::{HeaderValue, Method, Request, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Health check path
pub const PING_PATH: &str = "/ping";
/// Forwarding path
pub const PROXY_PATH: &str = "/proxy";

/// HTTP request handler
#[derive(Debug, Clone)]
pub struct RequestHandler {
    proxy: ForwardProxy,
    in_flight: Arc<AtomicUsize>,
}

/// Counts a request as in flight until dropped
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestHandler {
    /// Create a new request handler
    pub fn new(proxy: ForwardProxy) -> Self {
        Self::with_counter(proxy, Arc::new(AtomicUsize::new(0)))
    }

    /// Create a handler sharing an in-flight counter
    pub fn with_counter(proxy: ForwardProxy, in_flight: Arc<AtomicUsize>) -> Self {
        Self { proxy, in_flight }
    }

    /// Requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Handle an incoming HTTP request
    pub async fn handle<B>(&self, req: Request<B>) -> Result<Response<Body>>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let _guard = InFlightGuard::new(&self.in_flight);
        let ctx = RequestContext::new(req.method().clone(), req.uri().path());

        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
        );

        async move {
            debug!("Handling request");

            let mut response = self.route(req).await?;

            let request_id = HeaderValue::from_str(&ctx.request_id)
                .map_err(|e| Error::Internal(format!("Invalid request id header: {e}")))?;
            response.headers_mut().insert(REQUEST_ID_HEADER, request_id);

            info!(
                status = response.status().as_u16(),
                latency_ms = %ctx.elapsed().as_millis(),
                "Request completed"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }

    async fn route<B>(&self, req: Request<B>) -> Result<Response<Body>>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path();

        if path == PING_PATH && (req.method() == Method::GET || req.method() == Method::HEAD) {
            return responses::ok().text("pong");
        }

        if path == PROXY_PATH {
            let outcome = self.proxy.handle(req).await;
            log_outcome(&outcome);
            return self.proxy.respond(outcome);
        }

        responses::not_found()
    }
}

fn log_outcome(outcome: &ProxyOutcome) {
    match outcome {
        ProxyOutcome::Success(reply) => debug!(
            upstream_status = reply.status.as_u16(),
            bytes = reply.body.len(),
            capped = reply.body.is_capped(),
            "Upstream replied"
        ),
        ProxyOutcome::Unauthenticated => warn!("Rejected request without valid credentials"),
        ProxyOutcome::ClientError {
            status, message, ..
        } => warn!(status = status.as_u16(), error = %message, "Rejected request"),
        ProxyOutcome::UpstreamTimeout => warn!("Upstream request timed out"),
        ProxyOutcome::UpstreamError(message) => error!(error = %message, "Proxy error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_auth::{BasicAuth, Credentials};
    use courier_core::ErrorBody;
    use courier_proxy::{CapturedBody, Forward, ForwardRequest, ResponseWriter, UpstreamReply};
    use http::{header, StatusCode};
    use http_body_util::{BodyExt, Full};
    use mockall::mock;

    mock! {
        Upstream {}

        #[async_trait]
        impl Forward for Upstream {
            async fn forward(&self, request: ForwardRequest) -> Result<UpstreamReply>;
        }
    }

    fn handler(upstream: MockUpstream) -> RequestHandler {
        let proxy = ForwardProxy::new(
            BasicAuth::new(Credentials::new("relay", "s3cret"), "Secure Area"),
            Arc::new(upstream),
            ResponseWriter::default(),
            1024,
        );
        RequestHandler::new(proxy)
    }

    fn hello_reply() -> UpstreamReply {
        UpstreamReply {
            status: StatusCode::OK,
            content_type: Some("text/plain".to_string()),
            body: CapturedBody::from(Bytes::from_static(b"hello")),
        }
    }

    fn request(method: Method, path: &str) -> http::request::Builder {
        Request::builder().method(method).uri(path)
    }

    fn authorized(builder: http::request::Builder) -> http::request::Builder {
        builder.header(
            header::AUTHORIZATION,
            Credentials::new("relay", "s3cret").to_header_value(),
        )
    }

    fn empty(builder: http::request::Builder) -> Request<Full<Bytes>> {
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn body_of(response: Response<Body>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_ping_without_auth() {
        let mut upstream = MockUpstream::new();
        upstream.expect_forward().times(0);

        let response = handler(upstream)
            .handle(empty(request(Method::GET, "/ping")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_of(response).await[..], b"pong");
    }

    #[tokio::test]
    async fn test_ping_ignores_auth_headers() {
        let response = handler(MockUpstream::new())
            .handle(empty(authorized(request(Method::GET, "/ping"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_proxy_requires_auth() {
        let mut upstream = MockUpstream::new();
        upstream.expect_forward().times(0);

        let response = handler(upstream)
            .handle(empty(
                request(Method::POST, "/proxy").header("Target-URL", "http://example.com"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers()[header::WWW_AUTHENTICATE]
            .to_str()
            .unwrap()
            .starts_with("Basic"));
    }

    #[tokio::test]
    async fn test_proxy_rejects_wrong_password() {
        let mut upstream = MockUpstream::new();
        upstream.expect_forward().times(0);

        let response = handler(upstream)
            .handle(empty(
                request(Method::GET, "/proxy")
                    .header(
                        header::AUTHORIZATION,
                        Credentials::new("relay", "guess").to_header_value(),
                    )
                    .header("Target-URL", "http://example.com"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_proxy_missing_target() {
        let mut upstream = MockUpstream::new();
        upstream.expect_forward().times(0);

        let response = handler(upstream)
            .handle(empty(authorized(request(Method::GET, "/proxy"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error, "Target-URL header is missing");
    }

    #[tokio::test]
    async fn test_proxy_invalid_target() {
        let mut upstream = MockUpstream::new();
        upstream.expect_forward().times(0);

        let response = handler(upstream)
            .handle(empty(
                authorized(request(Method::GET, "/proxy")).header("Target-URL", "not-a-url"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_proxy_success() {
        let mut upstream = MockUpstream::new();
        upstream
            .expect_forward()
            .withf(|req| req.method == Method::GET && req.body.is_none())
            .times(1)
            .returning(|_| Ok(hello_reply()));

        let response = handler(upstream)
            .handle(empty(
                authorized(request(Method::GET, "/proxy"))
                    .header("Target-URL", "http://upstream.test/hello"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(&body_of(response).await[..], b"hello");
    }

    #[tokio::test]
    async fn test_proxy_upstream_failures() {
        let mut upstream = MockUpstream::new();
        let mut calls = 0;
        upstream.expect_forward().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(Error::UpstreamTimeout)
            } else {
                Err(Error::Upstream("connection refused".to_string()))
            }
        });
        let handler = handler(upstream);

        let timed_out = handler
            .handle(empty(
                authorized(request(Method::GET, "/proxy")).header("Target-URL", "http://slow.test"),
            ))
            .await
            .unwrap();
        assert_eq!(timed_out.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            &body_of(timed_out).await[..],
            br#"{"error":"request timed out"}"#
        );

        let refused = handler
            .handle(empty(
                authorized(request(Method::GET, "/proxy")).header("Target-URL", "http://down.test"),
            ))
            .await
            .unwrap();
        assert_eq!(refused.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = serde_json::from_slice(&body_of(refused).await).unwrap();
        assert_eq!(body.error, "Proxy error");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let mut upstream = MockUpstream::new();
        upstream
            .expect_forward()
            .times(2)
            .returning(|_| Ok(hello_reply()));
        let handler = handler(upstream);

        let mut bodies = Vec::new();
        for _ in 0..2 {
            let response = handler
                .handle(empty(
                    authorized(request(Method::GET, "/proxy"))
                        .header("Target-URL", "http://upstream.test/hello"),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            bodies.push(body_of(response).await);
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(handler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = handler(MockUpstream::new())
            .handle(empty(request(Method::GET, "/nowhere")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_to_ping_is_not_found() {
        let response = handler(MockUpstream::new())
            .handle(empty(request(Method::POST, "/ping")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
