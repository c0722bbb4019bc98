//! HTTP server implementation

use crate::handler::RequestHandler;
use crate::shutdown::ShutdownSignal;
use crate::RuntimeState;
use courier_auth::BasicAuth;
use courier_config::Config;
use courier_core::response::responses;
use courier_core::{Error, Result};
use courier_proxy::{Forward, ForwardProxy, HttpForwarder, ResponseWriter};
use http::Request;
use hyper::body::Incoming;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// HTTP server
#[derive(Debug)]
pub struct Server {
    config: Arc<Config>,
    handler: RequestHandler,
    state: Arc<RwLock<RuntimeState>>,
    shutdown: ShutdownSignal,
    in_flight: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Get the current state
    pub async fn state(&self) -> RuntimeState {
        *self.state.read().await
    }

    /// Get the configured listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.config.gateway.listen
    }

    /// Requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr()).await.map_err(|e| {
            Error::Runtime(format!("Failed to bind to {}: {}", self.listen_addr(), e))
        })?;

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        self.set_state(RuntimeState::Running).await;

        tracing::info!(
            listen = %local_addr,
            request_timeout_ms = self.config.gateway.request_timeout.as_millis(),
            max_response_bytes = self.config.proxy.max_response_bytes,
            "Server listening"
        );

        let mut shutdown_rx = self.shutdown.subscribe();

        while !self.shutdown.is_triggered() {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::trace!("Accepted connection from {}", addr);
                            self.spawn_connection(stream);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);
        self.set_state(RuntimeState::ShuttingDown).await;
        self.drain().await;
        self.set_state(RuntimeState::Stopped).await;

        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream) {
        let handler = self.handler.clone();

        tokio::spawn(async move {
            let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                let handler = handler.clone();
                async move {
                    match handler.handle(req).await {
                        Ok(response) => Ok::<_, Error>(response),
                        Err(e) => {
                            tracing::error!("Request handler error: {}", e);
                            responses::internal_error(e.to_string())
                        }
                    }
                }
            });

            let io = hyper_util::rt::TokioIo::new(stream);
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::debug!("HTTP connection error: {}", e);
            }
        });
    }

    /// Wait for in-flight requests, bounded by the shutdown timeout
    async fn drain(&self) {
        let shutdown_timeout = self.config.gateway.shutdown_timeout;
        let start = Instant::now();

        tracing::info!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Waiting for in-flight requests to complete"
        );

        loop {
            let active = self.in_flight();

            if active == 0 {
                tracing::info!("All requests completed, shutting down cleanly");
                break;
            }

            if start.elapsed() >= shutdown_timeout {
                tracing::warn!(
                    active_requests = active,
                    "Shutdown timeout reached, forcing shutdown"
                );
                break;
            }

            tracing::debug!(
                active_requests = active,
                elapsed_ms = start.elapsed().as_millis(),
                "Waiting for active requests to complete"
            );

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tracing::info!(
            shutdown_duration_ms = start.elapsed().as_millis(),
            "Server stopped"
        );
    }

    async fn set_state(&self, next: RuntimeState) {
        let mut state = self.state.write().await;
        *state = next;
    }
}

/// Server builder
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    forwarder: Option<Arc<dyn Forward>>,
    shutdown: Option<ShutdownSignal>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("custom_forwarder", &self.forwarder.is_some())
            .finish()
    }
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the reqwest-backed forwarder
    pub fn forwarder(mut self, forwarder: Arc<dyn Forward>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Share an existing shutdown signal
    pub fn shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<Server> {
        let config = self
            .config
            .ok_or_else(|| Error::Config("config is required".to_string()))?;

        let auth = BasicAuth::from_config(&config.auth)?;
        let forwarder: Arc<dyn Forward> = match self.forwarder {
            Some(forwarder) => forwarder,
            None => Arc::new(HttpForwarder::from_config(&config)?),
        };

        let proxy = ForwardProxy::new(
            auth,
            forwarder,
            ResponseWriter::from_config(&config),
            config.gateway.max_body_size,
        );

        let in_flight = Arc::new(AtomicUsize::new(0));
        let handler = RequestHandler::with_counter(proxy, Arc::clone(&in_flight));

        tracing::debug!(
            listen = %config.gateway.listen,
            realm = %config.auth.realm,
            forward_upstream_status = config.proxy.forward_upstream_status,
            "Server components initialized"
        );

        Ok(Server {
            config: Arc::new(config),
            handler,
            state: Arc::new(RwLock::new(RuntimeState::Initializing)),
            shutdown: self.shutdown.unwrap_or_default(),
            in_flight,
        })
    }
}
