//! HTTP JSON-RPC server
//!
//! Accepts TCP connections, serves each one with hyper's HTTP/1.1 stack on its
//! own task, and routes requests to a shared [`JsonRpcHttpHandler`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use switchboard_json_rpc::{JsonRpcDispatcher, MethodHandler, MethodRegistry};

use crate::{CorsLayer, HttpJsonRpcError, JsonRpcHttpHandler, Result};

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path of the JSON-RPC endpoint
    pub rpc_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Single allowed origin; any origin when `None`
    pub cors_origin: Option<String>,
    /// Maximum request body size
    pub max_body_size: usize,
    /// How long to wait for in-flight connections on shutdown
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            rpc_path: "/rpc".to_string(),
            enable_cors: true,
            cors_origin: None,
            max_body_size: 1024 * 1024, // 1MB
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Builder for [`HttpJsonRpcServer`]
pub struct HttpJsonRpcServerBuilder {
    config: ServerConfig,
    registry: Arc<MethodRegistry>,
}

impl HttpJsonRpcServerBuilder {
    /// Create a new builder with an empty registry
    pub fn new() -> Self {
        Self::with_registry(Arc::new(MethodRegistry::new()))
    }

    /// Create a new builder serving an existing, host-owned registry
    pub fn with_registry(registry: Arc<MethodRegistry>) -> Self {
        Self {
            config: ServerConfig::default(),
            registry,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Restrict CORS to a single origin
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_origin = Some(origin.into());
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Register a handler for a method
    pub fn register_method<H>(self, name: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.registry.register(name, handler);
        self
    }

    /// Build the server, validating the configuration
    pub fn build(self) -> Result<HttpJsonRpcServer> {
        if !self.config.rpc_path.starts_with('/') {
            return Err(HttpJsonRpcError::Config(format!(
                "rpc path must start with '/': {}",
                self.config.rpc_path
            )));
        }

        let cors = if !self.config.enable_cors {
            None
        } else if let Some(origin) = &self.config.cors_origin {
            Some(CorsLayer::for_origin(origin)?)
        } else {
            Some(CorsLayer::any_origin())
        };

        let config = Arc::new(self.config);
        let dispatcher = Arc::new(JsonRpcDispatcher::new(Arc::clone(&self.registry)));
        let handler = JsonRpcHttpHandler::new(Arc::clone(&config), dispatcher, cors);

        Ok(HttpJsonRpcServer {
            config,
            registry: self.registry,
            handler,
        })
    }
}

impl Default for HttpJsonRpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct HttpJsonRpcServer {
    config: Arc<ServerConfig>,
    registry: Arc<MethodRegistry>,
    handler: JsonRpcHttpHandler,
}

impl HttpJsonRpcServer {
    /// Create a new builder with an empty registry
    pub fn builder() -> HttpJsonRpcServerBuilder {
        HttpJsonRpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The registry requests are resolved against. Methods may be added or
    /// removed while the server runs.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    pub fn handler(&self) -> &JsonRpcHttpHandler {
        &self.handler
    }

    /// Run the server until the process exits
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then drain connections
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("HTTP JSON-RPC server listening on {}", listener.local_addr()?);
        info!("JSON-RPC endpoint available at: {}", self.config.rpc_path);
        info!("Registered methods: {:?}", self.registry.method_names());

        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            error!("Failed to accept connection: {}", err);
                            continue;
                        }
                    };
                    debug!("New connection from {}", peer_addr);

                    let handler = self.handler.clone();
                    let service = service_fn(move |req| {
                        let handler = handler.clone();
                        async move { Ok::<_, Infallible>(handler.handle_request(req).await) }
                    });
                    let connection =
                        http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    let connection = graceful.watch(connection);

                    tokio::spawn(async move {
                        if let Err(err) = connection.await {
                            // Clients hanging up mid-request are not server errors
                            if err.is_incomplete_message() {
                                debug!("Client disconnected (normal): {}", err);
                            } else {
                                error!("Error serving connection: {}", err);
                            }
                        }
                    });
                }
                () = &mut shutdown => {
                    info!("Shutdown requested, draining connections");
                    break;
                }
            }
        }

        drop(listener);
        match tokio::time::timeout(self.config.shutdown_timeout, graceful.shutdown()).await {
            Ok(()) => info!("All connections closed"),
            Err(_) => warn!(
                "Connections still open after {:?}, shutting down anyway",
                self.config.shutdown_timeout
            ),
        }
        Ok(())
    }
}
