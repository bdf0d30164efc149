use super::registry::MetricsRegistry;
use crate::core::error::{LoggerError, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Scrape endpoint serving one registry from its own thread.
///
/// The listener is bound synchronously so bind errors reach the caller; the
/// server then runs on a single-threaded runtime until shutdown is signalled.
#[derive(Debug)]
pub(crate) struct Exporter {
    address: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Exporter {
    pub(crate) fn start(registry: Arc<MetricsRegistry>, port: u16) -> Result<Self> {
        let std_listener = std::net::TcpListener::bind(("0.0.0.0", port)).map_err(|e| {
            LoggerError::io_operation("bind metrics endpoint", format!("port {}", port), e)
        })?;
        std_listener.set_nonblocking(true)?;
        let address = std_listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .map_err(|e| LoggerError::io_operation("start metrics endpoint", "runtime", e))?;
        let listener = {
            let _guard = runtime.enter();
            tokio::net::TcpListener::from_std(std_listener).map_err(|e| {
                LoggerError::io_operation("start metrics endpoint", "convert listener", e)
            })?
        };

        let app = Router::new()
            .fallback(scrape)
            .with_state(Arc::downgrade(&registry));
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = thread::Builder::new()
            .name("logz-metrics".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let server = axum::serve(listener, app).with_graceful_shutdown(async {
                        signal.await.ok();
                    });
                    if let Err(e) = server.await {
                        eprintln!("[LOGGER ERROR] Metrics endpoint failed: {}", e);
                    }
                });
            })?;

        Ok(Self {
            address,
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Signal shutdown and wait until the listener is closed
    pub(crate) fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Exporter {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Every path and method gets the exposition text
async fn scrape(State(registry): State<Weak<MetricsRegistry>>) -> Response {
    match registry.upgrade() {
        Some(registry) => (
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            registry.render_prometheus(),
        )
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
