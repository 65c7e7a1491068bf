//! Request server lifecycle.
//!
//! [`RequestServer`] binds a TCP listener and runs an accept loop on the
//! current Tokio runtime. Every connection gets its own task that reads
//! exactly one request, routes it, writes the response and closes. A
//! client that has not finished sending its request within
//! `server.request_read_timeout_ms` is dropped without a response. A
//! handler that panics is answered with a 500 page; the accept loop is
//! never affected.
//!
//! Both [`RequestServer::start`] and [`RequestServer::stop`] are
//! idempotent.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt as _, BufReader};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::http::{self, HttpError, Method, Request};
use crate::response::{Response, StatusCode};
use crate::router::route;
use crate::state::AppState;

/// Pending connections the listener queues before refusing.
const LISTEN_BACKLOG: u32 = 1024;

/// Produces the response for one parsed request.
pub type Handler = for<'a> fn(&'a AppState, &'a Request) -> BoxFuture<'a, Response>;

fn default_handler<'a>(state: &'a AppState, request: &'a Request) -> BoxFuture<'a, Response> {
    route(state, request).boxed()
}

#[derive(Debug)]
struct Running {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// The dashboard's HTTP listener.
#[derive(Debug)]
pub struct RequestServer {
    state: Arc<AppState>,
    handler: Handler,
    running: Mutex<Option<Running>>,
}

impl RequestServer {
    /// Create a stopped server over `state` that answers with [`route`].
    pub const fn new(state: Arc<AppState>) -> Self {
        Self::with_handler(state, default_handler)
    }

    /// Create a stopped server that answers every request with `handler`.
    pub const fn with_handler(state: Arc<AppState>, handler: Handler) -> Self {
        Self {
            state,
            handler,
            running: Mutex::new(None),
        }
    }

    /// Shared state served by this server.
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Bind the configured address and start accepting connections.
    ///
    /// Must be called from inside a Tokio runtime. Calling it while
    /// already running returns the existing address.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Runtime`] outside a Tokio runtime
    /// - [`ServerError::Bind`] if the address is invalid or taken
    pub fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock();
        if let Some(existing) = running.as_ref() {
            return Ok(existing.addr);
        }

        let runtime = Handle::try_current().map_err(|e| ServerError::Runtime(e.to_string()))?;
        let settings = &self.state.settings;
        let requested: SocketAddr = format!("{}:{}", settings.host, settings.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

        let listener = bind(requested)?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;
        self.state.set_port(addr.port());

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(accept_loop(
            listener,
            Arc::clone(&self.state),
            self.handler,
            shutdown_rx,
        ));
        *running = Some(Running {
            addr,
            shutdown,
            task,
        });

        info!(%addr, root = %settings.static_root.display(), "Dashboard server listening");
        Ok(addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    ///
    /// Connections already accepted finish on their own tasks. Returns
    /// `false` if the server was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().take() else {
            return false;
        };
        if running.shutdown.send(true).is_err() {
            debug!("Accept loop already gone");
        }
        if let Err(e) = running.task.await {
            warn!(error = %e, "Accept loop ended abnormally");
        }
        info!(addr = %running.addr, "Dashboard server stopped");
        true
    }

    /// Address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|r| r.addr)
    }

    /// Whether the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}

fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|e| ServerError::Bind(format!("socket creation failed: {e}")))?;
    socket
        .set_reuseaddr(true)
        .map_err(|e| ServerError::Bind(format!("SO_REUSEADDR failed: {e}")))?;
    socket
        .bind(addr)
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|e| ServerError::Bind(format!("listen failed on {addr}: {e}")))
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    handler: Handler,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(stream, peer, Arc::clone(&state), handler));
                }
                Err(e) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    warn!(error = %e, "Accept failed");
                }
            },
        }
    }
    debug!("Accept loop exited");
}

/// Serve one request on `stream`, then close it.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<AppState>,
    handler: Handler,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let deadline = state.settings.request_read_timeout();
    let Ok(read) = tokio::time::timeout(deadline, http::read_request(&mut reader, state.limits())).await
    else {
        debug!(%peer, "Client sent no complete request in time");
        return;
    };
    let (response, head_only) = match read {
        Ok(Some(request)) => {
            let head_only = request.method == Method::Head;
            let routed = AssertUnwindSafe(async { handler(&state, &request).await })
                .catch_unwind()
                .await;
            let response = routed.unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                error!(
                    %peer,
                    method = %request.method,
                    path = %request.path,
                    error = %message,
                    "Request handler panicked"
                );
                Response::html_error(StatusCode::INTERNAL_SERVER_ERROR, &message)
            });
            debug!(
                %peer,
                method = %request.method,
                path = %request.path,
                status = response.status().as_u16(),
                "Request served"
            );
            (response, head_only)
        }
        Ok(None) => return,
        Err(HttpError::BadRequest(reason)) => {
            debug!(%peer, reason, "Rejected malformed request");
            (Response::html_error(StatusCode::BAD_REQUEST, reason), false)
        }
        Err(HttpError::Io(e)) => {
            debug!(%peer, error = %e, "Connection dropped while reading request");
            return;
        }
    };

    if let Err(e) = response
        .write_to(&mut write_half, &state.settings.server_name, head_only)
        .await
    {
        debug!(%peer, error = %e, "Failed to write response");
    }
    if let Err(e) = write_half.shutdown().await {
        debug!(%peer, error = %e, "Failed to close connection");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("handler panicked"))
}
