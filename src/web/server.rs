//! tiny_http accept loop
//!
//! tiny_http hands out requests from a blocking call, so the loop runs on a
//! dedicated thread and polls a shutdown flag between requests. Each request is
//! routed on the tokio runtime and answered from the blocking pool. The routing
//! tasks live in a `JoinSet` so shutdown can wait for them.

use reqwest::Method;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::{Router, WebConfig, WebError, WebReply, WebRequest};

/// How long a single `recv_timeout` call may block before the shutdown flag is checked
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Web server bound to a listening socket
pub struct WebServer {
    server: Server,
    router: Arc<Router>,
}

impl WebServer {
    /// Bind the listener and prepare the router.
    ///
    /// # Arguments
    ///
    /// * `config` - Listen address, asset directories and fetcher settings
    ///
    /// # Returns
    ///
    /// A server ready to `run`
    pub fn bind(config: &WebConfig) -> crate::Result<Self> {
        let router = Router::new(config)?;
        let server =
            Server::http(config.listen_addr.as_str()).map_err(|e| WebError::Bind {
                addr: config.listen_addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            server,
            router: Arc::new(router),
        })
    }

    /// Address the listener is bound to, useful when binding port 0
    pub fn local_addr(&self) -> String {
        self.server.server_addr().to_string()
    }

    /// Serve requests until `shutdown` is set.
    ///
    /// Blocks the calling thread, which must not be a runtime worker. Routing happens
    /// on `runtime`. Once the flag is seen no new requests are accepted, and this
    /// returns only after every request already accepted has been answered.
    pub fn run(&self, runtime: Handle, shutdown: Arc<AtomicBool>) -> crate::Result<()> {
        info!(addr = %self.local_addr(), "web server listening");
        let mut in_flight = JoinSet::new();

        let outcome = loop {
            if shutdown.load(Ordering::Relaxed) {
                break Ok(());
            }
            while let Some(result) = in_flight.try_join_next() {
                log_task_result(result);
            }

            let request = match self.server.recv_timeout(POLL_INTERVAL) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(err) => break Err(WebError::Io(err)),
            };
            in_flight.spawn_on(serve_request(Arc::clone(&self.router), request), &runtime);
        };

        if !in_flight.is_empty() {
            info!(pending = in_flight.len(), "waiting for in-flight requests");
        }
        runtime.block_on(async {
            while let Some(result) = in_flight.join_next().await {
                log_task_result(result);
            }
        });

        info!("web server stopped");
        Ok(outcome?)
    }
}

async fn serve_request(router: Arc<Router>, request: Request) {
    let method = request.method().to_string();
    let Ok(method) = Method::from_bytes(method.as_bytes()) else {
        let reply = WebReply::Html {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: String::new(),
        };
        finish(request, reply).await;
        return;
    };

    let web_request = WebRequest {
        method,
        target: request.url().to_string(),
    };
    let reply = router.handle(&web_request).await;
    finish(request, reply).await;
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(err) = result {
        warn!(error = %err, "request task failed");
    }
}

async fn finish(request: Request, reply: WebReply) {
    let status = reply.status();
    match tokio::task::spawn_blocking(move || respond(request, reply)).await {
        Ok(Ok(())) => debug!(%status, "response sent"),
        Ok(Err(err)) => warn!(%status, error = %err, "failed to write response"),
        Err(err) => warn!(error = %err, "response task failed"),
    }
}

fn respond(request: Request, reply: WebReply) -> io::Result<()> {
    let code = reply.status().as_u16();
    let (body, content_type, location) = match reply {
        WebReply::Html { body, .. } => (body.into_bytes(), "text/html; charset=utf-8", None),
        WebReply::Redirect { location } => (Vec::new(), "text/plain", Some(location)),
        WebReply::File { content_type, body } => (body, content_type, None),
    };

    let mut response = Response::from_data(body).with_status_code(tiny_http::StatusCode(code));
    response.add_header(header("Content-Type", content_type)?);
    if let Some(location) = location {
        response.add_header(header("Location", &location)?);
    }
    request.respond(response)
}

fn header(name: &str, value: &str) -> io::Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).map_err(|()| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid {name} header value"),
        )
    })
}
