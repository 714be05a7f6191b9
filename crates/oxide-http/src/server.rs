//! hyper-backed HTTP/1 listener for an [`App`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::App;
use crate::error::{HttpError, Result};
use crate::request::{Method, Request};
use crate::response::Response;

/// Handle to a running listener.
pub struct ServerHandle {
    local_addr: SocketAddr,
    app: Arc<App>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The pipeline being served, for in-process dispatch.
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Stops accepting connections and waits for the accept loop to end.
    pub async fn shutdown(self) -> Result<()> {
        // The accept loop may already be gone; nothing to signal then.
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|e| HttpError::Join(e.to_string()))
    }
}

/// Binds `addr` and serves `app` on a background task.
pub async fn serve(app: Arc<App>, addr: SocketAddr) -> Result<ServerHandle> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;
    let (shutdown, mut stop) = oneshot::channel::<()>();

    let served = app.clone();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stop => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => spawn_connection(stream, served.clone()),
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
            }
        }
    });

    Ok(ServerHandle {
        local_addr,
        app,
        shutdown,
        task,
    })
}

fn spawn_connection(stream: tokio::net::TcpStream, app: Arc<App>) {
    let io = TokioIo::new(stream);

    tokio::spawn(async move {
        let service = service_fn(move |req| {
            let app = app.clone();
            handle_request(req, app)
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            debug!(error = ?err, "error serving connection");
        }
    });
}

async fn handle_request(
    req: HyperRequest<hyper::body::Incoming>,
    app: Arc<App>,
) -> std::result::Result<HyperResponse<Full<Bytes>>, Infallible> {
    let Some(method) = Method::parse(req.method().as_str()) else {
        return Ok(to_hyper(app.finish(Response::not_implemented()).await));
    };
    let uri = req.uri();
    let mut request = Request::new(method, uri.path());

    if let Some(query) = uri.query() {
        request.query = Request::parse_query_string(query);
    }

    for (key, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            request.headers.insert(key.to_string(), v.to_string());
        }
    }

    request.body = match req.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            debug!(error = %e, "failed to read request body");
            return Ok(to_hyper(app.finish(Response::bad_request()).await));
        }
    };

    Ok(to_hyper(app.handle(request).await))
}

fn to_hyper(res: Response) -> HyperResponse<Full<Bytes>> {
    let mut builder = HyperResponse::builder()
        .status(StatusCode::from_u16(res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));

    for (key, value) in &res.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    builder
        .body(Full::new(Bytes::from(res.body)))
        .unwrap_or_else(|e| {
            warn!(error = %e, "invalid response head, sending 500");
            let mut fallback = HyperResponse::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
