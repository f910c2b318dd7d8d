//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router: one catch-all handler in front of the route table
//! - Wire up middleware (request id, optional HTTP trace layer)
//! - Serve plaintext or TLS with graceful shutdown
//! - Dispatch: route lookup, security gate, body limit, endpoint, errors
//! - Per-request metrics and the access log

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::components::ServerConfigSnapshot;
use crate::endpoint::{ExecutionContext, Handler, RequestInfo};
use crate::error::{ApiException, CoreApiError, EndpointError, RequestSummary};
use crate::http::request::request_id_of;
use crate::observability::logging::ACCESS_LOG_TARGET;
use crate::routing::{PathParams, Resolution, RouteId};
use crate::validation::NoContent;

/// Grace period for in-flight TLS connections after shutdown is signalled.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint label used when no route matched.
const UNMATCHED: &str = "none";

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ServerConfigSnapshot>,
}

/// HTTP server for the assembled service.
pub struct HttpServer {
    router: Router,
    snapshot: Arc<ServerConfigSnapshot>,
}

impl HttpServer {
    pub fn new(snapshot: Arc<ServerConfigSnapshot>) -> Self {
        let router = Self::build_router(AppState {
            snapshot: snapshot.clone(),
        });
        Self { router, snapshot }
    }

    fn build_router(state: AppState) -> Router {
        let channel_logging = state.snapshot.debug.channel_lifecycle_logging_enabled;
        let router = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state);

        let router = if channel_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn snapshot(&self) -> &Arc<ServerConfigSnapshot> {
        &self.snapshot
    }

    /// Serve plaintext HTTP until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.snapshot.routes.len(), "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    ///
    /// `handle` reports the bound address through `Handle::listening`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        handle: Handle,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, routes = self.snapshot.routes.len(), "HTTPS server starting");

        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls).handle(handle).serve(app).await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Single entry point for every request.
pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let snapshot = state.snapshot;
    let request_id = request_id_of(request.headers());
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if snapshot.debug.actions_enabled {
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            headers = ?request.headers(),
            "Inbound request"
        );
    }

    let in_flight = snapshot.components.metrics.request_started();

    let (endpoint, outcome): (&str, Result<Response, EndpointError>) = match snapshot.routes.resolve(&method, &path) {
        Resolution::NoMatch => (UNMATCHED, Err(CoreApiError::NotFound.into())),
        Resolution::MethodNotAllowed { allowed } => (UNMATCHED, Err(method_not_allowed(&allowed))),
        Resolution::Matched(matched) => {
            let route = matched.route;
            let guarded = AssertUnwindSafe(execute_route(
                &snapshot,
                route.id,
                &route.handler,
                matched.path_params,
                request,
                &request_id,
                remote_addr,
            ))
            .catch_unwind();

            let timeout = snapshot.request_timeout();
            let outcome = match tokio::time::timeout(timeout, guarded).await {
                Err(_) => Err(ApiException::new(CoreApiError::TemporaryServiceProblem)
                    .with_exception_message(format!("request did not complete within {:?}", timeout))
                    .into()),
                Ok(Err(panic)) => Err(EndpointError::Unexpected(anyhow!(
                    "endpoint panicked: {}",
                    panic_message(panic.as_ref())
                ))),
                Ok(Ok(outcome)) => outcome,
            };
            (route.handler.name(), outcome)
        }
    };

    let response = match outcome {
        Ok(response) => response,
        Err(failure) => snapshot.error_mapper.to_response(
            &failure,
            &RequestSummary {
                method: &method,
                path: &path,
                request_id: &request_id,
            },
        ),
    };

    let status = response.status();
    let elapsed = started.elapsed();
    snapshot
        .components
        .metrics
        .request_finished(endpoint, &method, status, elapsed);
    if let Some(in_flight) = in_flight {
        in_flight.finish();
    }

    tracing::info!(
        target: ACCESS_LOG_TARGET,
        request_id = %request_id,
        remote_addr = ?remote_addr,
        method = %method,
        path = %path,
        endpoint,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request completed"
    );

    response
}

/// Gate, read the body, and run the endpoint.
async fn execute_route(
    snapshot: &ServerConfigSnapshot,
    route: RouteId,
    handler: &Handler,
    path_params: PathParams,
    request: Request<Body>,
    request_id: &str,
    remote_addr: Option<SocketAddr>,
) -> Result<Response, EndpointError> {
    if !handler.security_exempt() {
        snapshot.components.security.authorize(route, request.headers())?;
    }

    let ctx = ExecutionContext::new(request_id, snapshot.offload.clone());
    let (parts, body) = request.into_parts();
    let head = |raw_body| RequestInfo {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        path_params: path_params.clone(),
        raw_body,
        content: NoContent,
        request_id: request_id.to_string(),
        remote_addr,
    };

    match handler {
        Handler::Standard(standard) => {
            let limit = snapshot.server.max_request_size_bytes;
            let declared = parts
                .headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());
            if declared.is_some_and(|len| len > limit) {
                return Err(request_too_large(limit));
            }
            let raw_body = axum::body::to_bytes(body, limit)
                .await
                .map_err(|_| request_too_large(limit))?;

            standard.handle(head(raw_body), &ctx).await
        }
        Handler::Proxy(proxy) => {
            crate::downstream::forward_request(
                proxy.as_ref(),
                head(Default::default()),
                body,
                &snapshot.downstream,
                &ctx,
            )
            .await
        }
    }
}

fn method_not_allowed(allowed: &[Method]) -> EndpointError {
    let allow = allowed.iter().map(Method::to_string).collect::<Vec<_>>().join(", ");
    ApiException::new(CoreApiError::MethodNotAllowed)
        .with_extra_response_header(header::ALLOW.as_str(), [allow])
        .into()
}

fn request_too_large(limit: usize) -> EndpointError {
    ApiException::new(
        CoreApiError::MalformedRequest
            .api_error()
            .with_metadata("max_request_size_bytes", limit as u64),
    )
    .with_exception_message(format!("request body exceeds {} bytes or could not be read", limit))
    .into()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
