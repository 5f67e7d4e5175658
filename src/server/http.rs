//! HTTP server implementation
//!
//! hyper http1 over TokioIo, one task per connection. Each request body is
//! read in full (bounded by MAX_BODY_BYTES) before routing.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthGate, LoginService};
use crate::config::Args;
use crate::dispatch::Dispatcher;
use crate::envelope::preflight_response;
use crate::resource::ResourceResolver;
use crate::routes::{self, HttpRequest};
use crate::store::DocumentStore;
use crate::types::GatewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Connected document store
    pub store: Arc<dyn DocumentStore>,
    pub dispatcher: Dispatcher,
    /// None when AUTH_ENABLED=false
    pub gate: Option<AuthGate>,
    pub login: LoginService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the request pipeline around an already connected store
    pub fn new(args: Args, store: Arc<dyn DocumentStore>) -> Result<Self, GatewayError> {
        let jwt = args.jwt_validator()?;
        let registry = args.registry()?;

        let dispatcher = Dispatcher::new(ResourceResolver::new(Arc::clone(&store), registry));
        let gate = args.auth_enabled.then(|| AuthGate::new(jwt.clone()));
        let login = LoginService::new(
            jwt,
            Arc::clone(&store),
            args.users_collection.clone(),
            args.login_policy(),
        )
        .with_registration(args.registration_open);

        Ok(Self {
            args,
            store,
            dispatcher,
            gate,
            login,
            started_at: Utc::now(),
        })
    }
}

/// Bind the configured address and serve forever
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen_addr()).await?;
    serve(listener, state).await
}

/// Serve connections from an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), GatewayError> {
    info!(
        "docgate listening on {} (store: {})",
        listener.local_addr()?,
        state.store.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - passwordless login accepted");
    }
    if state.login.registration_open() {
        info!("Registration open at POST /api/register");
    }
    if state.gate.is_none() {
        warn!("AUTH_ENABLED=false - resource routes are open to anyone");
    }
    match state.dispatcher.resolver().registry().registered() {
        Some(names) => info!("Serving collections: {}", names.join(", ")),
        None => info!("Serving any collection (no RESOURCES allowlist)"),
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Read the body, route the request, and render the envelope
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let envelope = match read_body(req.into_body(), state.args.max_body_bytes).await {
        Ok(body) => {
            let request = HttpRequest {
                method: method.clone(),
                path: path.clone(),
                authorization,
                body,
            };
            routes::route(&state, &request).await
        }
        Err(err) => err.into(),
    };

    info!(
        request_id = %request_id,
        peer = %addr,
        status = envelope.status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} {}",
        method,
        path
    );

    Ok(envelope.into_response(&request_id))
}

async fn read_body(body: Incoming, limit: usize) -> Result<Bytes, GatewayError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::PayloadTooLarge)
        }
        Err(e) => Err(GatewayError::BadRequest(format!(
            "Failed to read request body: {}",
            e
        ))),
    }
}
