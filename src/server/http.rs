use std::marker::PhantomData;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::di::Injectable;
use crate::module::Modules;
use crate::server::{
    IncomingRequest, RequestOutcome, RouteResolver, ServerResponse, fire_request,
};

/// Default cap on buffered request bodies.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Bridges axum to [`fire_request`]: every request that reaches the router is
/// buffered and handed to the pipeline with `R` as route resolver.
pub struct RequestDispatcher<R> {
    modules: Modules,
    body_limit: usize,
    _resolver: PhantomData<fn() -> R>,
}

impl<R> RequestDispatcher<R>
where
    R: RouteResolver + Injectable,
{
    pub fn new(modules: Modules) -> Self {
        Self {
            modules,
            body_limit: DEFAULT_BODY_LIMIT,
            _resolver: PhantomData,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn modules(&self) -> &Modules {
        &self.modules
    }

    /// Router that sends every path and method through the pipeline
    pub fn router(self) -> Router {
        Router::new()
            .fallback(dispatch_handler::<R>)
            .with_state(Arc::new(self))
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, self.body_limit).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, uri = %parts.uri, "failed to buffer request body");
                return (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()).into_response();
            }
        };

        let response = Arc::new(ServerResponse::new());
        let incoming = IncomingRequest::from_parts(parts, body);
        match fire_request::<R>(&self.modules, incoming, Arc::clone(&response)).await {
            Ok(RequestOutcome::Completed(payload)) => response.respond(payload),
            Ok(RequestOutcome::Failed(failure)) => {
                tracing::debug!(correlation_id = %failure.correlation_id, "answering failed request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, "request pipeline misconfigured");
                err.into_response()
            }
        }
    }
}

async fn dispatch_handler<R>(
    State(dispatcher): State<Arc<RequestDispatcher<R>>>,
    request: Request<Body>,
) -> Response
where
    R: RouteResolver + Injectable,
{
    dispatcher.dispatch(request).await
}
