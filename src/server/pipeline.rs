use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::di::{Injectable, Injector, Provider};
use crate::error::{Result, ScopixError};
use crate::logger::Logger;
use crate::module::Modules;
use crate::server::{
    CorrelationId, IncomingRequest, Payload, RequestData, RequestUrl, RouteResolver,
    ServerResponse, tokens,
};

/// Result of one request pipeline run.
#[derive(Debug)]
pub enum RequestOutcome {
    Completed(Payload),
    /// `process()` failed; the failure has already been logged.
    Failed(ResolverFailure),
}

impl RequestOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RequestOutcome::Failed(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            RequestOutcome::Completed(payload) => Some(payload),
            RequestOutcome::Failed(_) => None,
        }
    }
}

/// What was logged for a failed request.
#[derive(Clone, Debug, Serialize)]
pub struct ResolverFailure {
    pub correlation_id: Uuid,
    pub url: String,
    pub error: String,
    pub stack: String,
}

/// Run one request through a fresh scoped injector.
///
/// The scope is a child of the bootstrap module's injector, seeded with the parsed
/// url, a new correlation id, an empty data bag, the request, the response and the
/// module list. `R` is constructed in that scope and its `process()` is awaited.
///
/// A failing `process()` is logged as a `resolver-error` event and returned as
/// [`RequestOutcome::Failed`], never as `Err`. `Err` means the pipeline itself is
/// misconfigured: no bootstrap module, no [`Logger`] bound in it, or a resolver
/// dependency without binding. Nothing the client sends can produce `Err`.
pub async fn fire_request<R>(
    modules: &Modules,
    request: IncomingRequest,
    response: Arc<ServerResponse>,
) -> Result<RequestOutcome>
where
    R: RouteResolver + Injectable,
{
    let root = modules.root().ok_or(ScopixError::BootstrapModuleMissing)?;
    let logger = root.injector.get::<Logger>()?;

    let raw_url = request.url();
    let url = RequestUrl::parse(&request);
    let correlation_id = CorrelationId::new();

    let scope = Injector::create_and_resolve_child(
        Arc::clone(&root.injector),
        Provider::class::<R>(),
        vec![
            Provider::value(tokens::URL, url),
            Provider::value(tokens::UUID, correlation_id),
            Provider::value(tokens::DATA, RequestData::default()),
            Provider::value(tokens::REQUEST, request),
            Provider::shared(tokens::RESPONSE, response),
            Provider::value(tokens::MODULES, modules.clone()),
        ],
    )?;
    let resolver = scope.get::<R>()?;

    let span = tracing::debug_span!("request", correlation_id = %correlation_id, url = %raw_url);
    match resolver.process().instrument(span).await {
        Ok(payload) => Ok(RequestOutcome::Completed(payload)),
        Err(error) => {
            let failure = ResolverFailure {
                correlation_id: correlation_id.uuid(),
                url: raw_url,
                error: error.to_string(),
                stack: format!("{error:?}"),
            };
            logger.resolver_error(&failure);
            Ok(RequestOutcome::Failed(failure))
        }
    }
}
