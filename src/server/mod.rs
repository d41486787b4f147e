//! Per-request pipeline
//!
//! ```text
//! transport ─▶ fire_request ─▶ scoped Injector (child of bootstrap)
//!                                 │  url, UUID, data, request, response, modules
//!                                 ▼
//!                           RouteResolver::process ─▶ Payload | logged failure
//! ```

mod http;
mod pipeline;
mod request;
mod resolver;
mod scope;
mod shutdown;

pub use http::{DEFAULT_BODY_LIMIT, RequestDispatcher};
pub use pipeline::{RequestOutcome, ResolverFailure, fire_request};
pub use request::{IncomingRequest, Payload, ServerResponse};
pub use resolver::RouteResolver;
pub use scope::{CorrelationId, RequestData, RequestUrl, tokens};
pub use shutdown::shutdown_signal;
