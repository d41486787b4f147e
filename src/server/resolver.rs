use async_trait::async_trait;

use crate::server::Payload;

/// Turns one request scope into a response payload.
///
/// The resolver is constructed inside the per-request injector, so its fields can
/// take any request-scoped binding (see [`tokens`](crate::server::tokens)) as
/// well as any singleton visible from the bootstrap module.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// struct EchoResolver {
///     #[inject("url")]
///     url: Arc<RequestUrl>,
/// }
///
/// #[async_trait]
/// impl RouteResolver for EchoResolver {
///     async fn process(&self) -> anyhow::Result<Payload> {
///         Ok(Payload::from(self.url.path()))
///     }
/// }
/// ```
#[async_trait]
pub trait RouteResolver: Send + Sync + 'static {
    async fn process(&self) -> anyhow::Result<Payload>;
}
