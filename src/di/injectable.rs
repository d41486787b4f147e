use crate::di::Injector;
use crate::error::Result;

/// Trait for types that can be constructed by an [`Injector`]
///
/// This trait is typically implemented automatically via the `#[derive(Injectable)]` macro.
///
/// # Example
/// ```ignore
/// use scopix::prelude::*;
///
/// trait UserRepository: Send + Sync {}
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     // Resolved through a `Provider::bind` registration
///     repository: Arc<dyn UserRepository>,
///     // Resolved by string token
///     #[inject("UUID")]
///     correlation_id: Arc<CorrelationId>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the injector chain
    ///
    /// # Errors
    /// Returns an error if any required dependency has no binding anywhere in the chain.
    fn inject(injector: &Injector) -> Result<Self>;
}
