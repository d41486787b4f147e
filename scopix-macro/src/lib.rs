use proc_macro::TokenStream;

mod injectable;
mod module;

/// Derive macro for making a struct constructible by an injector
///
/// Every field must be an `Arc`. `Arc<T>` resolves `T` by type, `Arc<dyn Trait>`
/// resolves a trait binding, and `#[inject("key")]` resolves a string token.
///
/// # Example
/// ```ignore
/// use scopix::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     #[inject("UUID")]
///     correlation_id: Arc<CorrelationId>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for defining a module
///
/// Implements `Module` (metadata and recursive registration) and `Injectable` for
/// the annotated struct. `name` defaults to the struct name.
///
/// # Example
/// ```ignore
/// use scopix::module;
///
/// #[module(
///     name = "bootstrap",
///     imports = [UserModule],
///     exports = [Database, dyn UserRepository],
///     providers = [Database, Logger, UserRepositoryImpl],
///     bindings = [(dyn UserRepository => UserRepositoryImpl)],
/// )]
/// pub struct AppModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
