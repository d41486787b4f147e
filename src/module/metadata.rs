use crate::di::{Injectable, Provider, Token};

/// Declared configuration of a module.
///
/// Built in code, usually by the `#[module(...)]` attribute. `exports` lists the
/// tokens this module shares with the modules it imports.
#[derive(Clone, Debug)]
pub struct ModuleMetadata {
    pub name: String,
    pub imports: Vec<Token>,
    pub exports: Vec<Token>,
    pub providers: Vec<Provider>,
    pub controllers: Vec<Provider>,
}

impl ModuleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            exports: Vec::new(),
            providers: Vec::new(),
            controllers: Vec::new(),
        }
    }

    pub fn import(mut self, module: impl Into<Token>) -> Self {
        self.imports.push(module.into());
        self
    }

    pub fn export(mut self, token: impl Into<Token>) -> Self {
        self.exports.push(token.into());
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn controller(mut self, controller: Provider) -> Self {
        self.controllers.push(controller);
        self
    }
}

/// Trait for application modules
///
/// Modules are typically defined using the `#[module]` macro, which automatically
/// implements this trait and generates the registration logic.
///
/// # Example
/// ```ignore
/// use scopix::module;
///
/// #[module(
///     name = "bootstrap",
///     imports = [UserModule],
///     exports = [Database],
///     providers = [Database, Logger],
/// )]
/// pub struct AppModule;
/// ```
pub trait Module: Injectable {
    fn metadata() -> ModuleMetadata;

    /// Register this module and, recursively, every module it imports
    ///
    /// Implementations should return early when the module is already in the
    /// registry, so that shared and cyclic imports terminate.
    fn register(registry: &mut super::MetadataRegistry) {
        registry.register::<Self>();
    }
}
