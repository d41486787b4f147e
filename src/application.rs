//! Application Bootstrap
//!
//! Composes the module tree once, before any request is accepted, and hands the
//! resulting immutable module list to the transport.

use crate::config::ServerConfig;
use crate::di::{Injectable, Token};
use crate::error::{Result, ScopixError};
use crate::module::{BOOTSTRAP_MODULE, MetadataRegistry, Module, Modules, create_module};
use crate::server::{RequestDispatcher, RouteResolver, shutdown_signal};

/// A composed application
///
/// # Example
///
/// ```rust,ignore
/// use scopix::Application;
///
/// #[tokio::main]
/// async fn main() -> scopix::Result<()> {
///     let app = Application::builder()
///         .root_module::<AppModule>()
///         .build()?;
///
///     app.serve::<AppResolver>(&ServerConfig::default()).await
/// }
/// ```
pub struct Application {
    modules: Modules,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn modules(&self) -> &Modules {
        &self.modules
    }

    pub fn dispatcher<R>(&self) -> RequestDispatcher<R>
    where
        R: RouteResolver + Injectable,
    {
        RequestDispatcher::new(self.modules.clone())
    }

    /// Serve over HTTP until Ctrl+C or SIGTERM
    pub async fn serve<R>(&self, config: &ServerConfig) -> Result<()>
    where
        R: RouteResolver + Injectable,
    {
        let router = self
            .dispatcher::<R>()
            .with_body_limit(config.body_limit)
            .router();

        let addr = config.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ScopixError::config(format!("failed to bind {addr}: {e}")))?;
        tracing::info!(addr = %addr, "server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ScopixError::Internal(format!("server error: {e}")))?;

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Builder for Application
#[derive(Default)]
pub struct ApplicationBuilder {
    registry: MetadataRegistry,
    root: Option<Token>,
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a registry filled elsewhere. Replaces anything registered so far.
    pub fn registry(mut self, registry: MetadataRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Compose from the module registered under `token`
    pub fn root(mut self, token: impl Into<Token>) -> Self {
        self.root = Some(token.into());
        self
    }

    /// Register `M` and its imports, and compose from it
    pub fn root_module<M: Module>(mut self) -> Self {
        M::register(&mut self.registry);
        self.root = Some(Token::of::<M>());
        self
    }

    /// Compose the module tree
    ///
    /// # Errors
    ///
    /// Fails if no root was given, if composition fails, or if the root module
    /// is not named `"bootstrap"`.
    pub fn build(self) -> Result<Application> {
        let root = self
            .root
            .ok_or_else(|| ScopixError::config("Root module not provided"))?;

        tracing::info!(root = %root, "composing module tree...");
        let records = create_module(&self.registry, root, None, &[])?;

        // create_module always returns the root first.
        let root_name = records.first().map(|record| record.name.as_str());
        if root_name != Some(BOOTSTRAP_MODULE) {
            return Err(ScopixError::RootNotBootstrap {
                name: root_name.unwrap_or_default().to_string(),
            });
        }

        let modules = Modules::from(records);
        tracing::info!(modules = ?modules.names(), "module tree composed");
        Ok(Application { modules })
    }
}
