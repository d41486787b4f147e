//! # Scopix
//!
//! Module composition and per-request scoped dependency injection for Rust servers.
//!
//! An application is a tree of modules. Each module gets its own injector and only
//! sees what its parent explicitly exports. Every incoming request then runs in a
//! fresh child injector of the bootstrap module, seeded with request-scoped values,
//! where a [`RouteResolver`] produces the response.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scopix::prelude::*;
//!
//! // 1. Define your service
//! #[derive(Injectable)]
//! pub struct UserService {
//!     database: Arc<Database>,
//! }
//!
//! // 2. Define your modules
//! #[module(name = "users", providers = [UserService])]
//! pub struct UserModule;
//!
//! #[module(
//!     name = "bootstrap",
//!     imports = [UserModule],
//!     exports = [Database],
//!     providers = [Database, Logger],
//! )]
//! pub struct AppModule;
//!
//! // 3. Define the route resolver, built once per request
//! #[derive(Injectable)]
//! pub struct AppResolver {
//!     #[inject("url")]
//!     url: Arc<RequestUrl>,
//!     #[inject("modules")]
//!     modules: Arc<Modules>,
//! }
//!
//! #[async_trait]
//! impl RouteResolver for AppResolver {
//!     async fn process(&self) -> anyhow::Result<Payload> {
//!         Ok(Payload::from(self.url.path()))
//!     }
//! }
//!
//! // 4. Bootstrap your application
//! #[tokio::main]
//! async fn main() -> scopix::Result<()> {
//!     let config = ServerConfig::from_config(&ConfigService::from_env())?;
//!     scopix::logging::init_tracing(&config.logging)?;
//!
//!     let app = Application::builder().root_module::<AppModule>().build()?;
//!     app.serve::<AppResolver>(&config).await
//! }
//! ```

pub mod application;
pub mod config;
pub mod di;
pub mod error;
pub mod logger;
pub mod logging;
pub mod module;
pub mod server;

// Re-export core types
pub use application::{Application, ApplicationBuilder};
pub use di::{Injectable, Injector, InjectorBuilder, Provider, Token};
pub use error::{Result, ScopixError};
pub use logger::Logger;
pub use module::{
    BOOTSTRAP_MODULE, MetadataRegistry, Module, ModuleMetadata, ModuleRecord, Modules,
    create_module, get_module,
};
pub use server::{Payload, RequestOutcome, RouteResolver, fire_request};

// Re-export macros
pub use scopix_macro::{Injectable as DeriveInjectable, module};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use scopix::prelude::*;
/// ```
pub mod prelude {
    pub use crate::application::{Application, ApplicationBuilder};
    pub use crate::config::{ConfigService, LogFormat, LoggingConfig, ServerConfig};
    pub use crate::di::{Injectable, Injector, InjectorBuilder, Provider, Token};
    pub use crate::error::{Result, ScopixError};
    pub use crate::logger::Logger;
    pub use crate::module::{
        BOOTSTRAP_MODULE, MetadataRegistry, Module, ModuleMetadata, ModuleRecord, Modules,
        create_module, get_module,
    };
    pub use crate::server::{
        CorrelationId, IncomingRequest, Payload, RequestData, RequestDispatcher,
        RequestOutcome, RequestUrl, ResolverFailure, RouteResolver, ServerResponse,
        fire_request, tokens,
    };
    pub use crate::{DeriveInjectable as Injectable, module};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
