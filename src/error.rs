use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopixError>;

#[derive(Debug, Error)]
pub enum ScopixError {
    #[error("Dependency not found: {token}")]
    DependencyNotFound { token: String },

    #[error("Failed to downcast instance of {token} to {type_name}")]
    DowncastFailed { token: String, type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("No module metadata registered for {module}")]
    MissingMetadata { module: String },

    #[error(
        "Only one \"bootstrap\" module is allowed. Please make sure that all child modules \
         have a defined name and that no child module is named \"bootstrap\""
    )]
    DuplicateBootstrapModule,

    #[error(
        "Modules must have unique names. Please make sure that all child modules have unique names. {}",
        .names.join(",")
    )]
    DuplicateModuleNames { names: Vec<String> },

    #[error("No \"bootstrap\" module found in the composed module list")]
    BootstrapModuleMissing,

    #[error("Root module must be named \"bootstrap\", found \"{name}\"")]
    RootNotBootstrap { name: String },

    #[error("Module import cycle: {path}")]
    CyclicImport { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScopixError {
    pub(crate) fn not_found(token: impl ToString) -> Self {
        Self::DependencyNotFound {
            token: token.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for ScopixError {
    fn into_response(self) -> axum::response::Response {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            self.to_string(),
        )
            .into_response()
    }
}
