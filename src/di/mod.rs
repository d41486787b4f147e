mod builder;
mod injectable;
mod injector;
mod provider;
mod token;

pub use builder::InjectorBuilder;
pub use injectable::Injectable;
pub use injector::Injector;
pub use provider::{Instance, Provider, Strategy};
pub use token::Token;
