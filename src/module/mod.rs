//! Module composition
//!
//! A module declares its own providers, the modules it imports, and the tokens it
//! exports to those imports. [`create_module`] walks the import tree once at
//! startup and produces one [`ModuleRecord`] per module, each with its own
//! resolved [`Injector`].
//!
//! ```text
//! bootstrap (exports: Database)
//!  ├── users     ← sees Database, nothing else from bootstrap
//!  │    └── audit ← sees nothing unless users re-exports
//!  └── orders    ← sees Database
//! ```

mod composer;
mod metadata;
mod registry;

use std::ops::Deref;
use std::sync::Arc;

use crate::di::{Injector, Provider};

pub use composer::{create_module, duplicate_names};
pub use metadata::{Module, ModuleMetadata};
pub use registry::MetadataRegistry;

/// Name of the root module of every application tree.
pub const BOOTSTRAP_MODULE: &str = "bootstrap";

/// One composed module: its name, its resolved injector, and how it was declared.
#[derive(Clone, Debug)]
pub struct ModuleRecord {
    pub name: String,
    pub injector: Arc<Injector>,
    pub provider: Provider,
    pub controllers: Vec<Provider>,
}

/// Find a module by name. Returns the first match.
pub fn get_module<'a>(modules: &'a [ModuleRecord], name: &str) -> Option<&'a ModuleRecord> {
    modules.iter().find(|record| record.name == name)
}

/// The module named [`BOOTSTRAP_MODULE`], if any.
pub fn root_module(modules: &[ModuleRecord]) -> Option<&ModuleRecord> {
    get_module(modules, BOOTSTRAP_MODULE)
}

/// Immutable, cheaply cloneable list of composed modules.
#[derive(Clone, Debug)]
pub struct Modules(Arc<[ModuleRecord]>);

impl Modules {
    pub fn get(&self, name: &str) -> Option<&ModuleRecord> {
        get_module(&self.0, name)
    }

    pub fn root(&self) -> Option<&ModuleRecord> {
        root_module(&self.0)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|record| record.name.as_str()).collect()
    }
}

impl From<Vec<ModuleRecord>> for Modules {
    fn from(records: Vec<ModuleRecord>) -> Self {
        Modules(records.into())
    }
}

impl Deref for Modules {
    type Target = [ModuleRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
