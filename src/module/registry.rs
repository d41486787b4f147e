use std::collections::HashMap;

use crate::di::{Provider, Token};
use crate::error::{Result, ScopixError};
use crate::module::{Module, ModuleMetadata};

struct RegistryEntry {
    provider: Provider,
    metadata: ModuleMetadata,
}

/// Module metadata keyed by module token.
///
/// Populated once at startup, then only read by [`create_module`](super::create_module).
/// Several independent registries may coexist.
#[derive(Default)]
pub struct MetadataRegistry {
    entries: HashMap<Token, RegistryEntry>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed module under `Token::of::<M>()`
    pub fn register<M: Module>(&mut self) -> &mut Self {
        self.insert(Provider::class::<M>(), M::metadata())
    }

    /// Register a module described at runtime. The provider's token is the module key.
    pub fn insert(&mut self, provider: Provider, metadata: ModuleMetadata) -> &mut Self {
        let token = provider.token().clone();
        if let Some(previous) = self.entries.get(&token) {
            tracing::debug!(module = %token, name = %previous.metadata.name, "replacing module metadata");
        }
        self.entries
            .insert(token, RegistryEntry { provider, metadata });
        self
    }

    pub fn contains(&self, module: &Token) -> bool {
        self.entries.contains_key(module)
    }

    /// Canonical provider descriptor for a module token
    pub fn verify_provider(&self, module: &Token) -> Result<Provider> {
        self.entry(module).map(|entry| entry.provider.clone())
    }

    pub fn get_component_config(&self, module: &Token) -> Result<&ModuleMetadata> {
        self.entry(module).map(|entry| &entry.metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, module: &Token) -> Result<&RegistryEntry> {
        self.entries
            .get(module)
            .ok_or_else(|| ScopixError::MissingMetadata {
                module: module.to_string(),
            })
    }
}
