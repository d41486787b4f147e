use crate::di::{Injector, Provider};
use crate::error::Result;
use std::sync::Arc;

/// Builder for constructing an [`Injector`]
///
/// Own providers are registered first, overrides last, so an override always
/// shadows an own provider for the same token.
///
/// # Example
/// ```ignore
/// let injector = InjectorBuilder::new()
///     .parent(root)
///     .provider(Provider::class::<Database>())
///     .overrides(vec![Provider::value("url", url)])
///     .resolve(Provider::class::<UserService>())?;
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    parent: Option<Arc<Injector>>,
    providers: Vec<Provider>,
    overrides: Vec<Provider>,
}

impl InjectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate tokens this injector cannot resolve to `parent`
    pub fn parent(mut self, parent: Arc<Injector>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn overrides(mut self, overrides: impl IntoIterator<Item = Provider>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Build the injector without resolving anything
    pub fn build(self) -> Arc<Injector> {
        let injector = Injector::new(self.parent);
        for provider in self.providers {
            injector.bind(provider);
        }
        for provider in self.overrides {
            injector.bind_override(provider);
        }
        Arc::new(injector)
    }

    /// Build the injector, then resolve `provider` followed by every own provider
    /// in declaration order
    ///
    /// # Errors
    /// Fails if any of them has a dependency with no binding in the chain.
    pub fn resolve(mut self, provider: Provider) -> Result<Arc<Injector>> {
        let target = provider.token().clone();
        let eager: Vec<_> = self.providers.iter().map(|p| p.token().clone()).collect();
        self.providers.push(provider);

        let injector = self.build();
        injector.get_any(&target)?;
        for token in &eager {
            injector.get_any(token)?;
        }
        Ok(injector)
    }
}
