use crate::di::{Injectable, Injector, Token};
use crate::error::{Result, ScopixError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved, type-erased instance held by an injector.
pub type Instance = Arc<dyn Any + Send + Sync>;

type FactoryFn = Arc<dyn Fn(&Injector) -> Result<Instance> + Send + Sync>;

/// Casts the implementation instance into an `Arc<dyn Any>` wrapping `Arc<dyn Trait>`.
type CasterFn = Arc<dyn Fn(Instance) -> Result<Instance> + Send + Sync>;

/// How a provider produces its instance.
#[derive(Clone)]
pub enum Strategy {
    /// A literal, already-built instance. Shared, never constructed.
    Value(Instance),
    /// Construct an `Injectable` type by resolving its dependencies.
    Class {
        type_name: &'static str,
        build: FactoryFn,
    },
    /// Arbitrary construction closure over the injector.
    Factory(FactoryFn),
    /// Resolve `target` and expose it as a trait object.
    Bind { target: Token, caster: CasterFn },
}

/// A token paired with exactly one instantiation strategy.
#[derive(Clone)]
pub struct Provider {
    token: Token,
    strategy: Strategy,
}

impl Provider {
    /// Register `T` under its own type token.
    pub fn class<T: Injectable>() -> Self {
        Self::use_class::<T>(Token::of::<T>())
    }

    /// Register `T` under an arbitrary token.
    pub fn use_class<T: Injectable>(token: impl Into<Token>) -> Self {
        let build: FactoryFn = Arc::new(|injector: &Injector| {
            let instance: Instance = Arc::new(T::inject(injector)?);
            Ok(instance)
        });
        Self {
            token: token.into(),
            strategy: Strategy::Class {
                type_name: std::any::type_name::<T>(),
                build,
            },
        }
    }

    pub fn value<T: Send + Sync + 'static>(token: impl Into<Token>, value: T) -> Self {
        Self::shared(token, Arc::new(value))
    }

    /// Bind an instance that is already shared elsewhere.
    pub fn shared<T: Send + Sync + 'static>(token: impl Into<Token>, value: Arc<T>) -> Self {
        Self::instance(token, value)
    }

    pub fn instance(token: impl Into<Token>, instance: Instance) -> Self {
        Self {
            token: token.into(),
            strategy: Strategy::Value(instance),
        }
    }

    pub fn factory<T, F>(token: impl Into<Token>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Injector) -> Result<T> + Send + Sync + 'static,
    {
        let build: FactoryFn = Arc::new(move |injector: &Injector| {
            let instance: Instance = Arc::new(factory(injector)?);
            Ok(instance)
        });
        Self {
            token: token.into(),
            strategy: Strategy::Factory(build),
        }
    }

    /// Bind a trait to a concrete implementation
    ///
    /// Resolving `dyn Trait` resolves `Impl` (a singleton of the same injector chain)
    /// and casts it. Use [`Injector::get_trait`] to read the binding back.
    pub fn bind<Trait, Impl, F>(caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete =
                instance
                    .downcast::<Impl>()
                    .map_err(|_| ScopixError::DowncastFailed {
                        token: std::any::type_name::<Trait>().to_string(),
                        type_name: std::any::type_name::<Impl>().to_string(),
                    })?;
            let trait_obj: Arc<Trait> = caster(concrete);
            // Wrap the Arc<dyn Trait> in an Arc<dyn Any>
            let wrapped: Instance = Arc::new(trait_obj);
            Ok(wrapped)
        });
        Self {
            token: Token::of::<Trait>(),
            strategy: Strategy::Bind {
                target: Token::of::<Impl>(),
                caster,
            },
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub(crate) fn instantiate(&self, injector: &Injector) -> Result<Instance> {
        match &self.strategy {
            Strategy::Value(instance) => Ok(Arc::clone(instance)),
            Strategy::Class { build, .. } | Strategy::Factory(build) => build(injector),
            Strategy::Bind { target, caster } => caster(injector.get_any(target)?),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match &self.strategy {
            Strategy::Value(_) => "value".to_string(),
            Strategy::Class { type_name, .. } => format!("class {type_name}"),
            Strategy::Factory(_) => "factory".to_string(),
            Strategy::Bind { target, .. } => format!("bind {target}"),
        };
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("strategy", &strategy)
            .finish()
    }
}
