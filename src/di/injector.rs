use crate::di::{InjectorBuilder, Instance, Provider, Token};
use crate::error::{Result, ScopixError};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::sync::Arc;

/// Per-token construction slot. Initialized at most once.
type Slot = Arc<OnceCell<Instance>>;

thread_local! {
    /// (injector address, token) pairs currently under construction on this thread.
    static RESOLVING: RefCell<Vec<(usize, Token)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a token as under construction for the current thread; pops on drop.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(owner: usize, token: &Token) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(o, t)| *o == owner && t == token) {
                let cycle = stack[start..]
                    .iter()
                    .map(|(_, t)| t.to_string())
                    .chain(std::iter::once(token.to_string()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(ScopixError::CircularDependency { cycle });
            }
            stack.push((owner, token.clone()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Thread-safe, parent-linked dependency injector.
///
/// Lookup order for a token: instances already resolved here (including
/// overrides), then this injector's own providers, then the parent chain.
/// Instances constructed from own providers are cached here, once per token.
///
/// Cycles are detected per thread. A cycle whose sides start constructing on
/// two threads at the same time blocks both threads instead of failing, so a
/// provider graph should be resolved once (as [`InjectorBuilder::resolve`]
/// does at startup) before it is shared across threads.
pub struct Injector {
    parent: Option<Arc<Injector>>,
    providers: DashMap<Token, Provider>,
    instances: DashMap<Token, Slot>,
}

impl Injector {
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// Build a parentless injector and resolve `provider` in it.
    ///
    /// `overrides` shadow any other binding for their tokens.
    pub fn create_and_resolve(provider: Provider, overrides: Vec<Provider>) -> Result<Arc<Self>> {
        InjectorBuilder::new().overrides(overrides).resolve(provider)
    }

    /// Same as [`Injector::create_and_resolve`], delegating misses to `parent`.
    pub fn create_and_resolve_child(
        parent: Arc<Injector>,
        provider: Provider,
        overrides: Vec<Provider>,
    ) -> Result<Arc<Self>> {
        InjectorBuilder::new()
            .parent(parent)
            .overrides(overrides)
            .resolve(provider)
    }

    pub(crate) fn new(parent: Option<Arc<Injector>>) -> Self {
        Self {
            parent,
            providers: DashMap::new(),
            instances: DashMap::new(),
        }
    }

    pub(crate) fn bind(&self, provider: Provider) {
        self.instances.remove(provider.token());
        self.providers.insert(provider.token().clone(), provider);
    }

    /// Bind a provider that shadows any other binding for its token.
    /// Literal values are stored as already-resolved instances.
    pub(crate) fn bind_override(&self, provider: Provider) {
        match provider.strategy() {
            crate::di::Strategy::Value(instance) => {
                let token = provider.token().clone();
                self.providers.remove(&token);
                self.instances
                    .insert(token, Arc::new(OnceCell::with_value(Arc::clone(instance))));
            }
            _ => self.bind(provider),
        }
    }

    pub fn parent(&self) -> Option<&Arc<Injector>> {
        self.parent.as_ref()
    }

    /// Resolve `token` anywhere in the chain, constructing and caching it on first use.
    pub fn get_any(&self, token: &Token) -> Result<Instance> {
        if let Some(instance) = self.cached(token) {
            return Ok(instance);
        }

        let provider = self.providers.get(token).map(|entry| entry.value().clone());
        match provider {
            Some(provider) => self.construct(token, &provider),
            None => match &self.parent {
                Some(parent) => parent.get_any(token),
                None => Err(ScopixError::not_found(token)),
            },
        }
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_by(&Token::of::<T>())
    }

    pub fn get_by<T: Send + Sync + 'static>(&self, token: &Token) -> Result<Arc<T>> {
        self.get_any(token)?
            .downcast::<T>()
            .map_err(|_| ScopixError::DowncastFailed {
                token: token.to_string(),
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let token = Token::of::<T>();
        // The binding stores an Arc<dyn Any> holding an Arc<T>.
        let wrapper = self
            .get_any(&token)?
            .downcast::<Arc<T>>()
            .map_err(|_| ScopixError::DowncastFailed {
                token: token.to_string(),
                type_name: format!("Arc<{}>", std::any::type_name::<T>()),
            })?;
        Ok(wrapper.as_ref().clone())
    }

    /// Whether `token` has a binding here or in an ancestor. Never constructs.
    pub fn contains(&self, token: &Token) -> bool {
        self.instances.contains_key(token)
            || self.providers.contains_key(token)
            || self.parent.as_ref().is_some_and(|parent| parent.contains(token))
    }

    /// Number of instances resolved in this injector (ancestors excluded).
    pub fn len(&self) -> usize {
        self.instances
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, token: &Token) -> Option<Instance> {
        self.instances
            .get(token)
            .and_then(|slot| slot.value().get().cloned())
    }

    fn construct(&self, token: &Token, provider: &Provider) -> Result<Instance> {
        // Clone the slot out so no map guard is held while the provider
        // resolves its own dependencies from this injector.
        let slot: Slot = Arc::clone(self.instances.entry(token.clone()).or_default().value());
        if let Some(instance) = slot.get() {
            return Ok(Arc::clone(instance));
        }

        let _guard = ResolutionGuard::enter(self as *const Self as usize, token)?;
        slot.get_or_try_init(|| {
            tracing::trace!(token = %token, "constructing provider");
            provider.instantiate(self)
        })
        .cloned()
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<String> = self.providers.iter().map(|e| e.key().to_string()).collect();
        f.debug_struct("Injector")
            .field("has_parent", &self.parent.is_some())
            .field("providers", &providers)
            .field("resolved", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Injectable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestService {
        value: i32,
    }

    trait MyTrait: Send + Sync {
        fn get_value(&self) -> i32;
    }

    struct MyTraitImpl {
        value: i32,
    }

    impl MyTrait for MyTraitImpl {
        fn get_value(&self) -> i32 {
            self.value
        }
    }

    struct Consumer {
        service: Arc<TestService>,
    }

    impl Injectable for Consumer {
        fn inject(injector: &Injector) -> Result<Self> {
            Ok(Self {
                service: injector.get::<TestService>()?,
            })
        }
    }

    struct Ping;
    struct Pong;

    impl Injectable for Ping {
        fn inject(injector: &Injector) -> Result<Self> {
            injector.get::<Pong>()?;
            Ok(Ping)
        }
    }

    impl Injectable for Pong {
        fn inject(injector: &Injector) -> Result<Self> {
            injector.get::<Ping>()?;
            Ok(Pong)
        }
    }

    #[test]
    fn test_value_and_class_resolution() {
        let injector = Injector::builder()
            .provider(Provider::value(Token::of::<TestService>(), TestService { value: 42 }))
            .resolve(Provider::class::<Consumer>())
            .unwrap();

        let consumer = injector.get::<Consumer>().unwrap();
        assert_eq!(consumer.service.value, 42);
        assert!(Arc::ptr_eq(
            &consumer.service,
            &injector.get::<TestService>().unwrap()
        ));
    }

    #[test]
    fn test_register_and_resolve_trait() {
        let injector = Injector::builder()
            .provider(Provider::value(Token::of::<MyTraitImpl>(), MyTraitImpl { value: 99 }))
            .provider(Provider::bind::<dyn MyTrait, MyTraitImpl, _>(|i| i as Arc<dyn MyTrait>))
            .build();
        let trait_instance = injector.get_trait::<dyn MyTrait>().unwrap();
        assert_eq!(trait_instance.get_value(), 99);
    }

    #[test]
    fn test_get_is_idempotent() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let injector = Injector::builder()
            .provider(Provider::factory("counter", move |_| {
                Ok(counter.fetch_add(1, Ordering::SeqCst))
            }))
            .build();

        let first = injector.get_by::<usize>(&Token::named("counter")).unwrap();
        let second = injector.get_by::<usize>(&Token::named("counter")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_get_constructs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let injector = Arc::new(
            Injector::builder()
                .provider(Provider::factory("slow", move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    Ok(String::from("ready"))
                }))
                .build(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let injector = Arc::clone(&injector);
                std::thread::spawn(move || injector.get_by::<String>(&Token::named("slow")).unwrap())
            })
            .collect();
        let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_child_delegates_to_parent_and_overrides_shadow() {
        let parent = Injector::builder()
            .provider(Provider::value("greeting", String::from("parent")))
            .provider(Provider::value(Token::of::<TestService>(), TestService { value: 1 }))
            .build();

        let child = Injector::create_and_resolve_child(
            Arc::clone(&parent),
            Provider::class::<Consumer>(),
            vec![Provider::value("greeting", String::from("child"))],
        )
        .unwrap();

        let greeting = child.get_by::<String>(&Token::named("greeting")).unwrap();
        assert_eq!(greeting.as_str(), "child");
        let from_parent = parent.get_by::<String>(&Token::named("greeting")).unwrap();
        assert_eq!(from_parent.as_str(), "parent");

        // Parent singleton is shared, not rebuilt in the child.
        assert!(Arc::ptr_eq(
            &child.get::<Consumer>().unwrap().service,
            &parent.get::<TestService>().unwrap()
        ));
        assert!(!parent.contains(&Token::of::<Consumer>()));
    }

    #[test]
    fn test_missing_dependency_fails() {
        let err = Injector::create_and_resolve(Provider::class::<Consumer>(), vec![]).unwrap_err();
        assert!(matches!(err, ScopixError::DependencyNotFound { .. }));
    }

    #[test]
    fn test_cycle_is_reported() {
        let err = Injector::builder()
            .provider(Provider::class::<Pong>())
            .resolve(Provider::class::<Ping>())
            .unwrap_err();
        match err {
            ScopixError::CircularDependency { cycle } => {
                assert_eq!(cycle.matches("Ping").count(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_is_reported_on_every_thread() {
        let injector = Injector::builder()
            .provider(Provider::class::<Ping>())
            .provider(Provider::class::<Pong>())
            .provider(Provider::value(Token::of::<TestService>(), TestService { value: 7 }))
            .provider(Provider::class::<Consumer>())
            .build();

        let worker = {
            let injector = Arc::clone(&injector);
            std::thread::spawn(move || injector.get::<Pong>().map(|_| ()))
        };
        let from_worker = worker.join().unwrap();
        assert!(matches!(from_worker, Err(ScopixError::CircularDependency { .. })));
        assert!(matches!(
            injector.get::<Ping>(),
            Err(ScopixError::CircularDependency { .. })
        ));

        // A failed attempt leaves nothing behind on the resolution stack.
        assert_eq!(injector.get::<Consumer>().unwrap().service.value, 7);
    }

    #[test]
    fn test_downcast_mismatch() {
        let injector = Injector::builder()
            .provider(Provider::value("port", 8080u16))
            .build();
        let err = injector.get_by::<String>(&Token::named("port")).unwrap_err();
        assert!(matches!(err, ScopixError::DowncastFailed { .. }));
    }
}
