//! Use Case Registry
//!
//! Builds use cases from the dependencies currently held by a
//! [`DependencyContainer`] and caches each one until one of those
//! dependencies is replaced.
//!
//! Rebinding is lazy and pull-based: a `provide` takes effect on the next
//! [`UseCaseRegistry::get`], never on instances already handed out.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::container::{DependencyContainer, InstanceId, Provider, Resolver};
use super::error::{DiError, DiResult};

/// An ordered set of dependencies resolved from the container
///
/// Implemented for `()` and for tuples of `Arc<T>` up to six elements.
/// Tuple order is declaration order.
pub trait Dependencies: Clone + Send + Sync + Sized + 'static {
    fn resolve(resolver: &Resolver<'_>) -> DiResult<Self>;

    /// Allocation identity of every member, in declaration order
    fn identities(&self) -> Vec<InstanceId>;

    /// Hand every member to `provider`
    fn provide_into(self, provider: &mut Provider<'_>);
}

impl Dependencies for () {
    fn resolve(_resolver: &Resolver<'_>) -> DiResult<Self> {
        Ok(())
    }

    fn identities(&self) -> Vec<InstanceId> {
        Vec::new()
    }

    fn provide_into(self, _provider: &mut Provider<'_>) {}
}

macro_rules! impl_dependencies {
    ($($dep:ident),+) => {
        impl<$($dep),+> Dependencies for ($(Arc<$dep>,)+)
        where
            $($dep: ?Sized + Send + Sync + 'static,)+
        {
            fn resolve(resolver: &Resolver<'_>) -> DiResult<Self> {
                Ok(($(resolver.resolve::<$dep>()?,)+))
            }

            #[allow(non_snake_case)]
            fn identities(&self) -> Vec<InstanceId> {
                let ($($dep,)+) = self;
                vec![$(InstanceId::of($dep)),+]
            }

            #[allow(non_snake_case)]
            fn provide_into(self, provider: &mut Provider<'_>) {
                let ($($dep,)+) = self;
                $(provider.provide($dep);)+
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);

/// A type the registry knows how to build
///
/// The impl is the per-type factory: `Dependencies` declares what to pull
/// from the container and `inject` receives them in the same order.
///
/// ## Examples
/// ```rust
/// use std::sync::Arc;
/// use kernel::di::{Injectable, UseCaseRegistry};
///
/// struct Greeting(String);
///
/// struct Greet {
///     greeting: Arc<Greeting>,
/// }
///
/// impl Injectable for Greet {
///     type Dependencies = (Arc<Greeting>,);
///
///     fn inject((greeting,): Self::Dependencies) -> Self {
///         Self { greeting }
///     }
/// }
///
/// let registry = UseCaseRegistry::default();
/// registry.provide(Arc::new(Greeting("hello".to_string())));
/// let use_case = registry.get::<Greet>().unwrap();
/// assert_eq!(use_case.greeting.0, "hello");
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    type Dependencies: Dependencies;

    fn inject(dependencies: Self::Dependencies) -> Self;
}

struct CachedUseCase {
    identities: Vec<InstanceId>,
    /// Holds the resolved set so its addresses cannot be reused while cached
    _dependencies: Box<dyn Any + Send + Sync>,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Builds and caches use cases keyed by type and dependency identity
#[derive(Default)]
pub struct UseCaseRegistry {
    container: Arc<DependencyContainer>,
    cache: Mutex<HashMap<TypeId, CachedUseCase>>,
}

impl UseCaseRegistry {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        Self {
            container,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The container this registry resolves from
    pub fn container(&self) -> &Arc<DependencyContainer> {
        &self.container
    }

    /// Register or replace a dependency (see [`DependencyContainer::provide`])
    pub fn provide<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.provide(instance);
    }

    /// Get the use case `U`, rebuilding it iff a dependency was replaced
    ///
    /// ## Errors
    /// `DiError::MissingDependency` when any declared dependency has never
    /// been provided.
    pub fn get<U: Injectable>(&self) -> DiResult<Arc<U>> {
        let dependencies = self.container.resolve_all::<U::Dependencies>()?;
        let identities = dependencies.identities();

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = cache.get(&TypeId::of::<U>()) {
            if cached.identities == identities {
                return Arc::clone(&cached.instance)
                    .downcast::<U>()
                    .map_err(|_| DiError::mismatch::<U>());
            }
        }

        tracing::debug!(
            use_case = type_name::<U>(),
            dependencies = identities.len(),
            "Building use case"
        );

        let instance = Arc::new(U::inject(dependencies.clone()));
        cache.insert(
            TypeId::of::<U>(),
            CachedUseCase {
                identities,
                _dependencies: Box::new(dependencies),
                instance: Arc::clone(&instance) as Arc<dyn Any + Send + Sync>,
            },
        );

        Ok(instance)
    }

    /// Drop every cached use case
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached use cases
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_case::UseCase;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct TestDependency {
        name: String,
    }

    struct Clock {
        offset: u64,
    }

    // ------------------------------------------------------------------
    // Test use cases
    // ------------------------------------------------------------------

    struct UseCaseWithDependencies {
        dep: Arc<TestDependency>,
    }

    impl Injectable for UseCaseWithDependencies {
        type Dependencies = (Arc<TestDependency>,);

        fn inject((dep,): Self::Dependencies) -> Self {
            Self { dep }
        }
    }

    impl UseCase for UseCaseWithDependencies {
        type Input = ();
        type Output = String;
        type Error = std::convert::Infallible;

        async fn apply(&self, _input: ()) -> Result<String, Self::Error> {
            Ok(self.dep.name.clone())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Explode")]
    struct InvalidConfiguration;

    struct UseCaseWithExceptions;

    impl Injectable for UseCaseWithExceptions {
        type Dependencies = ();

        fn inject(_: ()) -> Self {
            Self
        }
    }

    impl UseCase for UseCaseWithExceptions {
        type Input = ();
        type Output = ();
        type Error = InvalidConfiguration;

        async fn apply(&self, _input: ()) -> Result<(), InvalidConfiguration> {
            Err(InvalidConfiguration)
        }
    }

    struct UseCaseWithParameters;

    impl Injectable for UseCaseWithParameters {
        type Dependencies = ();

        fn inject(_: ()) -> Self {
            Self
        }
    }

    impl UseCase for UseCaseWithParameters {
        type Input = String;
        type Output = String;
        type Error = std::convert::Infallible;

        async fn apply(&self, input: String) -> Result<String, Self::Error> {
            Ok(input)
        }
    }

    struct TwoDependencies {
        dep: Arc<TestDependency>,
        clock: Arc<Clock>,
    }

    impl Injectable for TwoDependencies {
        type Dependencies = (Arc<TestDependency>, Arc<Clock>);

        fn inject((dep, clock): Self::Dependencies) -> Self {
            Self { dep, clock }
        }
    }

    static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Injectable for Counted {
        type Dependencies = ();

        fn inject(_: ()) -> Self {
            COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
            Self
        }
    }

    fn registry() -> UseCaseRegistry {
        UseCaseRegistry::new(Arc::new(DependencyContainer::new()))
    }

    fn dependency(name: &str) -> Arc<TestDependency> {
        Arc::new(TestDependency {
            name: name.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_use_case_with_dependencies_runs() {
        let registry = registry();
        registry.provide(dependency("Something"));

        let use_case = registry.get::<UseCaseWithDependencies>().unwrap();
        assert_eq!(use_case.apply(()).await.unwrap(), "Something");
    }

    #[tokio::test]
    async fn test_use_case_with_declared_error() {
        let registry = registry();
        let use_case = registry.get::<UseCaseWithExceptions>().unwrap();
        let err = use_case.apply(()).await.unwrap_err();
        assert_eq!(err.to_string(), "Explode");
    }

    #[tokio::test]
    async fn test_use_case_with_parameters_echoes_input() {
        let registry = registry();
        let use_case = registry.get::<UseCaseWithParameters>().unwrap();
        assert_eq!(use_case.apply("hello".to_string()).await.unwrap(), "hello");
    }

    #[test]
    fn test_zero_dependencies_need_no_provide() {
        let registry = registry();
        assert!(registry.container().is_empty());
        assert!(registry.get::<UseCaseWithParameters>().is_ok());
    }

    #[test]
    fn test_missing_dependency() {
        let registry = registry();
        let err = registry.get::<UseCaseWithDependencies>().err().unwrap();
        assert!(matches!(err, DiError::MissingDependency { .. }));
        assert!(err.type_name().ends_with("TestDependency"));
    }

    #[test]
    fn test_missing_any_one_of_several() {
        let registry = registry();
        registry.provide(dependency("only one"));
        let err = registry.get::<TwoDependencies>().err().unwrap();
        assert!(err.type_name().ends_with("Clock"));
        assert_eq!(registry.cached(), 0);
    }

    // ------------------------------------------------------------------
    // Caching and rebinding
    // ------------------------------------------------------------------

    #[test]
    fn test_get_twice_returns_cached_instance() {
        let registry = registry();
        registry.provide(dependency("a"));

        let first = registry.get::<UseCaseWithDependencies>().unwrap();
        let second = registry.get::<UseCaseWithDependencies>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_zero_dependency_use_case_built_once() {
        let registry = registry();
        let before = COUNTED_BUILDS.load(Ordering::SeqCst);
        registry.get::<Counted>().unwrap();
        registry.get::<Counted>().unwrap();
        registry.get::<Counted>().unwrap();
        assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn test_replaced_dependency_rebuilds() {
        let registry = registry();

        registry.provide(dependency("a"));
        let first = registry.get::<UseCaseWithDependencies>().unwrap();

        registry.provide(dependency("b"));
        let second = registry.get::<UseCaseWithDependencies>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.apply(()).await.unwrap(), "a");
        assert_eq!(second.apply(()).await.unwrap(), "b");
    }

    #[test]
    fn test_structurally_equal_dependency_still_rebuilds() {
        let registry = registry();

        registry.provide(dependency("same"));
        let first = registry.get::<UseCaseWithDependencies>().unwrap();

        registry.provide(dependency("same"));
        let second = registry.get::<UseCaseWithDependencies>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reproviding_same_instance_keeps_cache() {
        let registry = registry();
        let dep = dependency("same");

        registry.provide(Arc::clone(&dep));
        let first = registry.get::<UseCaseWithDependencies>().unwrap();

        registry.provide(dep);
        let second = registry.get::<UseCaseWithDependencies>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unrelated_provide_keeps_cache() {
        let registry = registry();
        registry.provide(dependency("a"));
        let first = registry.get::<UseCaseWithDependencies>().unwrap();

        registry.provide(Arc::new(Clock { offset: 1 }));
        let second = registry.get::<UseCaseWithDependencies>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_either_of_two_dependencies_triggers_rebuild() {
        let registry = registry();
        registry.provide(dependency("a"));
        registry.provide(Arc::new(Clock { offset: 1 }));
        let first = registry.get::<TwoDependencies>().unwrap();

        registry.provide(Arc::new(Clock { offset: 2 }));
        let second = registry.get::<TwoDependencies>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.clock.offset, 2);
        assert_eq!(second.dep.name, "a");

        registry.provide(dependency("b"));
        let third = registry.get::<TwoDependencies>().unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.dep.name, "b");
        assert_eq!(third.clock.offset, 2);
    }

    #[test]
    fn test_clear_forces_rebuild() {
        let registry = registry();
        let first = registry.get::<UseCaseWithParameters>().unwrap();
        registry.clear();
        assert_eq!(registry.cached(), 0);
        let second = registry.get::<UseCaseWithParameters>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    // ------------------------------------------------------------------
    // Concurrency
    // ------------------------------------------------------------------

    #[test]
    fn test_concurrent_provide_never_tears_dependency_set() {
        let registry = Arc::new(registry());
        registry.provide(dependency("0"));
        registry.provide(Arc::new(Clock { offset: 0 }));

        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 1..=200u64 {
                    // Both members are swapped together under the same label.
                    registry.provide(dependency(&i.to_string()));
                    registry.provide(Arc::new(Clock { offset: i }));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let use_case = registry.get::<TwoDependencies>().unwrap();
                        let name: u64 = use_case.dep.name.parse().unwrap();
                        // The clock is provided after the name, so a consistent
                        // snapshot never sees a clock ahead of its name.
                        assert!(use_case.clock.offset <= name);
                        assert!(name - use_case.clock.offset <= 1);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        let last = registry.get::<TwoDependencies>().unwrap();
        assert_eq!(last.dep.name, "200");
        assert_eq!(last.clock.offset, 200);
    }
}
