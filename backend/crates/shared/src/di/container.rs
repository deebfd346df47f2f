//! Dependency Container
//!
//! Maps a type to the instance most recently provided for it.
//!
//! ## Invariants
//! - At most one live instance per type key
//! - `provide` replaces, it never deletes
//! - Consumers built from an earlier instance keep that instance; only
//!   future lookups observe the replacement

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::error::{DiError, DiResult};
use super::registry::Dependencies;

/// Allocation identity of a provided instance
///
/// Two handles compare equal only when they point at the same allocation.
/// Structurally equal values provided separately are different instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn of<T: ?Sized>(instance: &Arc<T>) -> Self {
        Self(Arc::as_ptr(instance).cast::<()>() as usize)
    }
}

/// One provided instance, stored as an `Arc<T>` behind `Any`
struct Provided {
    instance: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Type-keyed registry of live dependency instances
///
/// ## Examples
/// ```rust
/// use std::sync::Arc;
/// use kernel::di::DependencyContainer;
///
/// struct Settings { name: &'static str }
///
/// let container = DependencyContainer::new();
/// container.provide(Arc::new(Settings { name: "first" }));
/// assert_eq!(container.resolve::<Settings>().unwrap().name, "first");
///
/// container.provide(Arc::new(Settings { name: "second" }));
/// assert_eq!(container.resolve::<Settings>().unwrap().name, "second");
/// ```
#[derive(Default)]
pub struct DependencyContainer {
    instances: RwLock<HashMap<TypeId, Provided>>,
}

impl DependencyContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the instance for `T`
    ///
    /// `T` may be unsized, so trait objects can be provided as `Arc<dyn Trait>`.
    pub fn provide<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        Provider {
            instances: &mut instances,
        }
        .provide(instance);
    }

    /// Register or replace every member of `set` under one write lock
    ///
    /// A concurrent `resolve_all` observes either the whole set or none of it.
    pub fn provide_all<D: Dependencies>(&self, set: D) {
        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        set.provide_into(&mut Provider {
            instances: &mut instances,
        });
    }

    /// Wrap `value` in an `Arc`, provide it, and return the handle
    pub fn provide_value<T>(&self, value: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let instance = Arc::new(value);
        self.provide(Arc::clone(&instance));
        instance
    }

    /// Current instance for `T`
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
        Resolver {
            instances: &instances,
        }
        .resolve::<T>()
    }

    /// Resolve an ordered dependency set under one read lock
    ///
    /// A concurrent `provide` is observed either entirely or not at all.
    pub fn resolve_all<D: Dependencies>(&self) -> DiResult<D> {
        let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
        D::resolve(&Resolver {
            instances: &instances,
        })
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DependencyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = instances.values().map(|p| p.type_name).collect();
        names.sort_unstable();
        f.debug_struct("DependencyContainer")
            .field("instances", &names)
            .finish()
    }
}

/// Read view over the container, valid while its lock is held
pub struct Resolver<'a> {
    instances: &'a HashMap<TypeId, Provided>,
}

impl Resolver<'_> {
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let provided = self
            .instances
            .get(&TypeId::of::<T>())
            .ok_or_else(DiError::missing::<T>)?;

        provided
            .instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(DiError::mismatch::<T>)
    }
}

/// Write view over the container, valid while its lock is held
pub struct Provider<'a> {
    instances: &'a mut HashMap<TypeId, Provided>,
}

impl Provider<'_> {
    pub fn provide<T>(&mut self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let provided = Provided {
            instance: Box::new(instance),
            type_name: type_name::<T>(),
        };
        let replaced = self
            .instances
            .insert(TypeId::of::<T>(), provided)
            .is_some();

        tracing::debug!(dependency = type_name::<T>(), replaced, "Dependency provided");
    }
}
