//! Capability container with transient and singleton lifetimes.
//!
//! # Responsibilities
//! - Store one registration per capability name
//! - Construct instances through async factories on resolve
//! - Cache singletons after their first successful construction
//!
//! # Design Decisions
//! - Singleton slots are an explicit state machine, not an `Option` check:
//!   a second resolver arriving while the factory is suspended awaits the same
//!   shared construction instead of starting its own
//! - A failed construction puts the slot back to `Uninitialized`
//! - The slot mutex is never held across an await point

use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use thiserror::Error;

use super::token::Token;

/// Error type returned by factories and setup hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cloneable error, shared between resolvers awaiting the same construction.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Type-erased `Arc<T>` as stored by the container.
type Instance = Arc<dyn Any + Send + Sync>;

type ErasedFactory = Box<dyn Fn() -> BoxFuture<'static, Result<Instance, BoxError>> + Send + Sync>;

type Construction = Shared<BoxFuture<'static, Result<Instance, SharedError>>>;

/// Errors raised by the registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("service {0} not found")]
    NotFound(String),

    #[error("service {0} is already registered")]
    AlreadyRegistered(String),

    #[error("service {name} is registered as {registered}, not {requested}")]
    TypeMismatch {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },

    #[error("factory for service {name} failed: {source}")]
    Factory {
        name: String,
        #[source]
        source: SharedError,
    },
}

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// A fresh instance on every resolve.
    Transient,
    /// Constructed on first resolve, then shared for the life of the registry.
    Singleton,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => f.write_str("transient"),
            Lifetime::Singleton => f.write_str("singleton"),
        }
    }
}

enum Slot {
    Uninitialized,
    Initializing { attempt: u64, construction: Construction },
    Ready(Instance),
}

struct SingletonCell {
    slot: Slot,
    attempts: u64,
}

struct Registration {
    lifetime: Lifetime,
    type_id: TypeId,
    type_name: &'static str,
    factory: ErasedFactory,
    cell: Mutex<SingletonCell>,
}

impl Registration {
    fn lock_cell(&self) -> MutexGuard<'_, SingletonCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn construct(&self, name: &str) -> Result<Instance, RegistryError> {
        (self.factory)()
            .await
            .map_err(|source| RegistryError::Factory {
                name: name.to_string(),
                source: source.into(),
            })
    }

    async fn singleton(&self, name: &str) -> Result<Instance, RegistryError> {
        let (attempt, construction) = {
            let mut guard = self.lock_cell();
            let cell = &mut *guard;
            match &cell.slot {
                Slot::Ready(instance) => return Ok(Arc::clone(instance)),
                Slot::Initializing {
                    attempt,
                    construction,
                } => (*attempt, construction.clone()),
                Slot::Uninitialized => {
                    cell.attempts += 1;
                    let attempt = cell.attempts;
                    let construction = (self.factory)()
                        .map_err(|source: BoxError| -> SharedError { source.into() })
                        .boxed()
                        .shared();
                    cell.slot = Slot::Initializing {
                        attempt,
                        construction: construction.clone(),
                    };
                    tracing::debug!(service = %name, attempt, "Constructing singleton");
                    (attempt, construction)
                }
            }
        };

        let outcome = construction.await;

        let mut cell = self.lock_cell();
        let owns_slot = matches!(
            cell.slot,
            Slot::Initializing { attempt: current, .. } if current == attempt
        );
        match outcome {
            Ok(instance) => {
                if owns_slot {
                    cell.slot = Slot::Ready(Arc::clone(&instance));
                }
                Ok(instance)
            }
            Err(source) => {
                if owns_slot {
                    cell.slot = Slot::Uninitialized;
                    tracing::warn!(service = %name, error = %source, "Singleton construction failed");
                }
                Err(RegistryError::Factory {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }
}

/// Maps capability names to factories and resolves them to instances.
#[derive(Default)]
pub struct Registry {
    entries: DashMap<String, Arc<Registration>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transient capability: every resolve runs `factory` anew.
    pub fn register<T, F, Fut>(&self, token: &Token<T>, factory: F) -> Result<(), RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, BoxError>> + Send + 'static,
    {
        self.insert(token, Lifetime::Transient, factory)
    }

    /// Register a singleton capability. The factory is not invoked until the
    /// first resolve.
    pub fn register_singleton<T, F, Fut>(
        &self,
        token: &Token<T>,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, BoxError>> + Send + 'static,
    {
        self.insert(token, Lifetime::Singleton, factory)
    }

    fn insert<T, F, Fut>(
        &self,
        token: &Token<T>,
        lifetime: Lifetime,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, BoxError>> + Send + 'static,
    {
        let factory: ErasedFactory = Box::new(move || {
            factory()
                .map_ok(|instance| Arc::new(instance) as Instance)
                .boxed()
        });

        match self.entries.entry(token.name().to_string()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(token.name().to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Registration {
                    lifetime,
                    type_id: TypeId::of::<T>(),
                    type_name: std::any::type_name::<T>(),
                    factory,
                    cell: Mutex::new(SingletonCell {
                        slot: Slot::Uninitialized,
                        attempts: 0,
                    }),
                }));
                tracing::debug!(service = %token, %lifetime, "Service registered");
                Ok(())
            }
        }
    }

    /// Resolve a capability to an instance.
    pub async fn resolve<T>(&self, token: &Token<T>) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let name = token.name();
        let registration = self
            .entries
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if registration.type_id != TypeId::of::<T>() {
            return Err(RegistryError::TypeMismatch {
                name: name.to_string(),
                registered: registration.type_name,
                requested: std::any::type_name::<T>(),
            });
        }

        let instance = match registration.lifetime {
            Lifetime::Transient => registration.construct(name).await?,
            Lifetime::Singleton => registration.singleton(name).await?,
        };

        (*instance)
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| RegistryError::TypeMismatch {
                name: name.to_string(),
                registered: registration.type_name,
                requested: std::any::type_name::<T>(),
            })
    }

    /// True if `name` has a registration, whether or not it was constructed.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("services", &self.names())
            .finish()
    }
}
