//! Providers - the executable unit behind one binding
//!
//! A provider is either an already-resolved instance, a synchronous
//! function, or an asynchronous function. Each declares the keys it needs
//! resolved first; the dependency list is explicit, never inferred from the
//! function's signature.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use smallvec::SmallVec;

use crate::error::SkeinError;
use crate::key::BindingKey;

/// Runtime representation of every resolved value
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap a typed value for binding or returning from a provider
pub fn to_value<T: Send + Sync + 'static>(value: T) -> Value {
    Arc::new(value)
}

/// Extract a typed value at a provider boundary
///
/// Fails with `TypeMismatch` naming the expected type; converts into
/// `anyhow::Error` with `?` inside provider functions.
pub fn from_value<T: Clone + Send + Sync + 'static>(value: &Value) -> Result<T, SkeinError> {
    Arc::clone(value)
        .downcast::<T>()
        .map(|typed| (*typed).clone())
        .map_err(|_| SkeinError::type_mismatch::<T>("provider dependency"))
}

/// Synchronous provider function over resolved dependency values
pub type SyncFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Asynchronous provider function; the returned future is awaited after all
/// dependencies resolved
pub type AsyncFn = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// How a provider produces its value
#[derive(Clone)]
pub enum ProviderKind {
    /// The value itself; nothing to invoke
    Instance(Value),
    /// Runs on the resolving task once deps are in hand
    Sync(SyncFn),
    /// Awaited; suspends only its own resolution branch
    Async(AsyncFn),
}

/// One binding's executable unit: declared dependencies + how to produce
///
/// Immutable after construction. Dependency lists are short in practice,
/// so they live inline up to four keys.
#[derive(Clone)]
pub struct Provider {
    deps: SmallVec<[BindingKey; 4]>,
    kind: ProviderKind,
}

impl Provider {
    pub fn instance(value: Value) -> Self {
        Self {
            deps: SmallVec::new(),
            kind: ProviderKind::Instance(value),
        }
    }

    pub fn sync<F>(deps: impl IntoIterator<Item = BindingKey>, f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            deps: deps.into_iter().collect(),
            kind: ProviderKind::Sync(Arc::new(f)),
        }
    }

    pub fn asynchronous<F, Fut>(deps: impl IntoIterator<Item = BindingKey>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            deps: deps.into_iter().collect(),
            kind: ProviderKind::Async(Arc::new(move |values| f(values).boxed())),
        }
    }

    /// Keys this provider needs resolved before it runs
    pub fn deps(&self) -> &[BindingKey] {
        &self.deps
    }

    pub fn kind(&self) -> &ProviderKind {
        &self.kind
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ProviderKind::Instance(_) => "instance",
            ProviderKind::Sync(_) => "sync",
            ProviderKind::Async(_) => "async",
        };
        f.debug_struct("Provider")
            .field("kind", &kind)
            .field("deps", &self.deps)
            .finish()
    }
}
