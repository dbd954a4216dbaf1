//! Design - immutable binding registry with override composition
//!
//! A Design maps binding keys to providers. Every operation is a pure
//! function returning a new Design; composition (`d1 + d2`) is a union
//! where the right-hand side wins on key collision. Unresolved keys are not
//! an error here, only at resolution time.

use std::ops::Add;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::key::BindingKey;
use crate::provider::{to_value, Provider, Value};

/// Immutable map from [`BindingKey`] to [`Provider`]
///
/// Providers sit behind `Arc`, so cloning the map on each bind copies
/// pointers, never provider state.
#[derive(Debug, Clone, Default)]
pub struct Design {
    bindings: FxHashMap<BindingKey, Arc<Provider>>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an already-resolved value at `key`
    pub fn bind_instance<T>(self, key: impl Into<BindingKey>, value: T) -> Design
    where
        T: Send + Sync + 'static,
    {
        self.bind(key.into(), Provider::instance(to_value(value)))
    }

    /// Bind a synchronous provider function with an explicit dependency list
    pub fn bind_provider<K, F>(
        self,
        key: impl Into<BindingKey>,
        deps: impl IntoIterator<Item = K>,
        f: F,
    ) -> Design
    where
        K: Into<BindingKey>,
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let deps = deps.into_iter().map(Into::into).collect::<Vec<_>>();
        self.bind(key.into(), Provider::sync(deps, f))
    }

    /// Bind an asynchronous provider function with an explicit dependency list
    pub fn bind_async_provider<K, F, Fut>(
        self,
        key: impl Into<BindingKey>,
        deps: impl IntoIterator<Item = K>,
        f: F,
    ) -> Design
    where
        K: Into<BindingKey>,
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let deps = deps.into_iter().map(Into::into).collect::<Vec<_>>();
        self.bind(key.into(), Provider::asynchronous(deps, f))
    }

    /// Bind a pre-built provider at `key`, replacing any existing binding
    pub fn bind(mut self, key: BindingKey, provider: Provider) -> Design {
        self.bindings.insert(key, Arc::new(provider));
        self
    }

    /// Union of `self` and `other`; `other` wins on key collision
    ///
    /// Associative, not commutative.
    pub fn compose(mut self, other: Design) -> Design {
        self.bindings.extend(other.bindings);
        self
    }

    pub fn get(&self, key: &BindingKey) -> Option<&Arc<Provider>> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// All currently bound keys
    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Add for Design {
    type Output = Design;

    /// Operator form of [`Design::compose`]
    fn add(self, other: Design) -> Design {
        self.compose(other)
    }
}
