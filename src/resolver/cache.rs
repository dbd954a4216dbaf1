//! Resolution cache - per-resolver memoization with in-flight dedup
//!
//! Each key's evaluation is cached as a shared future. The DashMap entry
//! API makes the insert atomic: the first demander starts the evaluation,
//! every concurrent demander awaits the same future, and a finished entry
//! replays its result (value or error) without re-invoking the provider.
//! Entries are never evicted; the cache dies with its resolver.

use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};

use crate::error::SkeinError;
use crate::key::BindingKey;
use crate::provider::Value;

/// A key evaluation that can be awaited by any number of branches
pub(crate) type SharedResolution = Shared<BoxFuture<'static, Result<Value, SkeinError>>>;

#[derive(Default)]
pub(crate) struct ResolutionCache {
    slots: DashMap<BindingKey, SharedResolution>,
}

impl ResolutionCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the resolution for `key`, starting it via `start` if absent
    ///
    /// Atomic get-or-insert: `start` runs at most once per key per cache.
    pub(crate) fn get_or_start(
        &self,
        key: &BindingKey,
        start: impl FnOnce() -> SharedResolution,
    ) -> SharedResolution {
        use dashmap::mapref::entry::Entry;

        match self.slots.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let resolution = start();
                entry.insert(resolution.clone());
                resolution
            }
        }
    }

    /// Number of keys with a started (or finished) resolution
    #[allow(dead_code)] // Used in tests
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{from_value, to_value};
    use futures::FutureExt;

    fn ready(value: i64) -> SharedResolution {
        async move { Ok(to_value(value)) }.boxed().shared()
    }

    #[tokio::test]
    async fn second_demand_reuses_first_resolution() {
        let cache = ResolutionCache::new();
        let key = BindingKey::new("a");

        let first = cache.get_or_start(&key, || ready(1));
        let second = cache.get_or_start(&key, || ready(2));

        assert_eq!(from_value::<i64>(&first.await.unwrap()).unwrap(), 1);
        assert_eq!(from_value::<i64>(&second.await.unwrap()).unwrap(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_slots() {
        let cache = ResolutionCache::new();

        let a = cache.get_or_start(&BindingKey::new("a"), || ready(1));
        let b = cache.get_or_start(&BindingKey::new("b"), || ready(2));

        assert_eq!(from_value::<i64>(&a.await.unwrap()).unwrap(), 1);
        assert_eq!(from_value::<i64>(&b.await.unwrap()).unwrap(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failed_resolution_replays_same_error() {
        let cache = ResolutionCache::new();
        let key = BindingKey::new("broken");
        let failing: SharedResolution = async {
            Err(SkeinError::ProviderPanicked {
                key: BindingKey::new("broken"),
                message: "boom".into(),
            })
        }
        .boxed()
        .shared();

        let first = cache.get_or_start(&key, || failing);
        let second = cache.get_or_start(&key, || unreachable!("already started"));

        assert_eq!(first.await.unwrap_err().code(), "SKEIN-031");
        assert_eq!(second.await.unwrap_err().code(), "SKEIN-031");
    }
}
