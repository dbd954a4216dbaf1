//! Resolver - executes a Design + Injected pair into a concrete value
//!
//! Resolution is staged: collect the transitive key closure, reject cycles
//! before anything runs, then evaluate bottom-up. Every key evaluation is
//! spawned onto the runtime and memoized as a shared future, so independent
//! subtrees progress in parallel while each provider runs at most once per
//! resolver instance. Two resolvers share nothing.

mod cache;

use std::sync::Arc;

use futures::future::join_all;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, instrument, trace};

use crate::design::Design;
use crate::error::SkeinError;
use crate::graph::DependencyGraph;
use crate::injected::{Injected, Node};
use crate::key::BindingKey;
use crate::provider::{ProviderKind, Value};

use self::cache::{ResolutionCache, SharedResolution};

struct ResolverInner {
    design: Design,
    cache: ResolutionCache,
}

/// Evaluates dependency expressions against one design
///
/// Key results are singletons for the lifetime of the resolver: the cache
/// persists and accumulates across `resolve` calls and is discarded with
/// the resolver.
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

impl Resolver {
    pub fn new(design: Design) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                design,
                cache: ResolutionCache::new(),
            }),
        }
    }

    pub fn design(&self) -> &Design {
        &self.inner.design
    }

    /// Resolve an expression to its typed value
    pub async fn resolve<T>(&self, target: &Injected<T>) -> Result<T, SkeinError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.resolve_erased(target.node()).await?;
        let typed = value
            .downcast::<T>()
            .map_err(|_| SkeinError::type_mismatch::<T>("resolved root"))?;
        Ok((*typed).clone())
    }

    /// Resolve a single key by name
    pub async fn resolve_key<T>(&self, key: impl Into<BindingKey>) -> Result<T, SkeinError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve(&Injected::<T>::by_name(key)).await
    }

    #[instrument(skip(self, node), fields(design_len = self.inner.design.len()))]
    async fn resolve_erased(&self, node: &Node) -> Result<Value, SkeinError> {
        let roots = node.keys();
        debug!(root_keys = roots.len(), "building dependency graph");

        let graph = DependencyGraph::collect(&self.inner.design, &roots)?;
        graph.check_cycles()?;
        debug!(closure = graph.len(), "graph acyclic, evaluating");

        eval_node(Arc::clone(&self.inner), node).await
    }
}

/// Demand a key's resolution, starting it if this is the first demand
///
/// Concurrent demands for an in-flight key await the same shared future
/// instead of invoking the provider again.
fn demand(inner: &Arc<ResolverInner>, key: &BindingKey) -> SharedResolution {
    inner.cache.get_or_start(key, || {
        trace!(%key, "starting key evaluation");
        spawn_evaluation(Arc::clone(inner), key.clone())
    })
}

/// Run one key's evaluation as its own runtime task
fn spawn_evaluation(inner: Arc<ResolverInner>, key: BindingKey) -> SharedResolution {
    let handle = tokio::spawn(evaluate_key(inner, key.clone()));
    async move {
        match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(SkeinError::ProviderPanicked {
                key,
                message: join_error.to_string(),
            }),
        }
    }
    .boxed()
    .shared()
}

/// Resolve a key's declared deps (concurrently), then invoke its provider
async fn evaluate_key(inner: Arc<ResolverInner>, key: BindingKey) -> Result<Value, SkeinError> {
    let provider = match inner.design.get(&key) {
        Some(provider) => Arc::clone(provider),
        // Graph collection validates bindings up front; this guards the
        // cache path itself.
        None => {
            return Err(SkeinError::MissingBinding {
                key,
                requested_by: Vec::new(),
            })
        }
    };

    let dep_resolutions: Vec<SharedResolution> = provider
        .deps()
        .iter()
        .map(|dep| demand(&inner, dep))
        .collect();
    let outcomes = join_all(dep_resolutions).await;
    let values = gather(outcomes, Some(&key))?;

    trace!(%key, deps = values.len(), "invoking provider");
    match provider.kind() {
        ProviderKind::Instance(value) => Ok(value.clone()),
        ProviderKind::Sync(f) => f(&values).map_err(|cause| SkeinError::ProviderFailed {
            key: key.clone(),
            context: Vec::new(),
            cause: Arc::new(cause),
        }),
        ProviderKind::Async(f) => f(values).await.map_err(|cause| SkeinError::ProviderFailed {
            key: key.clone(),
            context: Vec::new(),
            cause: Arc::new(cause),
        }),
    }
}

/// Split branch outcomes into values or a single structured failure
///
/// With a dependent key, each failure gains that key on its context chain.
/// Multiple sibling failures aggregate; the first observed is primary.
fn gather(
    outcomes: Vec<Result<Value, SkeinError>>,
    dependent: Option<&BindingKey>,
) -> Result<Vec<Value>, SkeinError> {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures: Vec<SkeinError> = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(error) => failures.push(match dependent {
                Some(key) => error.push_context(key.clone()),
                None => error,
            }),
        }
    }

    if failures.is_empty() {
        return Ok(values);
    }
    let primary = failures.remove(0);
    if failures.is_empty() {
        Err(primary)
    } else {
        Err(SkeinError::AggregateFailure {
            primary: Box::new(primary),
            secondary: failures,
        })
    }
}

/// Evaluate the combinator tree; zip and apply branches join concurrently
fn eval_node<'a>(
    inner: Arc<ResolverInner>,
    node: &'a Node,
) -> BoxFuture<'a, Result<Value, SkeinError>> {
    async move {
        match node {
            Node::Pure(value) => Ok(value.clone()),
            Node::ByName(key) => demand(&inner, key).await,
            Node::Map { source, f } => {
                let value = eval_node(Arc::clone(&inner), source).await?;
                f(value)
            }
            Node::Zip(children) => {
                let branches = children
                    .iter()
                    .map(|child| eval_node(Arc::clone(&inner), child));
                let outcomes = join_all(branches).await;
                let values = gather(outcomes, None)?;
                Ok(Arc::new(values) as Value)
            }
            Node::Apply {
                function,
                target,
                call,
            } => {
                let (function_outcome, target_outcome) = futures::future::join(
                    eval_node(Arc::clone(&inner), function),
                    eval_node(Arc::clone(&inner), target),
                )
                .await;
                match (function_outcome, target_outcome) {
                    (Ok(function_value), Ok(target_value)) => call(function_value, target_value),
                    (Err(failure), Ok(_)) | (Ok(_), Err(failure)) => Err(failure),
                    (Err(primary), Err(secondary)) => Err(SkeinError::AggregateFailure {
                        primary: Box::new(primary),
                        secondary: vec![secondary],
                    }),
                }
            }
        }
    }
    .boxed()
}
