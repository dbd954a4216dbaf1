//! Injected - lazy, composable dependency expressions
//!
//! An `Injected<T>` is "a T obtainable once its dependencies are resolved".
//! Combinators build an immutable expression tree; nothing executes until a
//! [`Resolver`](crate::resolver::Resolver) evaluates it. The typed facade
//! erases closures into the untyped [`Node`] tree so the resolver never
//! needs to know `T`; downcasting stays inside the combinators.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::SkeinError;
use crate::key::BindingKey;
use crate::provider::Value;

/// Erased map step: resolved input value to output value
pub(crate) type MapFn = Arc<dyn Fn(Value) -> Result<Value, SkeinError> + Send + Sync>;

/// Erased application: (resolved function, resolved argument) to output
pub(crate) type ApplyFn = Arc<dyn Fn(Value, Value) -> Result<Value, SkeinError> + Send + Sync>;

/// Untyped expression tree evaluated by the resolver
///
/// Nodes are acyclic by construction: children are owned, so no node can
/// transitively contain itself.
#[derive(Clone)]
pub(crate) enum Node {
    /// Already-resolved value; no dependencies
    Pure(Value),
    /// Reference to a design-resolved key
    ByName(BindingKey),
    /// Functor map over one child
    Map { source: Box<Node>, f: MapFn },
    /// N independent children; evaluates to `Vec<Value>`, order preserved
    Zip(Vec<Node>),
    /// Both children resolve, then the function value is applied
    Apply {
        function: Box<Node>,
        target: Box<Node>,
        call: ApplyFn,
    },
}

impl Node {
    /// Union of keys referenced by this expression, first-seen order, deduped
    pub(crate) fn keys(&self) -> Vec<BindingKey> {
        let mut out = Vec::new();
        self.collect_keys(&mut out);
        out
    }

    fn collect_keys(&self, out: &mut Vec<BindingKey>) {
        match self {
            Node::Pure(_) => {}
            Node::ByName(key) => {
                if !out.contains(key) {
                    out.push(key.clone());
                }
            }
            Node::Map { source, .. } => source.collect_keys(out),
            Node::Zip(children) => {
                for child in children {
                    child.collect_keys(out);
                }
            }
            Node::Apply {
                function, target, ..
            } => {
                function.collect_keys(out);
                target.collect_keys(out);
            }
        }
    }
}

fn downcast<T: Send + Sync + 'static>(
    value: Value,
    context: &'static str,
) -> Result<Arc<T>, SkeinError> {
    value
        .downcast::<T>()
        .map_err(|_| SkeinError::type_mismatch::<T>(context))
}

/// Lazy expression producing a `T` once dependencies are resolved
///
/// Building an `Injected` never runs a provider; that separation between
/// construction and execution is the central invariant of the crate.
pub struct Injected<T> {
    node: Node,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Injected<T> {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// Keys this expression (transitively through its tree) references
    pub fn keys(&self) -> Vec<BindingKey> {
        self.node.keys()
    }

    /// Reference to a design-resolved key
    pub fn by_name(key: impl Into<BindingKey>) -> Self {
        Self::from_node(Node::ByName(key.into()))
    }
}

impl<T: Send + Sync + 'static> Injected<T> {
    /// Lift a plain value; depends on nothing
    pub fn pure(value: T) -> Self {
        Self::from_node(Node::Pure(Arc::new(value)))
    }

    /// Apply `f` to the resolved value; same dependency set as `self`
    pub fn map<U, F>(self, f: F) -> Injected<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let step: MapFn = Arc::new(move |value| {
            let input = downcast::<T>(value, "map input")?;
            Ok(Arc::new(f(&input)) as Value)
        });
        Injected::from_node(Node::Map {
            source: Box::new(self.node),
            f: step,
        })
    }

    /// Apply a dependency-obtained function to `self`'s resolved value
    ///
    /// Both sides resolve first (concurrently where independent); the
    /// dependency set is the union of both.
    pub fn apply<U, F>(self, function: Injected<F>) -> Injected<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let call: ApplyFn = Arc::new(move |function_value, target_value| {
            let f = downcast::<F>(function_value, "applied function")?;
            let input = downcast::<T>(target_value, "apply input")?;
            Ok(Arc::new(f(&input)) as Value)
        });
        Injected::from_node(Node::Apply {
            function: Box::new(function.node),
            target: Box::new(self.node),
            call,
        })
    }
}

impl<A: Clone + Send + Sync + 'static> Injected<A> {
    /// Combine two independent expressions into a pair
    ///
    /// The dependency set is the union; branch evaluation order is
    /// unspecified and may be concurrent.
    pub fn zip<B>(self, other: Injected<B>) -> Injected<(A, B)>
    where
        B: Clone + Send + Sync + 'static,
    {
        let step: MapFn = Arc::new(move |value| {
            let parts = downcast::<Vec<Value>>(value, "zip parts")?;
            let a = downcast::<A>(parts[0].clone(), "zip element 0")?;
            let b = downcast::<B>(parts[1].clone(), "zip element 1")?;
            Ok(Arc::new(((*a).clone(), (*b).clone())) as Value)
        });
        Injected::from_node(Node::Map {
            source: Box::new(Node::Zip(vec![self.node, other.node])),
            f: step,
        })
    }

    /// Combine three independent expressions into a triple
    pub fn zip3<B, C>(self, second: Injected<B>, third: Injected<C>) -> Injected<(A, B, C)>
    where
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
    {
        let step: MapFn = Arc::new(move |value| {
            let parts = downcast::<Vec<Value>>(value, "zip parts")?;
            let a = downcast::<A>(parts[0].clone(), "zip element 0")?;
            let b = downcast::<B>(parts[1].clone(), "zip element 1")?;
            let c = downcast::<C>(parts[2].clone(), "zip element 2")?;
            Ok(Arc::new(((*a).clone(), (*b).clone(), (*c).clone())) as Value)
        });
        Injected::from_node(Node::Map {
            source: Box::new(Node::Zip(vec![self.node, second.node, third.node])),
            f: step,
        })
    }

    /// Combine N same-typed expressions into a `Vec`, order preserved
    pub fn zip_all(items: impl IntoIterator<Item = Injected<A>>) -> Injected<Vec<A>> {
        let nodes: Vec<Node> = items.into_iter().map(|i| i.node).collect();
        let step: MapFn = Arc::new(move |value| {
            let parts = downcast::<Vec<Value>>(value, "zip parts")?;
            let mut out = Vec::with_capacity(parts.len());
            for (index, part) in parts.iter().enumerate() {
                let element = part.clone().downcast::<A>().map_err(|_| {
                    SkeinError::type_mismatch::<A>(format!("zip element {}", index))
                })?;
                out.push((*element).clone());
            }
            Ok(Arc::new(out) as Value)
        });
        Injected::from_node(Node::Map {
            source: Box::new(Node::Zip(nodes)),
            f: step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_has_no_keys() {
        assert!(Injected::pure(1i64).keys().is_empty());
    }

    #[test]
    fn by_name_references_one_key() {
        let injected = Injected::<i64>::by_name("a");
        assert_eq!(injected.keys(), vec![BindingKey::new("a")]);
    }

    #[test]
    fn map_preserves_dependency_set() {
        let injected = Injected::<i64>::by_name("a").map(|x| x + 1);
        assert_eq!(injected.keys(), vec![BindingKey::new("a")]);
    }

    #[test]
    fn zip_unions_and_dedupes_keys() {
        let left = Injected::<i64>::by_name("a");
        let right = Injected::<i64>::by_name("b").zip(Injected::<i64>::by_name("a"));
        let combined = left.zip(right);

        assert_eq!(
            combined.keys(),
            vec![BindingKey::new("a"), BindingKey::new("b")]
        );
    }

    #[test]
    fn apply_unions_function_and_target_keys() {
        let target = Injected::<i64>::by_name("value");
        let function = Injected::<fn(&i64) -> i64>::by_name("doubler");
        let applied: Injected<i64> = target.apply(function);

        assert_eq!(
            applied.keys(),
            vec![BindingKey::new("doubler"), BindingKey::new("value")]
        );
    }

    #[test]
    fn zip_all_collects_every_branch_key() {
        let items = (0..3).map(|i| Injected::<i64>::by_name(format!("k{}", i)));
        let all = Injected::zip_all(items);
        assert_eq!(all.keys().len(), 3);
    }

    #[test]
    fn building_performs_no_work() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let _mapped = Injected::pure(1i64).map(|x| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            x + 1
        });

        // The closure is stored, not invoked; only a resolver runs it.
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }
}
