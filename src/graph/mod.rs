//! Dependency graph - transitive closure and cycle detection
//!
//! Built per resolution request, before anything executes. Collection walks
//! the design from the root keys and fails fast on a key with no binding;
//! cycle checking runs a visiting-set DFS over the collected closure so a
//! cyclic design never invokes a provider.

use rustc_hash::FxHashMap;

use crate::design::Design;
use crate::error::SkeinError;
use crate::key::BindingKey;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Dependency edges for every key transitively required by one request
#[derive(Debug)]
pub struct DependencyGraph {
    /// key -> keys its provider declares
    edges: FxHashMap<BindingKey, Vec<BindingKey>>,
    roots: Vec<BindingKey>,
}

impl DependencyGraph {
    /// Collect the transitive closure of `roots` through `design`
    ///
    /// BFS with parent tracking, so a missing key reports the chain of keys
    /// that led to requesting it (innermost first).
    pub fn collect(design: &Design, roots: &[BindingKey]) -> Result<Self, SkeinError> {
        let mut edges: FxHashMap<BindingKey, Vec<BindingKey>> = FxHashMap::default();
        let mut parents: FxHashMap<BindingKey, BindingKey> = FxHashMap::default();
        let mut queue: Vec<BindingKey> = roots.to_vec();

        while let Some(key) = queue.pop() {
            if edges.contains_key(&key) {
                continue;
            }
            let provider = design.get(&key).ok_or_else(|| SkeinError::MissingBinding {
                key: key.clone(),
                requested_by: requested_chain(&parents, &key),
            })?;

            let deps = provider.deps().to_vec();
            for dep in &deps {
                if !edges.contains_key(dep) {
                    parents.entry(dep.clone()).or_insert_with(|| key.clone());
                    queue.push(dep.clone());
                }
            }
            edges.insert(key, deps);
        }

        Ok(Self {
            edges,
            roots: roots.to_vec(),
        })
    }

    /// Number of keys in the closure
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Fail with the ordered cycle if any key can reach itself
    pub fn check_cycles(&self) -> Result<(), SkeinError> {
        let mut marks: FxHashMap<&BindingKey, Mark> = FxHashMap::default();

        for root in &self.roots {
            self.visit(root, &mut marks)?;
        }
        Ok(())
    }

    /// DFS with an explicit work stack, so chain depth never hits the call
    /// stack. Each frame is `(key, next dep index)`; the frame stack itself
    /// is the current path.
    fn visit<'a>(
        &'a self,
        root: &'a BindingKey,
        marks: &mut FxHashMap<&'a BindingKey, Mark>,
    ) -> Result<(), SkeinError> {
        if marks.contains_key(root) {
            return Ok(());
        }
        let mut stack: Vec<(&'a BindingKey, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::Visiting);

        while let Some(frame) = stack.last_mut() {
            let key = frame.0;
            let index = frame.1;
            let deps = self.edges.get(key).map(Vec::as_slice).unwrap_or(&[]);

            let Some(dep) = deps.get(index) else {
                marks.insert(key, Mark::Done);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks.get(dep) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|(k, _)| *k == dep).unwrap_or(0);
                    return Err(SkeinError::CycleDetected {
                        cycle: stack[start..].iter().map(|(k, _)| (*k).clone()).collect(),
                    });
                }
                None => {
                    marks.insert(dep, Mark::Visiting);
                    stack.push((dep, 0));
                }
            }
        }
        Ok(())
    }
}

/// Walk parent pointers back from `key` to a root, innermost first
fn requested_chain(
    parents: &FxHashMap<BindingKey, BindingKey>,
    key: &BindingKey,
) -> Vec<BindingKey> {
    let mut chain = Vec::new();
    let mut current = key;
    while let Some(parent) = parents.get(current) {
        chain.push(parent.clone());
        current = parent;
    }
    chain
}
