//! String interning for recurring binding names
//!
//! Binding keys are compared and hashed constantly during graph walks, so
//! each unique name is stored once and shared as `Arc<str>`. Cloning a key
//! is then a refcount bump, never a string copy.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Global name interner (thread-safe, lock-free)
static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner using DashMap
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
        }
    }

    /// Intern a string, returning a shared `Arc<str>`
    ///
    /// If the string was already interned, returns the existing Arc.
    pub fn intern(&self, s: &str) -> Arc<str> {
        let key: Arc<str> = Arc::from(s);

        if let Some(existing) = self.strings.get(&key) {
            return Arc::clone(existing.key());
        }

        self.strings.insert(Arc::clone(&key), ());
        key
    }

    /// Number of interned strings
    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a binding name using the global interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}
