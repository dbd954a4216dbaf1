//! Binding keys - the identity of a dependency
//!
//! A key is a name plus an optional type tag. Two untagged keys with the
//! same name address the same binding; tagging a key with a Rust type keeps
//! same-named bindings of different types apart.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::util::intern;

/// Compile-time type marker attached to a [`BindingKey`]
///
/// Pairs the `TypeId` (identity) with the type name (display only).
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identity of one binding: interned name + optional type tag
///
/// Equality and hashing use `(name, tag)`. Construction interns the name so
/// key clones during graph walks are refcount bumps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    name: Arc<str>,
    tag: Option<TypeTag>,
}

impl BindingKey {
    /// Untagged key: addressed by name alone
    pub fn new(name: &str) -> Self {
        Self {
            name: intern(name),
            tag: None,
        }
    }

    /// Key tagged with a Rust type
    pub fn typed<T: 'static>(name: &str) -> Self {
        Self {
            name: intern(name),
            tag: Some(TypeTag::of::<T>()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&TypeTag> {
        self.tag.as_ref()
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.name, tag.name()),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for BindingKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BindingKey {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&BindingKey> for BindingKey {
    fn from(key: &BindingKey) -> Self {
        key.clone()
    }
}
