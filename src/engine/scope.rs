//! Variable scopes
//!
//! A [`Scope`] is a handle: cloning it shares the table. The session mutates
//! the caller's tables in place and hands the inner one back at the end.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;

/// Shared, insertion-ordered name table
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<IndexMap<String, Value>>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Bind `name`, returning the previous binding
    pub fn insert(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.0.borrow_mut().insert(name.into(), value.into())
    }

    pub fn remove(
        &self,
        name: &str,
    ) -> Option<Value> {
        self.0.borrow_mut().shift_remove(name)
    }

    /// Bound names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// True when both handles refer to the same table
    pub fn ptr_eq(
        &self,
        other: &Scope,
    ) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}

/// Global-like and local-like tables evaluated code runs against
#[derive(Clone, Debug)]
pub struct ScopePair {
    pub outer: Scope,
    pub inner: Scope,
}

impl ScopePair {
    pub fn new(
        outer: Scope,
        inner: Scope,
    ) -> Self {
        Self { outer, inner }
    }

    /// One table serving as both outer and inner
    pub fn shared(scope: Scope) -> Self {
        Self {
            outer: scope.clone(),
            inner: scope,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.outer.ptr_eq(&self.inner)
    }

    /// Lookup chain, innermost first
    pub fn chain(&self) -> Vec<Scope> {
        if self.is_shared() {
            vec![self.inner.clone()]
        } else {
            vec![self.inner.clone(), self.outer.clone()]
        }
    }
}
