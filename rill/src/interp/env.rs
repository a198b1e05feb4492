//! Lexical environments.
//!
//! Environments form a parent chain shared through `Rc<RefCell<..>>`:
//! blocks and calls get child environments, closures keep the chain they
//! captured alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: EnvRef) -> Self {
        Self {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look `name` up through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.borrow().get(name)),
        }
    }

    /// Look `name` up in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    /// Overwrite `name` in the frame that defines it. Returns false when the
    /// name is unbound anywhere in the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.borrow().contains(name))
    }
}

/// A fresh child environment of `parent`.
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new().into_ref();
        env.borrow_mut().define("x".into(), Value::Int(1));
        assert_eq!(env.borrow().get("x"), Some(Value::Int(1)));
        assert_eq!(env.borrow().get("y"), None);
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().define("x".into(), Value::Int(1));
        let child = child_env(&parent);
        assert_eq!(child.borrow().get("x"), Some(Value::Int(1)));
        assert!(child.borrow().get_local("x").is_none());
        assert!(child.borrow().contains("x"));
    }

    #[test]
    fn child_shadows_without_touching_parent() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().define("x".into(), Value::Int(1));
        let child = child_env(&parent);
        child.borrow_mut().define("x".into(), Value::Int(2));
        assert_eq!(child.borrow().get("x"), Some(Value::Int(2)));
        assert_eq!(parent.borrow().get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_writes_in_the_defining_frame() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().define("x".into(), Value::Int(1));
        let child = child_env(&parent);
        assert!(child.borrow_mut().assign("x", Value::Int(5)));
        assert_eq!(parent.borrow().get("x"), Some(Value::Int(5)));
        assert!(child.borrow().get_local("x").is_none());
    }

    #[test]
    fn assign_fails_for_unbound_names() {
        let env = Environment::new().into_ref();
        assert!(!env.borrow_mut().assign("missing", Value::Null));
    }
}
