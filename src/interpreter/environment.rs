use super::value::Value;
use compact_str::{CompactString, ToCompactString};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// A chained lexical scope.
///
/// Cloning an `Environment` clones the handle, not the bindings: a generator
/// instance and its caller both hold handles into the same chain. The parent
/// pointer is rebindable (`chain_to`) because a saved scope may be
/// re-attached under a different caller scope on every resumption.
#[derive(Debug, Clone)]
pub struct Environment {
    inner: Arc<Mutex<EnvironmentImpl>>,
}

#[derive(Debug)]
struct EnvironmentImpl {
    label: CompactString,
    values: HashMap<CompactString, Value>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn new(label: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl {
                label: label.to_compact_string(),
                values: HashMap::new(),
                parent: None,
            })),
        }
    }

    pub fn with_bindings(
        label: &str,
        bindings: impl IntoIterator<Item = (CompactString, Value)>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl {
                label: label.to_compact_string(),
                values: bindings.into_iter().collect(),
                parent: None,
            })),
        }
    }

    pub fn new_scope(&self, label: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl {
                label: label.to_compact_string(),
                values: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn label(&self) -> CompactString {
        self.inner.lock().unwrap().label.clone()
    }

    /// Rebinds the enclosing-scope pointer. `None` detaches the chain.
    pub fn chain_to(&self, parent: Option<Environment>) {
        self.inner.lock().unwrap().parent = parent;
    }

    /// Creates/overwrites a binding in this scope only.
    pub fn define(&self, name: &str, value: Value) {
        self.inner
            .lock()
            .unwrap()
            .values
            .insert(name.to_compact_string(), value);
    }

    /// Walks outward through the chain; `None` if the name is unbound
    /// everywhere.
    pub fn read(&self, name: &str) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        if let Some(value) = inner.values.get(name) {
            Some(value.clone())
        } else if let Some(parent) = inner.parent.clone() {
            drop(inner);
            parent.read(name)
        } else {
            None
        }
    }

    /// Mutates the nearest scope already containing the name; `Err` if no
    /// scope in the chain does.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.values.contains_key(name) {
            inner.values.insert(name.to_compact_string(), value);
            Ok(())
        } else if let Some(parent) = inner.parent.clone() {
            drop(inner);
            parent.assign(name, value)
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_always_writes_locally() {
        let outer = Environment::new("outer");
        outer.define("x", Value::Number(1.0));
        let inner = outer.new_scope("inner");
        inner.define("x", Value::Number(2.0));

        assert_eq!(inner.read("x"), Some(Value::Number(2.0)));
        assert_eq!(outer.read("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_walks_to_the_nearest_binding() {
        let outer = Environment::new("outer");
        outer.define("x", Value::Number(1.0));
        let inner = outer.new_scope("inner");

        inner.assign("x", Value::Number(5.0)).expect("x is bound");
        assert_eq!(outer.read("x"), Some(Value::Number(5.0)));
    }

    #[test]
    fn assign_to_unbound_name_fails() {
        let env = Environment::new("global");
        assert!(env.assign("missing", Value::Nil).is_err());
    }

    #[test]
    fn chain_to_rebinds_the_parent_scope() {
        let saved = Environment::new("saved");
        saved.define("local", Value::Number(7.0));

        let first_caller = Environment::new("first");
        first_caller.define("ambient", Value::Number(1.0));
        saved.chain_to(Some(first_caller));
        assert_eq!(saved.read("ambient"), Some(Value::Number(1.0)));

        let second_caller = Environment::new("second");
        second_caller.define("ambient", Value::Number(2.0));
        saved.chain_to(Some(second_caller));
        assert_eq!(saved.read("ambient"), Some(Value::Number(2.0)));
        assert_eq!(saved.read("local"), Some(Value::Number(7.0)));
    }
}
