use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// The single flat scope of one evaluator.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: FxHashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Inserts or overwrites `name`, returning the value now bound to it.
    pub fn assign(&mut self, name: &str, value: Value) -> &Value {
        match self.variables.entry(name.to_string()) {
            Entry::Occupied(o) => {
                let slot = o.into_mut();
                *slot = value;
                slot
            }
            Entry::Vacant(v) => v.insert(value),
        }
    }
}
