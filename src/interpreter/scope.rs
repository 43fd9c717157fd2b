use std::{cell::RefCell, collections::hash_map::Entry, rc::Rc};

use rustc_hash::FxHashMap;

use super::{ExecutionError, Value};

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

/// One lexical scope. Scopes chain to their parent; the top-level scope of
/// an execution has no parent, which is what isolates a run from the
/// embedding program.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<String, Binding>,
    parent: Option<Rc<RefCell<Scope>>>,
}

impl Scope {
    pub fn boxed(parent: Option<Rc<RefCell<Scope>>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            bindings: FxHashMap::default(),
            parent,
        }))
    }

    pub fn declare(
        &mut self,
        name: String,
        value: Value,
        mutable: bool,
    ) -> Result<(), ExecutionError> {
        match self.bindings.entry(name) {
            Entry::Occupied(o) => Err(ExecutionError::Redeclaration(o.key().clone())),
            Entry::Vacant(v) => {
                v.insert(Binding { value, mutable });
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.bindings.get(name) {
            Some(binding.value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    pub fn assign(&mut self, name: &str, value: &Value) -> Result<Value, ExecutionError> {
        if let Some(binding) = self.bindings.get_mut(name) {
            if !binding.mutable {
                return Err(ExecutionError::AssignmentToConstant(name.to_string()));
            }
            binding.value = value.clone();
            return Ok(binding.value.clone());
        }

        if let Some(parent) = &self.parent {
            return parent.borrow_mut().assign(name, value);
        }

        Err(ExecutionError::UndeclaredVariable(name.to_string()))
    }
}
