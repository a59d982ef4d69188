use std::collections::HashMap;

use crate::ir::Function;
use crate::types::{Field, Ty};

/// Frame-offset table for the function currently being compiled: every
/// visible name mapped to its type and byte position, plus the declared
/// return type for checking `return` forms.
#[derive(Clone)]
pub(crate) struct LocalContext {
    vars: HashMap<String, Field>,
    return_type: Ty,
}

impl LocalContext {
    pub(crate) fn for_function(func: &Function) -> LocalContext {
        let mut vars = HashMap::new();
        for param in &func.params {
            vars.insert(param.name.clone(), param.clone());
        }
        LocalContext {
            vars,
            return_type: func.return_type.clone(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Field> {
        self.vars.get(name)
    }

    pub(crate) fn add(&mut self, field: Field) {
        self.vars.insert(field.name.clone(), field);
    }

    pub(crate) fn return_type(&self) -> &Ty {
        &self.return_type
    }
}
