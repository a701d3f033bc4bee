use std::rc::Rc;

use tandem_core::{Store, Value};
use tandem_sfc::{Arg, Lookup};

use crate::component::Instance;

/// Names visible to a template fragment: the component's fields, shadowed by the
/// locals of enclosing `each` blocks.
#[derive(Clone, Debug)]
pub(crate) struct Scope {
    pub instance: Instance,
    locals: Rc<Vec<(String, Value)>>,
}

impl Scope {
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            locals: Rc::new(Vec::new()),
        }
    }

    pub fn with_locals(&self, locals: impl IntoIterator<Item = (String, Value)>) -> Scope {
        let mut all = (*self.locals).clone();
        all.extend(locals);
        Scope {
            instance: self.instance.clone(),
            locals: Rc::new(all),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|(n, _)| n == name)
    }

    /// The store behind `name`, unless a local shadows it.
    pub fn store(&self, name: &str) -> Option<Rc<Store<Value>>> {
        if self.is_local(name) {
            None
        } else {
            self.instance.store(name)
        }
    }

    pub fn value(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or_else(|| Value::Str(String::new()))
    }

    pub fn args(&self, args: &[Arg]) -> Vec<Value> {
        args.iter()
            .map(|a| match a {
                Arg::Literal(v) => v.clone(),
                Arg::Name(n) => self.value(n),
            })
            .collect()
    }
}

impl Lookup for Scope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.instance.get(name))
    }
}
