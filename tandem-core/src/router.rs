// tandem-core/src/router.rs
use std::rc::Rc;

use thiserror::Error;

use crate::store::Store;
use crate::value::{ComponentRef, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown route `{name}`; available: {}", .available.join(", "))]
    UnknownRoute { name: String, available: Vec<String> },
}

/// A store holding the current page component, plus every page it may hold.
///
/// The option list is static so a server pass can pre-render each page.
#[derive(Debug, Clone)]
pub struct Router {
    store: Rc<Store<Value>>,
    options: Vec<ComponentRef>,
}

impl Router {
    /// `initial` falls back to the first option when it is not one of `options`.
    pub fn new<I, S>(options: I, initial: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<ComponentRef> = options.into_iter().map(ComponentRef::new).collect();
        let start = options
            .iter()
            .find(|o| o.name() == initial)
            .or_else(|| options.first())
            .cloned()
            .unwrap_or_default();
        Self {
            store: Rc::new(Store::new(Value::Component(start))),
            options,
        }
    }

    pub fn options(&self) -> &[ComponentRef] {
        &self.options
    }

    pub fn current(&self) -> ComponentRef {
        self.store
            .with(|v| v.as_component().cloned())
            .unwrap_or_default()
    }

    pub fn navigate(&self, name: &str) -> Result<(), RouteError> {
        let Some(target) = self.options.iter().find(|o| o.name() == name) else {
            return Err(RouteError::UnknownRoute {
                name: name.to_string(),
                available: self.options.iter().map(|o| o.0.clone()).collect(),
            });
        };
        if self.current() != *target {
            self.store.set(Value::Component(target.clone()));
        }
        Ok(())
    }

    /// The underlying store, shared with the owning component's field table.
    pub fn store(&self) -> &Rc<Store<Value>> {
        &self.store
    }
}
