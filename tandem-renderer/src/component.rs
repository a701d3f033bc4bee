//! Component definitions and live instances.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tandem_core::{FromValue, Router, Store, Value};
use tandem_sfc::Schema;

use crate::error::RenderError;

/// An event handler. Receives the instance it was called on and the call arguments.
pub type Handler = Rc<dyn Fn(&Instance, &[Value])>;

type EmitCallback = Rc<dyn Fn(&[Value])>;

/// Argument `index` of a handler call as a script type.
pub fn handler_arg<T: FromValue>(args: &[Value], index: usize) -> Option<T> {
    let typed = args.get(index).and_then(T::from_value);
    if typed.is_none() {
        tracing::warn!(index, arg = ?args.get(index), "handler argument does not convert");
    }
    typed
}

/// Everything needed to instantiate a component: its sources, the initial value of
/// every field and the handlers its template may call.
#[derive(Clone)]
pub struct ComponentDef {
    name: String,
    template: String,
    style: String,
    fields: Vec<(String, Value)>,
    routes: BTreeMap<String, Vec<String>>,
    methods: BTreeMap<String, Handler>,
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("routes", &self.routes)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            style: String::new(),
            fields: Vec::new(),
            routes: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn style(mut self, css: impl Into<String>) -> Self {
        self.style = css.into();
        self
    }

    /// Declare a field and its initial value. Redeclaring replaces the value.
    pub fn field(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        let name = name.into();
        let initial = initial.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = initial,
            None => self.fields.push((name, initial)),
        }
        self
    }

    /// Declare a router field: a component-valued field limited to `options`.
    pub fn route(mut self, field: &str, options: &[&str], initial: &str) -> Self {
        let initial = if options.contains(&initial) {
            initial
        } else {
            options.first().copied().unwrap_or_default()
        };
        self.routes.insert(
            field.to_string(),
            options.iter().map(|o| o.to_string()).collect(),
        );
        self.field(
            field,
            Value::Component(tandem_core::ComponentRef::new(initial)),
        )
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&Instance, &[Value]) + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn css(&self) -> &str {
        &self.style
    }

    pub fn initial(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn route_options(&self, field: &str) -> Option<&[String]> {
        self.routes.get(field).map(Vec::as_slice)
    }

    pub fn schema(&self) -> Schema {
        let mut schema = Schema::new(&self.name);
        for (name, value) in &self.fields {
            schema = match self.routes.get(name) {
                Some(options) => schema.route(name, options.iter().cloned()),
                None => schema.field(name, value.kind()),
            };
        }
        for m in self.methods.keys() {
            schema = schema.method(m);
        }
        schema
    }
}

/// Handle returned by [`Instance::on_emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitId(u64);

struct InstanceInner {
    def: Rc<ComponentDef>,
    stores: BTreeMap<String, Rc<Store<Value>>>,
    routers: BTreeMap<String, Router>,
    children: RefCell<BTreeMap<String, Instance>>,
    emit_listeners: RefCell<Vec<(EmitId, String, EmitCallback)>>,
    next_emit: Cell<u64>,
}

/// A live component: one store per field, one router per router field, and the
/// child instances created for its nested component tags.
///
/// Cloning shares the instance.
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("component", &self.0.def.name)
            .field("children", &self.0.children.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Instance {
    pub fn new(def: Rc<ComponentDef>) -> Self {
        let mut stores = BTreeMap::new();
        let mut routers = BTreeMap::new();
        for (name, initial) in &def.fields {
            match def.routes.get(name) {
                Some(options) => {
                    let current = initial
                        .as_component()
                        .map(|c| c.name().to_string())
                        .unwrap_or_default();
                    let router = Router::new(options.iter().cloned(), &current);
                    stores.insert(name.clone(), router.store().clone());
                    routers.insert(name.clone(), router);
                }
                None => {
                    stores.insert(name.clone(), Rc::new(Store::new(initial.clone())));
                }
            }
        }
        Self(Rc::new(InstanceInner {
            def,
            stores,
            routers,
            children: RefCell::new(BTreeMap::new()),
            emit_listeners: RefCell::new(Vec::new()),
            next_emit: Cell::new(0),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.def.name
    }

    pub fn def(&self) -> &Rc<ComponentDef> {
        &self.0.def
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn store(&self, field: &str) -> Option<Rc<Store<Value>>> {
        self.0.stores.get(field).cloned()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.stores.get(field).map(|s| s.get())
    }

    fn field_store(&self, field: &str) -> Result<&Rc<Store<Value>>, RenderError> {
        self.0
            .stores
            .get(field)
            .ok_or_else(|| RenderError::UnknownField {
                component: self.name().to_string(),
                field: field.to_string(),
            })
    }

    /// Replace a field's value. Router fields only accept one of their options.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<(), RenderError> {
        let value = value.into();
        if let Some(router) = self.0.routers.get(field) {
            let page = value.to_string();
            router.navigate(&page)?;
            return Ok(());
        }
        self.field_store(field)?.set(value);
        Ok(())
    }

    /// A field read as a script type. `None`, with a warning, when the stored
    /// value does not convert.
    pub fn field_as<T: FromValue>(&self, field: &str) -> Option<T> {
        let value = self.get(field);
        let typed = value.as_ref().and_then(T::from_value);
        if typed.is_none() {
            tracing::warn!(component = self.name(), field, ?value, "field does not convert");
        }
        typed
    }

    /// [`Instance::set`] for generated handlers, which have nowhere to return
    /// an error to.
    pub fn store_field(&self, field: &str, value: impl Into<Value>) {
        if let Err(err) = self.set(field, value) {
            tracing::warn!(component = self.name(), field, %err, "field not stored");
        }
    }

    pub fn update(&self, field: &str, f: impl FnOnce(&mut Value)) -> Result<(), RenderError> {
        let mut value = self.field_store(field)?.get();
        f(&mut value);
        self.set(field, value)
    }

    pub fn router(&self, field: &str) -> Option<&Router> {
        self.0.routers.get(field)
    }

    pub fn routers(&self) -> impl Iterator<Item = (&str, &Router)> {
        self.0.routers.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn navigate(&self, field: &str, page: &str) -> Result<(), RenderError> {
        let router = self.0.routers.get(field).ok_or_else(|| RenderError::NotARoute {
            component: self.name().to_string(),
            field: field.to_string(),
        })?;
        router.navigate(page)?;
        Ok(())
    }

    /// Run a handler declared with [`ComponentDef::method`].
    pub fn call(&self, method: &str, args: &[Value]) -> Result<(), RenderError> {
        let handler = self
            .0
            .def
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| RenderError::UnknownMethod {
                component: self.name().to_string(),
                method: method.to_string(),
            })?;
        tracing::debug!(component = self.name(), method, "call");
        handler(self, args);
        Ok(())
    }

    /// Notify the parent's `@event` handlers. Returns how many ran.
    pub fn emit(&self, event: &str, payload: &[Value]) -> usize {
        let listeners: Vec<EmitCallback> = self
            .0
            .emit_listeners
            .borrow()
            .iter()
            .filter(|(_, e, _)| e == event)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in &listeners {
            cb(payload);
        }
        listeners.len()
    }

    pub fn on_emit(&self, event: &str, callback: impl Fn(&[Value]) + 'static) -> EmitId {
        let id = EmitId(self.0.next_emit.get());
        self.0.next_emit.set(id.0 + 1);
        self.0
            .emit_listeners
            .borrow_mut()
            .push((id, event.to_string(), Rc::new(callback)));
        id
    }

    pub fn off_emit(&self, id: EmitId) -> bool {
        let mut listeners = self.0.emit_listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(l, _, _)| *l != id);
        listeners.len() != before
    }

    /// The child created for the component tag with marker `key`.
    pub fn child(&self, key: &str) -> Option<Instance> {
        self.0.children.borrow().get(key).cloned()
    }

    pub fn child_keys(&self) -> Vec<String> {
        self.0.children.borrow().keys().cloned().collect()
    }

    /// Reuse the child at `key` when it is an instance of `def`, otherwise create one
    /// and run `init` on it before it is stored.
    pub(crate) fn child_or_insert(
        &self,
        key: &str,
        def: &Rc<ComponentDef>,
        init: impl FnOnce(&Instance),
    ) -> Instance {
        if let Some(existing) = self.child(key) {
            if existing.name() == def.name() {
                return existing;
            }
        }
        let child = Instance::new(def.clone());
        init(&child);
        self.0
            .children
            .borrow_mut()
            .insert(key.to_string(), child.clone());
        child
    }

    pub(crate) fn drop_child(&self, key: &str) {
        self.0.children.borrow_mut().remove(key);
    }
}
