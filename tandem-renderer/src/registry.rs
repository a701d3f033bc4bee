use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tandem_sfc::{Catalog, TemplateIR, prepare};

use crate::component::{ComponentDef, Instance};
use crate::error::RenderError;

/// Every component an application can render, by name, plus the parsed form of
/// each (template, slot) pair seen so far.
#[derive(Debug, Default)]
pub struct Registry {
    defs: BTreeMap<String, Rc<ComponentDef>>,
    parsed: RefCell<HashMap<(String, String), Rc<TemplateIR>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ComponentDef) -> &mut Self {
        let name = def.name().to_string();
        self.parsed.borrow_mut().retain(|(n, _), _| *n != name);
        self.defs.insert(name, Rc::new(def));
        self
    }

    pub fn with(mut self, def: ComponentDef) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, name: &str) -> Result<Rc<ComponentDef>, RenderError> {
        self.defs
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownComponent {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn instantiate(&self, name: &str) -> Result<Instance, RenderError> {
        Ok(Instance::new(self.get(name)?))
    }

    /// The IR of `name` with `slot` substituted for its `<slot/>`, parsed once.
    pub fn template(&self, name: &str, slot: &str) -> Result<Rc<TemplateIR>, RenderError> {
        let key = (name.to_string(), slot.to_string());
        if let Some(ir) = self.parsed.borrow().get(&key) {
            return Ok(ir.clone());
        }
        let def = self.get(name)?;
        let ir = Rc::new(prepare(def.template(), slot, &def.schema()));
        for d in &ir.diagnostics {
            tracing::debug!(component = name, "{d}");
        }
        self.parsed.borrow_mut().insert(key, ir.clone());
        Ok(ir)
    }

    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::new();
        for def in self.defs.values() {
            catalog.insert(def.schema(), def.template());
        }
        catalog
    }

    /// Check every template, and every slot passed to a child, against the
    /// registered components.
    pub fn validate(&self) -> Result<(), RenderError> {
        self.catalog().validate_all()?;
        Ok(())
    }

    /// Style blocks of all components, in name order.
    pub fn styles(&self) -> String {
        let mut out = String::new();
        for def in self.defs.values() {
            let css = def.css().trim();
            if css.is_empty() {
                continue;
            }
            out.push_str(&format!("/* {} */\n{css}\n", def.name()));
        }
        out
    }
}
