//! Checks a parsed template against the component's declared surface.

use std::collections::{BTreeMap, HashSet};

use tandem_core::ValueKind;
use thiserror::Error;

use crate::ids::number_blocks;
use crate::template_ast::{Arg, BindProperty, PropValue, Route, TemplateIR, TemplateNode};
use crate::template_parse::{expand_slot, parse_template};

/// Fields, methods and router options a component exposes to its template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub name: String,
    pub fields: BTreeMap<String, ValueKind>,
    pub methods: Vec<String>,
    /// Router options per component-valued field.
    pub routes: BTreeMap<String, Vec<String>>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    pub fn route<S: Into<String>>(mut self, field: &str, options: impl IntoIterator<Item = S>) -> Self {
        self.fields.insert(field.to_string(), ValueKind::Component);
        self.routes
            .insert(field.to_string(), options.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(&self, field: &str) -> Option<ValueKind> {
        self.fields.get(field).copied()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{component}: unknown field `{name}`; available: {available}")]
    UnknownField {
        component: String,
        name: String,
        available: String,
    },

    #[error("{component}: unknown method `{name}`; available: {available}")]
    UnknownMethod {
        component: String,
        name: String,
        available: String,
    },

    #[error("{component}: unknown component `{name}`; available: {available}")]
    UnknownComponent {
        component: String,
        name: String,
        available: String,
    },

    #[error("{component}: `<{child}>` has no prop `{prop}`; available: {available}")]
    UnknownProp {
        component: String,
        child: String,
        prop: String,
        available: String,
    },

    #[error("{component}: `{{#each {field}}}` needs a list field, `{field}` is {kind}")]
    NotAList {
        component: String,
        field: String,
        kind: ValueKind,
    },

    #[error("{component}: `bind:checked` needs a bool field, `{field}` is {kind}")]
    NotABool {
        component: String,
        field: String,
        kind: ValueKind,
    },
}

/// Every problem found in one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", one_per_line(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn one_per_line(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Rewrite interpolations of component-valued fields into route nodes, then
/// renumber so the new nodes get ids.
pub fn resolve_routes(ir: &mut TemplateIR, schema: &Schema) {
    let mut locals = Vec::new();
    rewrite(&mut ir.nodes, schema, &mut locals);
    number_blocks(&mut ir.nodes);
}

fn rewrite(nodes: &mut [TemplateNode], schema: &Schema, locals: &mut Vec<String>) {
    for node in nodes {
        match node {
            TemplateNode::Interpolation(i)
                if !locals.contains(&i.field)
                    && schema.kind(&i.field) == Some(ValueKind::Component) =>
            {
                let field = i.field.clone();
                *node = TemplateNode::Route(Route {
                    id: String::new(),
                    field,
                });
            }
            TemplateNode::Each(b) => {
                let pushed = 1 + usize::from(b.index.is_some());
                locals.push(b.item.clone());
                locals.extend(b.index.clone());
                rewrite(&mut b.body, schema, locals);
                locals.truncate(locals.len() - pushed);
                rewrite(&mut b.else_children, schema, locals);
            }
            TemplateNode::If(b) => {
                for br in &mut b.branches {
                    rewrite(&mut br.children, schema, locals);
                }
                rewrite(&mut b.else_children, schema, locals);
            }
            TemplateNode::Element(e) => rewrite(&mut e.children, schema, locals),
            _ => {}
        }
    }
}

/// Expand the slot, parse, and resolve routes: the IR both render passes walk.
pub fn prepare(template: &str, slot: &str, schema: &Schema) -> TemplateIR {
    let source = if slot.is_empty() {
        template.to_string()
    } else {
        expand_slot(template, slot)
    };
    let mut ir = parse_template(&source);
    resolve_routes(&mut ir, schema);
    ir
}

struct Checker<'a> {
    schema: &'a Schema,
    catalog: &'a Catalog,
    locals: Vec<String>,
    errors: Vec<ValidationError>,
}

impl Checker<'_> {
    fn component(&self) -> String {
        self.schema.name.clone()
    }

    fn name(&mut self, name: &str) {
        if self.locals.iter().any(|l| l == name) || self.schema.fields.contains_key(name) {
            return;
        }
        self.errors.push(ValidationError::UnknownField {
            component: self.component(),
            name: name.to_string(),
            available: list_names(self.schema.fields.keys().map(String::as_str)),
        });
    }

    fn field(&mut self, name: &str) -> Option<ValueKind> {
        let kind = self.schema.kind(name);
        if kind.is_none() {
            self.errors.push(ValidationError::UnknownField {
                component: self.component(),
                name: name.to_string(),
                available: list_names(self.schema.fields.keys().map(String::as_str)),
            });
        }
        kind
    }

    fn method(&mut self, name: &str) {
        if self.schema.has_method(name) {
            return;
        }
        self.errors.push(ValidationError::UnknownMethod {
            component: self.component(),
            name: name.to_string(),
            available: list_names(self.schema.methods.iter().map(String::as_str)),
        });
    }

    fn args(&mut self, args: &[Arg]) {
        for a in args {
            if let Arg::Name(n) = a {
                self.name(n);
            }
        }
    }

    fn nodes(&mut self, nodes: &[TemplateNode]) {
        for node in nodes {
            match node {
                TemplateNode::Text(_) => {}
                TemplateNode::Interpolation(i) => self.name(&i.field),
                TemplateNode::Route(r) => {
                    self.field(&r.field);
                }
                TemplateNode::If(b) => {
                    for br in &b.branches {
                        for n in br.condition.names() {
                            self.name(n);
                        }
                        self.nodes(&br.children);
                    }
                    self.nodes(&b.else_children);
                }
                TemplateNode::Each(b) => {
                    if let Some(kind) = self.field(&b.list) {
                        if kind != ValueKind::List {
                            self.errors.push(ValidationError::NotAList {
                                component: self.component(),
                                field: b.list.clone(),
                                kind,
                            });
                        }
                    }
                    let before = self.locals.len();
                    self.locals.push(b.item.clone());
                    self.locals.extend(b.index.clone());
                    self.nodes(&b.body);
                    self.locals.truncate(before);
                    self.nodes(&b.else_children);
                }
                TemplateNode::Element(e) => {
                    for ev in &e.events {
                        self.method(&ev.method);
                        self.args(&ev.args);
                    }
                    if let Some(bind) = &e.bind {
                        let kind = self.field(&bind.field);
                        if let (Some(kind), BindProperty::Checked) = (kind, bind.property) {
                            if kind != ValueKind::Bool {
                                self.errors.push(ValidationError::NotABool {
                                    component: self.component(),
                                    field: bind.field.clone(),
                                    kind,
                                });
                            }
                        }
                    }
                    for c in &e.classes {
                        for n in c.condition.names() {
                            self.name(n);
                        }
                    }
                    for a in &e.attr_bindings {
                        for f in a.fields() {
                            self.name(f);
                        }
                    }
                    self.nodes(&e.children);
                }
                TemplateNode::Component(c) => {
                    for ev in &c.events {
                        self.method(&ev.method);
                        self.args(&ev.args);
                    }
                    for p in &c.props {
                        if let PropValue::Field(f) = &p.value {
                            self.name(f);
                        }
                    }
                    match self.catalog.get(&c.name) {
                        None => self.errors.push(ValidationError::UnknownComponent {
                            component: self.component(),
                            name: c.name.clone(),
                            available: list_names(self.catalog.names()),
                        }),
                        Some(child) => {
                            for p in &c.props {
                                if !child.schema.fields.contains_key(&p.name) {
                                    self.errors.push(ValidationError::UnknownProp {
                                        component: self.component(),
                                        child: c.name.clone(),
                                        prop: p.name.clone(),
                                        available: list_names(
                                            child.schema.fields.keys().map(String::as_str),
                                        ),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Check one IR against `schema`. All problems are collected.
pub fn validate(ir: &TemplateIR, schema: &Schema, catalog: &Catalog) -> Result<(), ValidationErrors> {
    let mut checker = Checker {
        schema,
        catalog,
        locals: Vec::new(),
        errors: Vec::new(),
    };
    checker.nodes(&ir.nodes);
    for (field, options) in &schema.routes {
        for option in options {
            if catalog.get(option).is_none() {
                checker.errors.push(ValidationError::UnknownComponent {
                    component: schema.name.clone(),
                    name: format!("{option} (route option of `{field}`)"),
                    available: list_names(catalog.names()),
                });
            }
        }
    }
    if checker.errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(checker.errors))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub schema: Schema,
    pub template: String,
}

/// All components known to a build, by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: Schema, template: impl Into<String>) {
        self.entries.insert(
            schema.name.clone(),
            CatalogEntry {
                schema,
                template: template.into(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Validate every component, plus each distinct slot a parent passes to a
    /// child, since slot markup is checked against the child it lands in.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut queue: Vec<(String, String)> =
            self.entries.keys().map(|n| (n.clone(), String::new())).collect();

        while let Some((name, slot)) = queue.pop() {
            if !seen.insert((name.clone(), slot.clone())) {
                continue;
            }
            let Some(entry) = self.entries.get(&name) else {
                continue;
            };
            let ir = prepare(&entry.template, &slot, &entry.schema);
            if let Err(ValidationErrors(mut found)) = validate(&ir, &entry.schema, self) {
                errors.append(&mut found);
            }
            for c in ir.components() {
                if !c.slot.trim().is_empty() {
                    queue.push((c.name.clone(), c.slot.clone()));
                }
            }
        }

        errors.dedup();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}
