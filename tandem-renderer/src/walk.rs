//! The one traversal both render passes share.
//!
//! [`walk`] claims markers from an [`IdCounter`] in document order. In
//! [`Mode::Emit`] it reports the rendered content to a [`Visitor`]; in
//! [`Mode::Advance`] it only moves the counter, which is how unchosen branches
//! keep the names after them stable.

use std::rc::Rc;

use tandem_core::Value;
use tandem_sfc::{
    ComponentNode, EachBlock, Element, IdCounter, IfBlock, Interpolation, Kind, Lookup,
    PropValue, TemplateNode, element_kind, item_marker,
};

use crate::component::Instance;
use crate::error::RenderError;
use crate::registry::Registry;
use crate::scope::Scope;

/// Deepest component nesting a render follows before giving up.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Emit,
    Advance,
}

pub(crate) struct Cx<'a> {
    pub registry: &'a Registry,
    pub scope: &'a Scope,
    pub depth: usize,
}

impl<'a> Cx<'a> {
    fn with_scope<'b>(&'b self, scope: &'b Scope) -> Cx<'b>
    where
        'a: 'b,
    {
        Cx {
            registry: self.registry,
            scope,
            depth: self.depth,
        }
    }
}

/// A comment-delimited region about to be emitted.
#[derive(Clone, Copy)]
pub(crate) enum Region<'a> {
    If {
        block: &'a IfBlock,
        /// Counter just after the block claimed its own marker.
        entry: &'a IdCounter,
        /// Index of the chosen branch; `None` for the else content.
        active: Option<usize>,
    },
    Each {
        block: &'a EachBlock,
        entry: &'a IdCounter,
    },
    Item {
        index: usize,
        value: &'a Value,
    },
    Component {
        node: &'a ComponentNode,
        child: &'a Instance,
    },
    Route {
        field: &'a str,
        child: Option<&'a Instance>,
    },
}

pub(crate) trait Visitor {
    fn text(&mut self, text: &str);
    fn interpolation(&mut self, cx: &Cx<'_>, marker: &str, node: &Interpolation);
    fn open_element(
        &mut self,
        cx: &Cx<'_>,
        el: &Element,
        id: Option<&str>,
        attr_marker: Option<&str>,
    );
    fn close_element(&mut self, el: &Element);
    fn enter(&mut self, cx: &Cx<'_>, marker: &str, region: Region<'_>);
    fn exit(&mut self, cx: &Cx<'_>, marker: &str, region: Region<'_>);
}

/// Index of the first branch whose condition holds, `None` when the else applies.
pub(crate) fn active_branch(block: &IfBlock, scope: &dyn Lookup) -> Option<usize> {
    block
        .branches
        .iter()
        .position(|b| b.condition.eval(scope))
}

pub(crate) fn list_items(block: &EachBlock, scope: &Scope) -> Vec<Value> {
    match scope.lookup(&block.list) {
        Some(Value::List(items)) => items,
        Some(other) => {
            tracing::warn!(list = %block.list, kind = %other.kind(), "each over a non-list value");
            Vec::new()
        }
        None => Vec::new(),
    }
}

pub(crate) fn item_scope(block: &EachBlock, scope: &Scope, index: usize, value: &Value) -> Scope {
    let mut locals = vec![(block.item.clone(), value.clone())];
    if let Some(index_name) = &block.index {
        locals.push((index_name.clone(), Value::from(index)));
    }
    scope.with_locals(locals)
}

/// Child instance for a component tag, created with its props on first use.
pub(crate) fn component_instance(
    cx: &Cx<'_>,
    marker: &str,
    node: &ComponentNode,
) -> Result<Instance, RenderError> {
    if cx.depth >= MAX_DEPTH {
        return Err(RenderError::TooDeep {
            component: node.name.clone(),
            limit: MAX_DEPTH,
        });
    }
    let def = cx.registry.get(&node.name)?;
    Ok(cx.scope.instance.child_or_insert(marker, &def, |child| {
        for prop in &node.props {
            let Some(current) = child.get(&prop.name) else {
                tracing::warn!(component = %node.name, prop = %prop.name, "unknown prop ignored");
                continue;
            };
            let value = match &prop.value {
                PropValue::Literal(text) => current.coerce(text),
                PropValue::Field(name) => cx.scope.value(name),
            };
            // Initial props are applied before anything subscribes.
            if let Err(err) = child.set(&prop.name, value) {
                tracing::warn!(component = %node.name, prop = %prop.name, %err, "prop not applied");
            }
        }
    }))
}

pub(crate) fn route_instance(
    cx: &Cx<'_>,
    marker: &str,
    field: &str,
) -> Result<Option<Instance>, RenderError> {
    let Some(page) = cx.scope.lookup(field).and_then(|v| v.as_component().cloned()) else {
        return Ok(None);
    };
    if page.name().is_empty() {
        return Ok(None);
    }
    if cx.depth >= MAX_DEPTH {
        return Err(RenderError::TooDeep {
            component: page.name().to_string(),
            limit: MAX_DEPTH,
        });
    }
    let def = cx.registry.get(page.name())?;
    Ok(Some(cx.scope.instance.child_or_insert(marker, &def, |_| {})))
}

/// Walk a child component's template with its own counter.
pub(crate) fn walk_component<V: Visitor + ?Sized>(
    v: &mut V,
    cx: &Cx<'_>,
    marker: &str,
    child: &Instance,
    slot: &str,
) -> Result<(), RenderError> {
    let ir = cx.registry.template(child.name(), slot)?;
    let scope = Scope::new(child.clone());
    let child_cx = Cx {
        registry: cx.registry,
        scope: &scope,
        depth: cx.depth + 1,
    };
    let mut ids = IdCounter::child(marker);
    walk(v, &child_cx, &ir.nodes, &mut ids, Mode::Emit)
}

pub(crate) fn walk_item<V: Visitor + ?Sized>(
    v: &mut V,
    cx: &Cx<'_>,
    block: &EachBlock,
    marker: &str,
    index: usize,
    value: &Value,
) -> Result<(), RenderError> {
    let scope = item_scope(block, cx.scope, index, value);
    let item_cx = cx.with_scope(&scope);
    let region = Region::Item { index, value };
    v.enter(&item_cx, marker, region);
    let mut ids = IdCounter::child(marker);
    walk(v, &item_cx, &block.body, &mut ids, Mode::Emit)?;
    v.exit(&item_cx, marker, region);
    Ok(())
}

pub(crate) fn walk<V: Visitor + ?Sized>(
    v: &mut V,
    cx: &Cx<'_>,
    nodes: &[TemplateNode],
    ids: &mut IdCounter,
    mode: Mode,
) -> Result<(), RenderError> {
    let emit = mode == Mode::Emit;
    for node in nodes {
        match node {
            TemplateNode::Text(text) => {
                if emit {
                    v.text(text);
                }
            }
            TemplateNode::Interpolation(i) => {
                let marker = ids.next(Kind::Text);
                if emit {
                    v.interpolation(cx, &marker, i);
                }
            }
            TemplateNode::Element(el) => {
                let id = element_kind(el).map(|k| ids.next(k));
                let attr_marker = (!el.attr_bindings.is_empty()).then(|| ids.next(Kind::Attr));
                if emit {
                    v.open_element(cx, el, id.as_deref(), attr_marker.as_deref());
                }
                walk(v, cx, &el.children, ids, mode)?;
                if emit {
                    v.close_element(el);
                }
            }
            TemplateNode::If(block) => {
                let marker = ids.next(Kind::If);
                let entry = ids.clone();
                let active = if emit {
                    active_branch(block, cx.scope)
                } else {
                    None
                };
                let region = Region::If {
                    block,
                    entry: &entry,
                    active,
                };
                if emit {
                    v.enter(cx, &marker, region);
                }
                let mut joined = entry.clone();
                for (i, branch) in block.branches.iter().enumerate() {
                    let mut scratch = entry.clone();
                    let branch_mode = if emit && active == Some(i) {
                        Mode::Emit
                    } else {
                        Mode::Advance
                    };
                    walk(v, cx, &branch.children, &mut scratch, branch_mode)?;
                    joined.merge_max(&scratch);
                }
                let mut scratch = entry.clone();
                let else_mode = if emit && active.is_none() {
                    Mode::Emit
                } else {
                    Mode::Advance
                };
                walk(v, cx, &block.else_children, &mut scratch, else_mode)?;
                joined.merge_max(&scratch);
                if emit {
                    v.exit(cx, &marker, region);
                }
                *ids = joined;
            }
            TemplateNode::Each(block) => {
                let marker = ids.next(Kind::Each);
                if !emit {
                    walk(v, cx, &block.else_children, ids, Mode::Advance)?;
                    continue;
                }
                let entry = ids.clone();
                let items = list_items(block, cx.scope);
                let region = Region::Each {
                    block,
                    entry: &entry,
                };
                v.enter(cx, &marker, region);
                for (index, value) in items.iter().enumerate() {
                    walk_item(v, cx, block, &item_marker(&marker, index), index, value)?;
                }
                let else_mode = if items.is_empty() {
                    Mode::Emit
                } else {
                    Mode::Advance
                };
                walk(v, cx, &block.else_children, ids, else_mode)?;
                v.exit(cx, &marker, region);
            }
            TemplateNode::Component(node) => {
                let marker = ids.next(Kind::Component);
                if emit {
                    let child = component_instance(cx, &marker, node)?;
                    let region = Region::Component {
                        node,
                        child: &child,
                    };
                    v.enter(cx, &marker, region);
                    walk_component(v, cx, &marker, &child, &node.slot)?;
                    v.exit(cx, &marker, region);
                }
            }
            TemplateNode::Route(route) => {
                let marker = ids.next(Kind::Route);
                if emit {
                    let child = route_instance(cx, &marker, &route.field)?;
                    let region = Region::Route {
                        field: &route.field,
                        child: child.as_ref(),
                    };
                    v.enter(cx, &marker, region);
                    if let Some(child) = &child {
                        walk_component(v, cx, &marker, child, "")?;
                    }
                    v.exit(cx, &marker, region);
                }
            }
        }
    }
    Ok(())
}

/// Shared ownership of a walk's inputs for closures that re-render later.
#[derive(Clone)]
pub(crate) struct Owned {
    pub registry: Rc<Registry>,
    pub scope: Scope,
    pub depth: usize,
}

impl Owned {
    pub fn from_cx(registry: &Rc<Registry>, cx: &Cx<'_>) -> Self {
        Self {
            registry: registry.clone(),
            scope: cx.scope.clone(),
            depth: cx.depth,
        }
    }

    pub fn cx(&self) -> Cx<'_> {
        Cx {
            registry: &self.registry,
            scope: &self.scope,
            depth: self.depth,
        }
    }
}
