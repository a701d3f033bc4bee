//! Binding IR shared by the server pass and the hydration pass.

use std::fmt;

use tandem_core::Value;
use thiserror::Error;

use crate::condition::Condition;

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Opaque markup and text, emitted verbatim.
    Text(String),
    Interpolation(Interpolation),
    If(IfBlock),
    Each(EachBlock),
    Component(ComponentNode),
    Element(Element),
    /// A component-valued field rendered in place.
    Route(Route),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub field: String,
    pub html: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Condition,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub id: String,
    pub branches: Vec<Branch>,
    pub else_children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EachBlock {
    pub id: String,
    pub list: String,
    pub item: String,
    pub index: Option<String>,
    pub body: Vec<TemplateNode>,
    pub else_children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Literal(String),
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub name: String,
    pub value: PropValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: String,
    pub name: String,
    pub props: Vec<Prop>,
    pub events: Vec<EventSpec>,
    /// Raw slot markup; parsed only as part of the child's template.
    pub slot: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Prevent,
    Stop,
    Once,
    SelfOnly,
}

impl Modifier {
    pub fn parse(s: &str) -> Option<Modifier> {
        match s {
            "prevent" | "preventDefault" => Some(Modifier::Prevent),
            "stop" | "stopPropagation" => Some(Modifier::Stop),
            "once" => Some(Modifier::Once),
            "self" => Some(Modifier::SelfOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    pub event: String,
    pub modifiers: Vec<Modifier>,
    pub method: String,
    pub args: Vec<Arg>,
}

impl EventSpec {
    pub fn has(&self, m: Modifier) -> bool {
        self.modifiers.contains(&m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindProperty {
    Value,
    Checked,
}

impl BindProperty {
    pub fn attr(self) -> &'static str {
        match self {
            BindProperty::Value => "value",
            BindProperty::Checked => "checked",
        }
    }

    /// DOM event that carries user edits of this property.
    pub fn event(self) -> &'static str {
        match self {
            BindProperty::Value => "input",
            BindProperty::Checked => "change",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub property: BindProperty,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassToggle {
    pub class: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrPart {
    Static(String),
    Field(String),
}

/// `href="{Base}/{Path}"`: an attribute value rebuilt whenever a field changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrBinding {
    pub name: String,
    pub template: String,
    pub parts: Vec<AttrPart>,
    /// The static text with every field blanked.
    pub fallback: String,
}

impl AttrBinding {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            AttrPart::Field(f) => Some(f.as_str()),
            AttrPart::Static(_) => None,
        })
    }

    pub fn render(&self, mut lookup: impl FnMut(&str) -> String) -> String {
        let mut out = String::new();
        for p in &self.parts {
            match p {
                AttrPart::Static(s) => out.push_str(s),
                AttrPart::Field(f) => out.push_str(&lookup(f)),
            }
        }
        out
    }
}

/// An element carrying at least one directive. Plain markup stays in `Text`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub events: Vec<EventSpec>,
    pub bind: Option<InputBinding>,
    pub classes: Vec<ClassToggle>,
    pub attr_bindings: Vec<AttrBinding>,
    pub children: Vec<TemplateNode>,
}

impl Element {
    /// Whether the element takes an `id` marker for events, bindings or class toggles.
    pub fn needs_id(&self) -> bool {
        !self.events.is_empty() || self.bind.is_some() || !self.classes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (byte {offset})")]
pub struct ParseDiagnostic {
    pub offset: usize,
    pub message: String,
}

/// Parser output: the node tree plus the problems that were recovered from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateIR {
    pub nodes: Vec<TemplateNode>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl TemplateIR {
    /// Pre-order, source-ordered walk of every node. Both branches of an `if`
    /// and the `else` of an `each` are included.
    pub fn walk(&self) -> Nodes<'_> {
        Nodes::new(&self.nodes)
    }

    pub fn expressions(&self) -> impl Iterator<Item = &Interpolation> {
        self.walk().filter_map(|n| match n {
            TemplateNode::Interpolation(i) => Some(i),
            _ => None,
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &EventSpec> {
        self.walk().flat_map(|n| match n {
            TemplateNode::Element(e) => e.events.iter(),
            TemplateNode::Component(c) => c.events.iter(),
            _ => Default::default(),
        })
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.walk().flat_map(node_conditions)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentNode> {
        self.walk().filter_map(|n| match n {
            TemplateNode::Component(c) => Some(c),
            _ => None,
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = &InputBinding> {
        self.walk().filter_map(|n| match n {
            TemplateNode::Element(e) => e.bind.as_ref(),
            _ => None,
        })
    }

    pub fn attr_bindings(&self) -> impl Iterator<Item = &AttrBinding> {
        self.walk().flat_map(|n| match n {
            TemplateNode::Element(e) => e.attr_bindings.iter(),
            _ => Default::default(),
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.walk().filter_map(|n| match n {
            TemplateNode::Route(r) => Some(r),
            _ => None,
        })
    }
}

fn node_conditions(n: &TemplateNode) -> Box<dyn Iterator<Item = &Condition> + '_> {
    match n {
        TemplateNode::If(b) => Box::new(b.branches.iter().map(|br| &br.condition)),
        TemplateNode::Element(e) => Box::new(e.classes.iter().map(|c| &c.condition)),
        _ => Box::new(std::iter::empty()),
    }
}

impl TemplateNode {
    /// Child lists in source order.
    pub fn child_lists(&self) -> Vec<&[TemplateNode]> {
        match self {
            TemplateNode::If(b) => {
                let mut v: Vec<&[TemplateNode]> =
                    b.branches.iter().map(|br| br.children.as_slice()).collect();
                v.push(&b.else_children);
                v
            }
            TemplateNode::Each(b) => vec![b.body.as_slice(), b.else_children.as_slice()],
            TemplateNode::Element(e) => vec![e.children.as_slice()],
            _ => Vec::new(),
        }
    }
}

pub struct Nodes<'a> {
    stack: Vec<&'a TemplateNode>,
}

impl<'a> Nodes<'a> {
    fn new(roots: &'a [TemplateNode]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TemplateNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for list in node.child_lists().into_iter().rev() {
            self.stack.extend(list.iter().rev());
        }
        Some(node)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Literal(Value::Str(s)) => write!(f, "'{s}'"),
            Arg::Literal(v) => write!(f, "{v}"),
            Arg::Name(n) => f.write_str(n),
        }
    }
}
