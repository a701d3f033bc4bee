//! Marker numbering.
//!
//! A marker is `prefix_kindN`, or just `kindN` at the root. The server pass and the
//! hydration pass both derive every marker from an [`IdCounter`] driven in document
//! order, so they agree on names without exchanging a table.

use crate::template_ast::TemplateNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Text,
    If,
    Each,
    Event,
    Bind,
    Attr,
    Component,
    Route,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Text,
        Kind::If,
        Kind::Each,
        Kind::Event,
        Kind::Bind,
        Kind::Attr,
        Kind::Component,
        Kind::Route,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Kind::Text => "t",
            Kind::If => "if",
            Kind::Each => "each",
            Kind::Event => "ev",
            Kind::Bind => "bind",
            Kind::Attr => "attr",
            Kind::Component => "comp",
            Kind::Route => "route",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Kinds wrapped in `<!--ms-->…<!--m-->` comments rather than element attributes.
    pub fn is_region(self) -> bool {
        matches!(
            self,
            Kind::Text | Kind::If | Kind::Each | Kind::Component | Kind::Route
        )
    }
}

/// Join a path prefix and a local name.
pub fn join(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}_{local}")
    }
}

/// Marker of the `index`-th item of an each block.
pub fn item_marker(each_marker: &str, index: usize) -> String {
    format!("{each_marker}_{index}")
}

/// One counter per [`Kind`] plus the path prefix of the component being walked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdCounter {
    prefix: String,
    counts: [usize; Kind::ALL.len()],
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counts: [0; Kind::ALL.len()],
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.counts[kind.slot()]
    }

    /// Claim the next marker of `kind`.
    pub fn next(&mut self, kind: Kind) -> String {
        let local = self.next_local(kind);
        join(&self.prefix, &local)
    }

    /// Claim the next marker of `kind`, without the prefix.
    pub fn next_local(&mut self, kind: Kind) -> String {
        let n = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        format!("{}{n}", kind.abbrev())
    }

    /// The marker `next` would return, without claiming it.
    pub fn peek(&self, kind: Kind) -> String {
        join(
            &self.prefix,
            &format!("{}{}", kind.abbrev(), self.counts[kind.slot()]),
        )
    }

    /// A fresh counter for a nested scope named by `marker`.
    pub fn child(marker: &str) -> IdCounter {
        IdCounter::with_prefix(marker)
    }

    /// Raise every count to at least `other`'s. Used to join alternative branches.
    pub fn merge_max(&mut self, other: &IdCounter) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine = (*mine).max(theirs);
        }
    }
}

/// Assign local ids to every `if`, `each`, component and route node, following the
/// same traversal rules the render passes use.
pub fn number_blocks(nodes: &mut [TemplateNode]) {
    let mut ids = IdCounter::new();
    number_into(nodes, &mut ids);
}

fn number_into(nodes: &mut [TemplateNode], ids: &mut IdCounter) {
    for node in nodes {
        match node {
            TemplateNode::Text(_) => {}
            TemplateNode::Interpolation(_) => {
                ids.next_local(Kind::Text);
            }
            TemplateNode::Route(r) => r.id = ids.next_local(Kind::Route),
            TemplateNode::Component(c) => c.id = ids.next_local(Kind::Component),
            TemplateNode::Element(e) => {
                if let Some(kind) = element_kind(e) {
                    ids.next_local(kind);
                }
                if !e.attr_bindings.is_empty() {
                    ids.next_local(Kind::Attr);
                }
                number_into(&mut e.children, ids);
            }
            TemplateNode::If(b) => {
                b.id = ids.next_local(Kind::If);
                let entry = ids.clone();
                let mut joined = entry.clone();
                for branch in &mut b.branches {
                    let mut scratch = entry.clone();
                    number_into(&mut branch.children, &mut scratch);
                    joined.merge_max(&scratch);
                }
                let mut scratch = entry.clone();
                number_into(&mut b.else_children, &mut scratch);
                joined.merge_max(&scratch);
                *ids = joined;
            }
            TemplateNode::Each(b) => {
                b.id = ids.next_local(Kind::Each);
                number_into(&mut b.body, &mut IdCounter::new());
                number_into(&mut b.else_children, ids);
            }
        }
    }
}

/// The kind of the `id` marker an element claims, if any.
pub fn element_kind(e: &crate::template_ast::Element) -> Option<Kind> {
    if !e.events.is_empty() {
        Some(Kind::Event)
    } else if e.bind.is_some() {
        Some(Kind::Bind)
    } else if !e.classes.is_empty() {
        Some(Kind::Attr)
    } else {
        None
    }
}
