//! A small arena DOM: enough document structure for the hydration runtime to find
//! marker comments, patch regions between them and dispatch events.

pub mod diff;
pub mod events;
pub mod html;

pub use diff::{Edit, apply, diff};
pub use events::{Dom, Event, ListenerId};

pub type NodeId = usize;

/// Id of the document node every parsed tree hangs from.
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse a page or fragment into a fresh document.
    pub fn parse(source: &str) -> Self {
        let mut doc = Document::new();
        let top = html::parse_fragment(&mut doc, source);
        for id in top {
            doc.append_child(ROOT, id);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(data.into()))
    }

    /// Unlink `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|c| *c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` into `parent` before `reference`, or at the end.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        let pos = reference
            .and_then(|r| self.nodes[parent].children.iter().position(|c| *c == r))
            .unwrap_or(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(pos, child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == ROOT {
                return true;
            }
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id].data {
            let value = value.into();
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value,
                None => attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id].data {
            attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    /// Add or remove one class, keeping the order of the others.
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        let mut classes: Vec<String> = self
            .attr(id, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        match (on, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return,
        }
        if classes.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", classes.join(" "));
        }
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Comment(c) => Some(c),
            _ => None,
        }
    }

    pub fn set_comment(&mut self, id: NodeId, data: impl Into<String>) {
        if let NodeData::Comment(c) = &mut self.nodes[id].data {
            *c = data.into();
        }
    }

    /// Pre-order list of the attached subtree under `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev());
        }
        out
    }

    fn find(&self, pred: impl Fn(&NodeData) -> bool) -> Option<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .find(|n| pred(&self.nodes[*n].data))
    }

    /// First attached comment whose text is exactly `data`.
    pub fn find_comment(&self, data: &str) -> Option<NodeId> {
        self.find(|n| matches!(n, NodeData::Comment(c) if c == data))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.element_by_attr("id", id)
    }

    pub fn element_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find(|n| match n {
            NodeData::Element { attrs, .. } => attrs.iter().any(|(k, v)| k == name && v == value),
            _ => false,
        })
    }

    /// Siblings strictly between `start` and `end`. Empty if they are not siblings.
    pub fn nodes_between(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes[start].parent else {
            return Vec::new();
        };
        if self.nodes[end].parent != Some(parent) {
            return Vec::new();
        }
        let kids = &self.nodes[parent].children;
        match (
            kids.iter().position(|c| *c == start),
            kids.iter().position(|c| *c == end),
        ) {
            (Some(a), Some(b)) if a < b => kids[a + 1..b].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Parse `html` and insert the nodes before `reference` in `parent`.
    pub fn insert_html_before(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        source: &str,
    ) -> Vec<NodeId> {
        let nodes = html::parse_fragment(self, source);
        for n in &nodes {
            self.insert_before(parent, *n, reference);
        }
        nodes
    }

    /// Replace everything between two sibling markers with parsed `html`.
    pub fn replace_between(&mut self, start: NodeId, end: NodeId, source: &str) -> Vec<NodeId> {
        for n in self.nodes_between(start, end) {
            self.detach(n);
        }
        match self.nodes[end].parent {
            Some(parent) => self.insert_html_before(parent, Some(end), source),
            None => Vec::new(),
        }
    }

    /// Replace everything between two sibling markers with one text node.
    pub fn set_text_between(&mut self, start: NodeId, end: NodeId, text: &str) {
        for n in self.nodes_between(start, end) {
            self.detach(n);
        }
        if let Some(parent) = self.nodes[end].parent {
            let t = self.create_text(text);
            self.insert_before(parent, t, Some(end));
        }
    }

    /// Detach `start`, `end` and every sibling between them.
    pub fn remove_range(&mut self, start: NodeId, end: NodeId) {
        for n in self.nodes_between(start, end) {
            self.detach(n);
        }
        self.detach(start);
        self.detach(end);
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(t) = &self.nodes[id].data {
            out.push_str(t);
        }
        for n in self.descendants(id) {
            if let NodeData::Text(t) = &self.nodes[n].data {
                out.push_str(t);
            }
        }
        out
    }

    /// Concatenated text of the siblings between two markers.
    pub fn text_between(&self, start: NodeId, end: NodeId) -> String {
        self.nodes_between(start, end)
            .into_iter()
            .map(|n| self.text_content(n))
            .collect()
    }

    /// Serialized siblings between two markers.
    pub fn html_between(&self, start: NodeId, end: NodeId) -> String {
        let mut out = String::new();
        for n in self.nodes_between(start, end) {
            html::serialize(self, n, &mut out);
        }
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for c in &self.nodes[id].children {
            html::serialize(self, *c, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::serialize(self, id, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        self.inner_html(ROOT)
    }
}
