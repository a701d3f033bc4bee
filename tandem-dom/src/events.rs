use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Document, NodeId};

/// An event travelling from its target up through the ancestors.
#[derive(Debug)]
pub struct Event {
    pub kind: String,
    pub target: NodeId,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    fn new(kind: &str, target: NodeId) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&Event)>;

#[derive(Default)]
struct Registry {
    next: u64,
    by_target: HashMap<(NodeId, String), Vec<(ListenerId, Listener)>>,
}

/// Shared handle to a document plus its event listeners.
///
/// Cloning is cheap; every clone sees the same document. No borrow of the
/// document is held while listeners run, so listeners may mutate it.
#[derive(Clone, Default)]
pub struct Dom {
    doc: Rc<RefCell<Document>>,
    listeners: Rc<RefCell<Registry>>,
}

impl Dom {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Rc::new(RefCell::new(doc)),
            listeners: Rc::default(),
        }
    }

    pub fn parse(html: &str) -> Self {
        Self::new(Document::parse(html))
    }

    pub fn borrow(&self) -> Ref<'_, Document> {
        self.doc.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Document> {
        self.doc.borrow_mut()
    }

    pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.doc.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.doc.borrow_mut())
    }

    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: &str,
        listener: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        let mut reg = self.listeners.borrow_mut();
        let id = ListenerId(reg.next);
        reg.next += 1;
        reg.by_target
            .entry((node, kind.to_string()))
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut reg = self.listeners.borrow_mut();
        for list in reg.by_target.values_mut() {
            if let Some(pos) = list.iter().position(|(l, _)| *l == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, node: NodeId, kind: &str) -> usize {
        self.listeners
            .borrow()
            .by_target
            .get(&(node, kind.to_string()))
            .map_or(0, Vec::len)
    }

    /// Run listeners on `target` then on each ancestor until one stops propagation.
    pub fn dispatch(&self, target: NodeId, kind: &str) -> Event {
        let event = Event::new(kind, target);
        let path: Vec<NodeId> = {
            let doc = self.doc.borrow();
            let mut path = vec![target];
            let mut cur = target;
            while let Some(p) = doc.parent(cur) {
                path.push(p);
                cur = p;
            }
            path
        };

        for node in path {
            let snapshot: Vec<Listener> = self
                .listeners
                .borrow()
                .by_target
                .get(&(node, kind.to_string()))
                .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
                .unwrap_or_default();
            event.current_target.set(node);
            for listener in snapshot {
                listener(&event);
            }
            if event.propagation_stopped() {
                tracing::trace!(kind, node, "propagation stopped");
                break;
            }
        }
        event
    }

    pub fn click(&self, target: NodeId) -> Event {
        self.dispatch(target, "click")
    }

    /// Simulate typing: set the `value` attribute, then fire `input`.
    pub fn input(&self, target: NodeId, value: &str) -> Event {
        self.doc.borrow_mut().set_attr(target, "value", value);
        self.dispatch(target, "input")
    }

    /// Simulate toggling a checkbox, then fire `change`.
    pub fn set_checked(&self, target: NodeId, checked: bool) -> Event {
        {
            let mut doc = self.doc.borrow_mut();
            if checked {
                doc.set_attr(target, "checked", "");
            } else {
                doc.remove_attr(target, "checked");
            }
        }
        self.dispatch(target, "change")
    }

    pub fn to_html(&self) -> String {
        self.doc.borrow().to_html()
    }
}
