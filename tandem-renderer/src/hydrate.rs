//! Client pass: adopt server-rendered HTML and keep it in step with the stores.
//!
//! Hydration replays the same [`walk`] the server ran, so every marker it claims
//! names a node the server already wrote. Each marker found is wired once: text
//! regions and attributes subscribe to the fields they show, elements get their
//! listeners, and `if`/`each`/route regions become [`LiveRegion`]s that re-render
//! their content from the counter state they started with.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tandem_core::{Store, SubscriptionId, Value};
use tandem_dom::{Document, Dom, Edit, ListenerId, NodeId, apply, diff};
use tandem_sfc::{
    EachBlock, Element, IdCounter, IfBlock, Interpolation, PropValue, item_marker,
};

use crate::component::{EmitId, Instance};
use crate::error::RenderError;
use crate::events::{bind_input, forward_emit, listen, write_bound};
use crate::registry::Registry;
use crate::scope::Scope;
use crate::ssr::{HtmlVisitor, attr_value};
use crate::walk::{
    Cx, Mode, Owned, Region, Visitor, active_branch, item_scope, list_items, route_instance,
    walk, walk_component, walk_item,
};

struct Runtime {
    dom: Dom,
    registry: Rc<Registry>,
    wired: RefCell<HashSet<String>>,
}

impl Runtime {
    /// Claim `marker`. False when something already wired it.
    fn wire(&self, marker: &str) -> bool {
        self.wired.borrow_mut().insert(marker.to_string())
    }

    fn unwire(&self, marker: &str) {
        self.wired.borrow_mut().remove(marker);
    }

    fn comments(&self, marker: &str) -> Option<(NodeId, NodeId)> {
        self.dom.with(|d| {
            let start = d.find_comment(&format!("{marker}s"))?;
            let end = d.find_comment(marker)?;
            Some((start, end))
        })
    }
}

/// Everything one stretch of hydrated content registered, so it can be undone.
#[derive(Default)]
struct Bindings {
    subs: Vec<(Rc<Store<Value>>, SubscriptionId)>,
    listeners: Vec<ListenerId>,
    emits: Vec<(Instance, EmitId)>,
    markers: Vec<String>,
    /// (parent, key) of child instances created for this content.
    children: Vec<(Instance, String)>,
    regions: Vec<Rc<LiveRegion>>,
}

impl Bindings {
    fn subscribe(&mut self, store: Rc<Store<Value>>, callback: impl Fn(&Value) + 'static) {
        let id = store.on_change(callback);
        self.subs.push((store, id));
    }

    /// Like `subscribe`, skipping writes that leave the value unchanged.
    fn watch_changes(&mut self, store: Rc<Store<Value>>, mut callback: impl FnMut(&Value) + 'static) {
        let id = tandem_core::watch(&store, move |new, _| callback(new));
        self.subs.push((store, id));
    }

    fn absorb(&mut self, other: Bindings) {
        self.subs.extend(other.subs);
        self.listeners.extend(other.listeners);
        self.emits.extend(other.emits);
        self.markers.extend(other.markers);
        self.children.extend(other.children);
        self.regions.extend(other.regions);
    }

    fn release(self, rt: &Runtime) {
        for (store, id) in self.subs {
            store.unsubscribe(id);
        }
        for id in self.listeners {
            rt.dom.remove_event_listener(id);
        }
        for (child, id) in self.emits {
            child.off_emit(id);
        }
        for region in self.regions {
            region.release();
        }
        for marker in self.markers {
            rt.unwire(&marker);
        }
        for (parent, key) in self.children {
            parent.drop_child(&key);
        }
    }
}

struct Item {
    index: usize,
    value: Value,
    start: NodeId,
    end: NodeId,
    bindings: Bindings,
}

enum Source {
    If {
        block: IfBlock,
        entry: IdCounter,
        active: Cell<Option<usize>>,
    },
    Each {
        block: EachBlock,
        entry: IdCounter,
        items: RefCell<Vec<Item>>,
    },
    Route {
        field: String,
        page: RefCell<String>,
    },
}

/// A hydrated region whose content depends on store values.
struct LiveRegion {
    rt: Rc<Runtime>,
    marker: String,
    start: NodeId,
    end: NodeId,
    owned: Owned,
    source: Source,
    /// Subscriptions that trigger refreshes, plus the region's own marker.
    own: RefCell<Bindings>,
    /// Bindings of the content currently between the markers.
    inner: RefCell<Bindings>,
    released: Cell<bool>,
}

impl LiveRegion {
    fn new(
        rt: &Rc<Runtime>,
        cx: &Cx<'_>,
        marker: &str,
        (start, end): (NodeId, NodeId),
        source: Source,
        inner: Bindings,
    ) -> Rc<Self> {
        let own = Bindings {
            markers: vec![marker.to_string()],
            ..Bindings::default()
        };
        Rc::new(Self {
            rt: rt.clone(),
            marker: marker.to_string(),
            start,
            end,
            owned: Owned::from_cx(&rt.registry, cx),
            source,
            own: RefCell::new(own),
            inner: RefCell::new(inner),
            released: Cell::new(false),
        })
    }

    fn watch(self: &Rc<Self>, store: Rc<Store<Value>>) {
        let weak = Rc::downgrade(self);
        self.own.borrow_mut().watch_changes(store, move |_| {
            if let Some(region) = weak.upgrade() {
                region.refresh();
            }
        });
    }

    fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        let own = std::mem::take(&mut *self.own.borrow_mut());
        own.release(&self.rt);
        self.release_inner();
    }

    fn release_inner(&self) {
        let inner = std::mem::take(&mut *self.inner.borrow_mut());
        inner.release(&self.rt);
        if let Source::Each { items, .. } = &self.source {
            let items = std::mem::take(&mut *items.borrow_mut());
            for item in items {
                item.bindings.release(&self.rt);
            }
        }
    }

    fn refresh(&self) {
        if self.released.get() {
            return;
        }
        match &self.source {
            Source::If { block, active, .. } => self.refresh_if(block, active),
            Source::Each {
                block,
                entry,
                items,
            } => self.refresh_each(block, entry, items),
            Source::Route { field, page } => self.refresh_route(field, page),
        }
    }

    /// Render the content the tracked state selects: the active branch, the
    /// current list, or the current page.
    fn draw(&self, v: &mut dyn Visitor, cx: &Cx<'_>) -> Result<(), RenderError> {
        match &self.source {
            Source::If { block, entry, active } => {
                let nodes = match active.get() {
                    Some(i) => &block.branches[i].children,
                    None => &block.else_children,
                };
                walk(v, cx, nodes, &mut entry.clone(), Mode::Emit)
            }
            Source::Each { block, entry, .. } => {
                let items = list_items(block, cx.scope);
                for (index, value) in items.iter().enumerate() {
                    walk_item(v, cx, block, &item_marker(&self.marker, index), index, value)?;
                }
                if items.is_empty() {
                    walk(v, cx, &block.else_children, &mut entry.clone(), Mode::Emit)?;
                }
                Ok(())
            }
            Source::Route { field, .. } => match route_instance(cx, &self.marker, field)? {
                Some(child) => walk_component(v, cx, &self.marker, &child, ""),
                None => Ok(()),
            },
        }
    }

    /// Re-render when the document does not hold what the current state renders
    /// to, as after a store write between the server render and hydration.
    /// Returns the markers the re-render located, if it ran.
    fn resync(&self) -> Option<Vec<String>> {
        let cx = self.owned.cx();
        let mut expected = HtmlVisitor::default();
        if let Err(err) = self.draw(&mut expected, &cx) {
            tracing::warn!(marker = %self.marker, %err, "cannot check server content");
            return None;
        }
        let expected = Document::parse(&expected.out).to_html();
        let current = self.rt.dom.with(|d| d.html_between(self.start, self.end));
        if current == expected {
            return None;
        }
        tracing::debug!(marker = %self.marker, "server content is stale; re-rendering");
        self.release_inner();
        let frame = self.redraw(&cx, (self.start, self.end), |v, cx| self.draw(v, cx))?;
        let mut bindings = frame.bindings;
        match &self.source {
            Source::Each { items, .. } => *items.borrow_mut() = frame.items,
            Source::Route { .. } => {
                let parent = &self.owned.scope.instance;
                if parent.child(&self.marker).is_some() {
                    bindings.children.push((parent.clone(), self.marker.clone()));
                }
            }
            Source::If { .. } => {}
        }
        *self.inner.borrow_mut() = bindings;
        Some(frame.found)
    }

    /// Render with `draw` between `start` and `end`, then hydrate what was written.
    fn redraw(
        &self,
        cx: &Cx<'_>,
        (start, end): (NodeId, NodeId),
        draw: impl Fn(&mut dyn Visitor, &Cx<'_>) -> Result<(), RenderError>,
    ) -> Option<Frame> {
        let mut html = HtmlVisitor::default();
        if let Err(err) = draw(&mut html, cx) {
            tracing::warn!(marker = %self.marker, %err, "re-render failed");
            return None;
        }
        self.rt.dom.with_mut(|d| {
            d.replace_between(start, end, &html.out);
        });
        let mut hydrator = HydrateVisitor::new(self.rt.clone());
        if let Err(err) = draw(&mut hydrator, cx) {
            tracing::warn!(marker = %self.marker, %err, "re-hydration failed");
        }
        Some(hydrator.finish())
    }

    fn refresh_if(&self, block: &IfBlock, active: &Cell<Option<usize>>) {
        let now = active_branch(block, &self.owned.scope);
        if now == active.get() {
            return;
        }
        tracing::debug!(marker = %self.marker, from = ?active.get(), to = ?now, "branch changed");
        active.set(now);
        self.release_inner();
        let cx = self.owned.cx();
        if let Some(frame) = self.redraw(&cx, (self.start, self.end), |v, cx| self.draw(v, cx)) {
            *self.inner.borrow_mut() = frame.bindings;
        }
    }

    fn refresh_route(&self, field: &str, page: &RefCell<String>) {
        let now = self.owned.scope.value(field).to_string();
        if *page.borrow() == now {
            return;
        }
        tracing::debug!(marker = %self.marker, from = %page.borrow(), to = %now, "route changed");
        *page.borrow_mut() = now;
        self.release_inner();
        let cx = self.owned.cx();
        let child = match route_instance(&cx, &self.marker, field) {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(marker = %self.marker, %err, "route not rendered");
                self.rt.dom.with_mut(|d| {
                    d.replace_between(self.start, self.end, "");
                });
                return;
            }
        };
        let marker = self.marker.as_str();
        let frame = self.redraw(&cx, (self.start, self.end), |v, cx| match &child {
            Some(child) => walk_component(v, cx, marker, child, ""),
            None => Ok(()),
        });
        if let Some(mut frame) = frame {
            if child.is_some() {
                frame
                    .bindings
                    .children
                    .push((self.owned.scope.instance.clone(), self.marker.clone()));
            }
            *self.inner.borrow_mut() = frame.bindings;
        }
    }

    fn refresh_each(&self, block: &EachBlock, entry: &IdCounter, items: &RefCell<Vec<Item>>) {
        let new = list_items(block, &self.owned.scope);
        let old: Vec<Value> = items.borrow().iter().map(|i| i.value.clone()).collect();
        if old == new {
            return;
        }
        if !old.is_empty() && !new.is_empty() {
            let edits = diff(&old, &new);
            let mut check = old.clone();
            apply(&mut check, &edits);
            if check == new {
                tracing::debug!(marker = %self.marker, edits = edits.len(), "patching list");
                self.patch_each(block, items, &edits, &new);
                return;
            }
            tracing::debug!(marker = %self.marker, "set diff does not reach the new list; re-rendering");
        }
        self.rebuild_each(block, entry, items, &new);
    }

    fn rebuild_each(
        &self,
        block: &EachBlock,
        entry: &IdCounter,
        items: &RefCell<Vec<Item>>,
        new: &[Value],
    ) {
        self.release_inner();
        let cx = self.owned.cx();
        let marker = self.marker.as_str();
        let frame = self.redraw(&cx, (self.start, self.end), |v, cx| {
            for (index, value) in new.iter().enumerate() {
                walk_item(v, cx, block, &item_marker(marker, index), index, value)?;
            }
            if new.is_empty() {
                walk(v, cx, &block.else_children, &mut entry.clone(), Mode::Emit)?;
            }
            Ok(())
        });
        if let Some(frame) = frame {
            *items.borrow_mut() = frame.items;
            *self.inner.borrow_mut() = frame.bindings;
        }
    }

    /// Apply a set diff in place. Survivors whose index moved keep their wrapper
    /// comments, renamed, and get their content re-rendered under the new name.
    fn patch_each(
        &self,
        block: &EachBlock,
        items: &RefCell<Vec<Item>>,
        edits: &[Edit<Value>],
        new: &[Value],
    ) {
        let rt = &self.rt;
        let mut kept = std::mem::take(&mut *items.borrow_mut());
        for edit in edits {
            if let Edit::Remove { index } = edit {
                if *index < kept.len() {
                    let item = kept.remove(*index);
                    rt.dom.with_mut(|d| d.remove_range(item.start, item.end));
                    item.bindings.release(rt);
                }
            }
        }

        let inserted: HashSet<usize> = edits
            .iter()
            .filter_map(|e| match e {
                Edit::Insert { index, .. } => Some(*index),
                Edit::Remove { .. } => None,
            })
            .collect();
        let mut survivors = kept.into_iter();
        let mut slots: Vec<Option<Item>> = (0..new.len())
            .map(|i| {
                if inserted.contains(&i) {
                    None
                } else {
                    survivors.next()
                }
            })
            .collect();

        // Clear and rename every moved survivor before anything is looked up by
        // marker, so no name exists twice.
        for (index, slot) in slots.iter_mut().enumerate() {
            let Some(item) = slot else { continue };
            if item.index == index {
                continue;
            }
            std::mem::take(&mut item.bindings).release(rt);
            let marker = item_marker(&self.marker, index);
            rt.dom.with_mut(|d| {
                d.replace_between(item.start, item.end, "");
                d.set_comment(item.start, format!("{marker}s"));
                d.set_comment(item.end, marker.clone());
            });
        }

        let mut anchors = vec![self.end; slots.len()];
        let mut anchor = self.end;
        for index in (0..slots.len()).rev() {
            anchors[index] = anchor;
            if let Some(item) = &slots[index] {
                anchor = item.start;
            }
        }

        let cx = self.owned.cx();
        let mut next = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let marker = item_marker(&self.marker, index);
            match slot {
                Some(item) if item.index == index => next.push(item),
                Some(mut item) => {
                    item.index = index;
                    item.bindings = self.refill_item(&cx, block, &item, &marker);
                    next.push(item);
                }
                None => {
                    if let Some(item) =
                        self.insert_item(&cx, block, &marker, index, &new[index], anchors[index])
                    {
                        next.push(item);
                    }
                }
            }
        }
        *items.borrow_mut() = next;
    }

    fn refill_item(&self, cx: &Cx<'_>, block: &EachBlock, item: &Item, marker: &str) -> Bindings {
        let scope = item_scope(block, cx.scope, item.index, &item.value);
        let item_cx = Cx {
            registry: cx.registry,
            scope: &scope,
            depth: cx.depth,
        };
        let mut bindings = Bindings::default();
        if self.rt.wire(marker) {
            bindings.markers.push(marker.to_string());
        }
        if let Some(frame) = self.redraw(&item_cx, (item.start, item.end), |v, cx| {
            walk(v, cx, &block.body, &mut IdCounter::child(marker), Mode::Emit)
        }) {
            bindings.absorb(frame.bindings);
        }
        bindings
    }

    fn insert_item(
        &self,
        cx: &Cx<'_>,
        block: &EachBlock,
        marker: &str,
        index: usize,
        value: &Value,
        anchor: NodeId,
    ) -> Option<Item> {
        let mut html = HtmlVisitor::default();
        if let Err(err) = walk_item(&mut html, cx, block, marker, index, value) {
            tracing::warn!(marker, %err, "item not rendered");
            return None;
        }
        self.rt.dom.with_mut(|d| {
            let parent = d.parent(anchor)?;
            Some(d.insert_html_before(parent, Some(anchor), &html.out))
        })?;
        let mut hydrator = HydrateVisitor::new(self.rt.clone());
        if let Err(err) = walk_item(&mut hydrator, cx, block, marker, index, value) {
            tracing::warn!(marker, %err, "item not hydrated");
        }
        hydrator.finish().items.pop()
    }
}

struct Frame {
    bounds: Option<(NodeId, NodeId)>,
    /// False when the region's markers were missing or already wired elsewhere.
    live: bool,
    bindings: Bindings,
    items: Vec<Item>,
    /// Lengths of the visitor's found and missing lists when the frame opened.
    found_at: usize,
    missing_at: usize,
    /// Markers located, filled in on the finished root frame only.
    found: Vec<String>,
}

impl Frame {
    fn root() -> Self {
        Frame {
            bounds: None,
            live: true,
            bindings: Bindings::default(),
            items: Vec::new(),
            found_at: 0,
            missing_at: 0,
            found: Vec::new(),
        }
    }
}

struct HydrateVisitor {
    rt: Rc<Runtime>,
    root: Frame,
    stack: Vec<Frame>,
    found: Vec<String>,
    missing: Vec<String>,
}

impl HydrateVisitor {
    fn new(rt: Rc<Runtime>) -> Self {
        Self {
            rt,
            root: Frame::root(),
            stack: Vec::new(),
            found: Vec::new(),
            missing: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn finish(mut self) -> Frame {
        while let Some(frame) = self.stack.pop() {
            let top = self.top();
            top.bindings.absorb(frame.bindings);
            top.items.extend(frame.items);
        }
        self.root.found = std::mem::take(&mut self.found);
        self.root
    }

    fn note(&mut self, marker: &str, hit: bool) {
        if hit {
            self.found.push(marker.to_string());
        } else {
            tracing::warn!(marker, "marker not found in the document");
            self.missing.push(marker.to_string());
        }
    }

    fn locate_comments(&mut self, marker: &str) -> Option<(NodeId, NodeId)> {
        let bounds = self.rt.comments(marker);
        self.note(marker, bounds.is_some());
        bounds
    }

    fn locate_element(&mut self, attr: &str, marker: &str) -> Option<NodeId> {
        let node = self.rt.dom.with(|d| d.element_by_attr(attr, marker));
        self.note(marker, node.is_some());
        node
    }

    fn wire_element(&mut self, scope: &Scope, el: &Element, id: &str, node: NodeId) {
        let dom = self.rt.dom.clone();
        let mut b = Bindings {
            markers: vec![id.to_string()],
            ..Bindings::default()
        };
        for spec in &el.events {
            b.listeners.push(listen(&dom, node, scope, spec));
        }
        if let Some(bind) = &el.bind {
            b.listeners.push(bind_input(&dom, node, scope, bind));
            match scope.store(&bind.field) {
                Some(store) => {
                    let dom = dom.clone();
                    let property = bind.property;
                    b.subscribe(store, move |v| write_bound(&dom, node, property, v));
                }
                None => tracing::warn!(field = %bind.field, "binding is not backed by a field"),
            }
        }
        for toggle in &el.classes {
            let mut names = toggle.condition.names();
            names.sort_unstable();
            names.dedup();
            for name in names {
                let Some(store) = scope.store(name) else { continue };
                let dom = dom.clone();
                let toggle = toggle.clone();
                let scope = scope.clone();
                b.subscribe(store, move |_| {
                    let on = toggle.condition.eval(&scope);
                    dom.with_mut(|d| d.toggle_class(node, &toggle.class, on));
                });
            }
        }
        self.top().bindings.absorb(b);
    }

    fn wire_attrs(&mut self, scope: &Scope, el: &Element, marker: &str, node: NodeId) {
        let mut b = Bindings {
            markers: vec![marker.to_string()],
            ..Bindings::default()
        };
        for binding in &el.attr_bindings {
            let mut fields: Vec<&str> = binding.fields().collect();
            fields.sort_unstable();
            fields.dedup();
            for field in fields {
                let Some(store) = scope.store(field) else { continue };
                let dom = self.rt.dom.clone();
                let binding = binding.clone();
                let scope = scope.clone();
                b.subscribe(store, move |_| {
                    let value = attr_value(&binding, &scope);
                    dom.with_mut(|d| d.set_attr(node, &binding.name, value));
                });
            }
        }
        self.top().bindings.absorb(b);
    }
}

impl Visitor for HydrateVisitor {
    fn text(&mut self, _text: &str) {}

    fn interpolation(&mut self, cx: &Cx<'_>, marker: &str, node: &Interpolation) {
        let Some((start, end)) = self.locate_comments(marker) else {
            return;
        };
        // Each locals never change under a rendered item.
        let Some(store) = cx.scope.store(&node.field) else {
            return;
        };
        if !self.rt.wire(marker) {
            return;
        }
        let dom = self.rt.dom.clone();
        let html = node.html;
        let now = store.get().to_string();
        dom.with_mut(|d| {
            let stale = if html {
                d.html_between(start, end) != Document::parse(&now).to_html()
            } else {
                d.text_between(start, end) != now
            };
            if stale {
                tracing::debug!(marker, "server text is stale");
                if html {
                    d.replace_between(start, end, &now);
                } else {
                    d.set_text_between(start, end, &now);
                }
            }
        });
        let b = &mut self.top().bindings;
        b.markers.push(marker.to_string());
        b.subscribe(store, move |v| {
            let text = v.to_string();
            dom.with_mut(|d| {
                if html {
                    d.replace_between(start, end, &text);
                } else {
                    d.set_text_between(start, end, &text);
                }
            });
        });
    }

    fn open_element(
        &mut self,
        cx: &Cx<'_>,
        el: &Element,
        id: Option<&str>,
        attr_marker: Option<&str>,
    ) {
        if let Some(id) = id {
            if let Some(node) = self.locate_element("id", id) {
                if self.rt.wire(id) {
                    self.wire_element(cx.scope, el, id, node);
                }
            }
        }
        if let Some(marker) = attr_marker {
            if let Some(node) = self.locate_element("data-attrbind", marker) {
                if self.rt.wire(marker) {
                    self.wire_attrs(cx.scope, el, marker, node);
                }
            }
        }
    }

    fn close_element(&mut self, _el: &Element) {}

    fn enter(&mut self, cx: &Cx<'_>, marker: &str, region: Region<'_>) {
        let bounds = self.locate_comments(marker);
        let live = bounds.is_some() && self.rt.wire(marker);
        let mut frame = Frame {
            bounds,
            live,
            bindings: Bindings::default(),
            items: Vec::new(),
            found_at: self.found.len(),
            missing_at: self.missing.len(),
            found: Vec::new(),
        };
        if live {
            let b = &mut frame.bindings;
            match region {
                Region::Component { node, child } => {
                    b.children
                        .push((cx.scope.instance.clone(), marker.to_string()));
                    for prop in &node.props {
                        let PropValue::Field(name) = &prop.value else { continue };
                        let Some(store) = cx.scope.store(name) else { continue };
                        let child = child.clone();
                        let prop = prop.name.clone();
                        b.watch_changes(store, move |v| {
                            if let Err(err) = child.set(&prop, v.clone()) {
                                tracing::warn!(%prop, %err, "prop not passed down");
                            }
                        });
                    }
                    for spec in &node.events {
                        b.emits
                            .push((child.clone(), forward_emit(child, cx.scope, spec)));
                    }
                }
                Region::Route { child: Some(_), .. } => {
                    b.children
                        .push((cx.scope.instance.clone(), marker.to_string()));
                }
                _ => {}
            }
        }
        self.stack.push(frame);
    }

    fn exit(&mut self, cx: &Cx<'_>, marker: &str, region: Region<'_>) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let bounds = match frame.bounds {
            Some(bounds) if frame.live => bounds,
            _ => {
                let top = self.top();
                top.bindings.absorb(frame.bindings);
                top.items.extend(frame.items);
                return;
            }
        };
        let (found_at, missing_at) = (frame.found_at, frame.missing_at);
        let live = match region {
            Region::Item { index, value } => {
                let mut bindings = frame.bindings;
                bindings.markers.push(marker.to_string());
                self.top().items.push(Item {
                    index,
                    value: value.clone(),
                    start: bounds.0,
                    end: bounds.1,
                    bindings,
                });
                return;
            }
            Region::Component { .. } => {
                let mut bindings = frame.bindings;
                bindings.markers.push(marker.to_string());
                self.top().bindings.absorb(bindings);
                return;
            }
            Region::If {
                block,
                entry,
                active,
            } => {
                let source = Source::If {
                    block: block.clone(),
                    entry: entry.clone(),
                    active: Cell::new(active),
                };
                let region = LiveRegion::new(&self.rt, cx, marker, bounds, source, frame.bindings);
                let mut names: Vec<&str> = block
                    .branches
                    .iter()
                    .flat_map(|b| b.condition.names())
                    .collect();
                names.sort_unstable();
                names.dedup();
                for name in names {
                    if let Some(store) = cx.scope.store(name) {
                        region.watch(store);
                    }
                }
                region
            }
            Region::Each { block, entry } => {
                let source = Source::Each {
                    block: block.clone(),
                    entry: entry.clone(),
                    items: RefCell::new(frame.items),
                };
                let region = LiveRegion::new(&self.rt, cx, marker, bounds, source, frame.bindings);
                if let Some(store) = cx.scope.store(&block.list) {
                    region.watch(store);
                }
                region
            }
            Region::Route { field, child } => {
                let page = child.map(|c| c.name().to_string()).unwrap_or_default();
                let source = Source::Route {
                    field: field.to_string(),
                    page: RefCell::new(page),
                };
                let region = LiveRegion::new(&self.rt, cx, marker, bounds, source, frame.bindings);
                if let Some(store) = cx.scope.store(field) {
                    region.watch(store);
                }
                region
            }
        };
        if let Some(found) = live.resync() {
            self.found.truncate(found_at);
            self.missing.truncate(missing_at);
            self.found.extend(found);
        }
        self.top().bindings.regions.push(live);
    }
}

/// Wires server-rendered documents to live instances.
///
/// Markers wired through one hydrator are wired at most once, however often
/// [`Hydrator::hydrate`] runs over the same document.
pub struct Hydrator {
    rt: Rc<Runtime>,
}

impl Hydrator {
    pub fn new(dom: Dom, registry: Rc<Registry>) -> Self {
        Self {
            rt: Rc::new(Runtime {
                dom,
                registry,
                wired: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.rt.dom
    }

    pub fn is_wired(&self, marker: &str) -> bool {
        self.rt.wired.borrow().contains(marker)
    }

    pub fn hydrate(&self, instance: &Instance) -> Result<Hydration, RenderError> {
        let ir = self.rt.registry.template(instance.name(), "")?;
        let scope = Scope::new(instance.clone());
        let cx = Cx {
            registry: &self.rt.registry,
            scope: &scope,
            depth: 0,
        };
        let mut v = HydrateVisitor::new(self.rt.clone());
        let walked = walk(&mut v, &cx, &ir.nodes, &mut IdCounter::new(), Mode::Emit);
        let found = std::mem::take(&mut v.found);
        let missing = std::mem::take(&mut v.missing);
        let frame = v.finish();
        if let Err(err) = walked {
            frame.bindings.release(&self.rt);
            return Err(err);
        }
        tracing::debug!(
            component = instance.name(),
            markers = found.len(),
            missing = missing.len(),
            "hydrated"
        );
        Ok(Hydration {
            markers: found,
            missing,
            bindings: Some(frame.bindings),
            rt: self.rt.clone(),
        })
    }
}

/// Result of hydrating one instance. Dropping it keeps the wiring alive; call
/// [`Hydration::release`] to take it down.
pub struct Hydration {
    markers: Vec<String>,
    missing: Vec<String>,
    bindings: Option<Bindings>,
    rt: Rc<Runtime>,
}

impl fmt::Debug for Hydration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hydration")
            .field("markers", &self.markers)
            .field("missing", &self.missing)
            .field("released", &self.bindings.is_none())
            .finish()
    }
}

impl Hydration {
    /// Markers located in the document, in walk order.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Markers the walk expected but the document lacks.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Remove every listener and subscription this hydration created.
    pub fn release(&mut self) {
        if let Some(bindings) = self.bindings.take() {
            bindings.release(&self.rt);
        }
    }
}

/// Hydrate `instance` against `dom` with a fresh [`Hydrator`].
pub fn hydrate(
    dom: &Dom,
    registry: Rc<Registry>,
    instance: &Instance,
) -> Result<Hydration, RenderError> {
    Hydrator::new(dom.clone(), registry).hydrate(instance)
}
