//! DOM listeners for `on:`, `bind:` and the component-event forwarding.

use std::cell::Cell;
use std::rc::Rc;

use tandem_core::Value;
use tandem_dom::{Dom, Event, ListenerId, NodeId};
use tandem_sfc::{BindProperty, EventSpec, InputBinding, Modifier};

use crate::component::{EmitId, Instance};
use crate::scope::Scope;

/// Attach `spec` to `node`. The handler runs on the scope's instance with the
/// arguments resolved at dispatch time.
pub(crate) fn listen(dom: &Dom, node: NodeId, scope: &Scope, spec: &EventSpec) -> ListenerId {
    let scope = scope.clone();
    let spec = spec.clone();
    let fired = Rc::new(Cell::new(false));
    dom.add_event_listener(node, &spec.event.clone(), move |ev: &Event| {
        if spec.has(Modifier::SelfOnly) && ev.target != ev.current_target() {
            return;
        }
        if spec.has(Modifier::Once) && fired.replace(true) {
            return;
        }
        if spec.has(Modifier::Prevent) {
            ev.prevent_default();
        }
        if spec.has(Modifier::Stop) {
            ev.stop_propagation();
        }
        let args = scope.args(&spec.args);
        if let Err(err) = scope.instance.call(&spec.method, &args) {
            tracing::warn!(event = %spec.event, %err, "handler not run");
        }
    })
}

/// Copy user edits of a bound input back into its field.
pub(crate) fn bind_input(dom: &Dom, node: NodeId, scope: &Scope, bind: &InputBinding) -> ListenerId {
    let scope = scope.clone();
    let bind = bind.clone();
    let reader = dom.clone();
    dom.add_event_listener(node, bind.property.event(), move |_ev: &Event| {
        let value = match bind.property {
            BindProperty::Value => {
                let text = reader.with(|d| d.attr(node, "value").unwrap_or_default().to_string());
                scope.value(&bind.field).coerce(&text)
            }
            BindProperty::Checked => Value::Bool(reader.with(|d| d.has_attr(node, "checked"))),
        };
        if let Err(err) = scope.instance.set(&bind.field, value) {
            tracing::warn!(field = %bind.field, %err, "binding not written");
        }
    })
}

/// Reflect a bound field into the element.
pub(crate) fn write_bound(dom: &Dom, node: NodeId, property: BindProperty, value: &Value) {
    dom.with_mut(|d| match property {
        BindProperty::Value => {
            let text = value.to_string();
            if d.attr(node, "value") != Some(text.as_str()) {
                d.set_attr(node, "value", text);
            }
        }
        BindProperty::Checked => {
            if value.truthy() {
                d.set_attr(node, "checked", "");
            } else {
                d.remove_attr(node, "checked");
            }
        }
    });
}

/// Route a child's emitted event to a method of the parent. With no arguments
/// written in the template the emitted payload is passed through.
pub(crate) fn forward_emit(child: &Instance, parent: &Scope, spec: &EventSpec) -> EmitId {
    let parent = parent.clone();
    let spec = spec.clone();
    child.on_emit(&spec.event.clone(), move |payload: &[Value]| {
        let args = if spec.args.is_empty() {
            payload.to_vec()
        } else {
            parent.args(&spec.args)
        };
        if let Err(err) = parent.instance.call(&spec.method, &args) {
            tracing::warn!(event = %spec.event, %err, "component event not handled");
        }
    })
}
