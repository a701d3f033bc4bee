//! Server pass: templates to HTML with marker comments.

use tandem_dom::html::{escape_attr, escape_text, is_void};
use tandem_sfc::{BindProperty, Element, IdCounter, Interpolation, Lookup, TemplateNode};

use crate::component::Instance;
use crate::error::RenderError;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::walk::{Cx, Mode, Region, Visitor, walk};

/// Output of a server render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rendered {
    pub html: String,
    /// Every marker written, in document order.
    pub markers: Vec<String>,
}

#[derive(Default)]
pub(crate) struct HtmlVisitor {
    pub out: String,
    pub markers: Vec<String>,
}

impl HtmlVisitor {
    fn attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape_attr(value));
        self.out.push('"');
    }
}

/// Rendered value of a templated attribute.
pub(crate) fn attr_value(template: &tandem_sfc::AttrBinding, scope: &Scope) -> String {
    template.render(|name| scope.lookup(name).map(|v| v.to_string()).unwrap_or_default())
}

impl Visitor for HtmlVisitor {
    fn text(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn interpolation(&mut self, cx: &Cx<'_>, marker: &str, node: &Interpolation) {
        let value = cx.scope.value(&node.field).to_string();
        self.out.push_str(&format!("<!--{marker}s-->"));
        if node.html {
            self.out.push_str(&value);
        } else {
            self.out.push_str(&escape_text(&value));
        }
        self.out.push_str(&format!("<!--{marker}-->"));
        self.markers.push(marker.to_string());
    }

    fn open_element(
        &mut self,
        cx: &Cx<'_>,
        el: &Element,
        id: Option<&str>,
        attr_marker: Option<&str>,
    ) {
        let scope = cx.scope;
        self.out.push('<');
        self.out.push_str(&el.tag);

        let mut classes: Vec<String> = el
            .attrs
            .iter()
            .filter(|(k, _)| k == "class")
            .flat_map(|(_, v)| v.split_whitespace().map(str::to_string))
            .collect();
        for toggle in &el.classes {
            if toggle.condition.eval(scope) && !classes.contains(&toggle.class) {
                classes.push(toggle.class.clone());
            }
        }
        for (k, v) in &el.attrs {
            if k == "class" {
                continue;
            }
            if el.bind.as_ref().is_some_and(|b| b.property.attr() == k) {
                continue;
            }
            self.attr(k, v);
        }
        if !classes.is_empty() {
            self.attr("class", &classes.join(" "));
        }
        for binding in &el.attr_bindings {
            let value = attr_value(binding, scope);
            self.attr(&binding.name, &value);
        }
        if let Some(bind) = &el.bind {
            let value = scope.value(&bind.field);
            match bind.property {
                BindProperty::Value => self.attr("value", &value.to_string()),
                BindProperty::Checked => {
                    if value.truthy() {
                        self.out.push_str(" checked");
                    }
                }
            }
        }
        if let Some(id) = id {
            self.attr("id", id);
            self.markers.push(id.to_string());
        }
        if let Some(m) = attr_marker {
            self.attr("data-attrbind", m);
            self.markers.push(m.to_string());
        }
        self.out.push('>');
    }

    fn close_element(&mut self, el: &Element) {
        if !is_void(&el.tag) {
            self.out.push_str(&format!("</{}>", el.tag));
        }
    }

    fn enter(&mut self, _cx: &Cx<'_>, marker: &str, _region: Region<'_>) {
        self.out.push_str(&format!("<!--{marker}s-->"));
        self.markers.push(marker.to_string());
    }

    fn exit(&mut self, _cx: &Cx<'_>, marker: &str, _region: Region<'_>) {
        self.out.push_str(&format!("<!--{marker}-->"));
    }
}

/// Render `nodes` from `ids` as it would appear inside a full render.
pub(crate) fn render_nodes(
    cx: &Cx<'_>,
    nodes: &[TemplateNode],
    ids: &mut IdCounter,
) -> Result<Rendered, RenderError> {
    let mut v = HtmlVisitor::default();
    walk(&mut v, cx, nodes, ids, Mode::Emit)?;
    Ok(Rendered {
        html: v.out,
        markers: v.markers,
    })
}

/// Render a component instance in its current state.
pub fn render_instance(registry: &Registry, instance: &Instance) -> Result<Rendered, RenderError> {
    let ir = registry.template(instance.name(), "")?;
    let scope = Scope::new(instance.clone());
    let cx = Cx {
        registry,
        scope: &scope,
        depth: 0,
    };
    let rendered = render_nodes(&cx, &ir.nodes, &mut IdCounter::new())?;
    tracing::debug!(
        component = instance.name(),
        markers = rendered.markers.len(),
        "rendered"
    );
    Ok(rendered)
}

/// Render a fresh instance of `root` in its initial state.
pub fn render_to_string(registry: &Registry, root: &str) -> Result<Rendered, RenderError> {
    render_instance(registry, &registry.instantiate(root)?)
}
