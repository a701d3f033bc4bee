use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tandem_core::Value;
use tandem_dom::{Dom, NodeId};
use tandem_renderer::{ComponentDef, Hydration, Hydrator, Instance, Registry, hydrate, render_instance};

struct Mounted {
    registry: Rc<Registry>,
    inst: Instance,
    dom: Dom,
    hydration: Hydration,
}

impl Mounted {
    fn new(registry: Registry, root: &str) -> Self {
        let registry = Rc::new(registry);
        let inst = registry.instantiate(root).unwrap();
        let rendered = render_instance(&registry, &inst).unwrap();
        let dom = Dom::parse(&rendered.html);
        let hydration = hydrate(&dom, registry.clone(), &inst).unwrap();
        assert_eq!(hydration.markers(), rendered.markers.as_slice());
        assert!(hydration.missing().is_empty(), "{:?}", hydration.missing());
        Self {
            registry,
            inst,
            dom,
            hydration,
        }
    }

    /// What a fresh server render of the current state looks like.
    fn fresh(&self) -> String {
        render_instance(&self.registry, &self.inst).unwrap().html
    }

    fn html(&self) -> String {
        self.dom.to_html()
    }

    fn by_id(&self, id: &str) -> NodeId {
        self.dom
            .with(|d| d.element_by_id(id))
            .unwrap_or_else(|| panic!("no element {id} in {}", self.html()))
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.with(|d| d.attr(node, name).map(str::to_string))
    }
}

fn log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

fn increment(inst: &Instance, field: &str) {
    inst.update(field, |v| {
        if let Value::Int(n) = v {
            *n += 1;
        }
    })
    .unwrap();
}

fn counter() -> Registry {
    Registry::new().with(
        ComponentDef::new("Counter", r#"<p>Count: {count}</p><button @click="inc">+</button>"#)
            .field("count", 0)
            .method("inc", |inst, _| increment(inst, "count")),
    )
}

#[test]
fn click_updates_text() {
    let m = Mounted::new(counter(), "Counter");
    let button = m.by_id("ev0");
    m.dom.click(button);
    m.dom.click(button);
    assert_eq!(m.inst.get("count"), Some(Value::Int(2)));
    assert_eq!(
        m.html(),
        r#"<p>Count: <!--t0s-->2<!--t0--></p><button id="ev0">+</button>"#
    );
}

#[test]
fn release_detaches_everything() {
    let mut m = Mounted::new(counter(), "Counter");
    let button = m.by_id("ev0");
    m.hydration.release();
    assert_eq!(m.dom.listener_count(button, "click"), 0);
    assert_eq!(m.inst.store("count").unwrap().subscriber_count(), 0);
    m.inst.set("count", 5).unwrap();
    assert!(m.html().contains("<!--t0s-->0<!--t0-->"));
}

#[test]
fn hydrating_twice_wires_once() {
    let registry = Rc::new(counter());
    let inst = registry.instantiate("Counter").unwrap();
    let html = render_instance(&registry, &inst).unwrap().html;
    let hydrator = Hydrator::new(Dom::parse(&html), registry.clone());
    let first = hydrator.hydrate(&inst).unwrap();
    let second = hydrator.hydrate(&inst).unwrap();
    assert_eq!(first.markers(), second.markers());
    assert!(hydrator.is_wired("ev0"));

    let button = hydrator.dom().with(|d| d.element_by_id("ev0")).unwrap();
    hydrator.dom().click(button);
    assert_eq!(inst.get("count"), Some(Value::Int(1)));
}

#[test]
fn missing_markers_are_reported_and_the_rest_still_works() {
    let registry = Rc::new(
        Registry::new().with(
            ComponentDef::new("Two", "<p>{a}</p><p>{b}</p>")
                .field("a", "x")
                .field("b", "y"),
        ),
    );
    let inst = registry.instantiate("Two").unwrap();
    let html = render_instance(&registry, &inst).unwrap().html.replace("<!--t1s-->", "");
    let dom = Dom::parse(&html);
    let hydration = hydrate(&dom, registry, &inst).unwrap();
    assert_eq!(hydration.missing(), ["t1".to_string()]);
    assert_eq!(hydration.markers(), ["t0".to_string()]);

    inst.set("a", "z").unwrap();
    inst.set("b", "w").unwrap();
    assert_eq!(dom.to_html(), "<p><!--t0s-->z<!--t0--></p><p>y<!--t1--></p>");
}

fn show_tail() -> Registry {
    Registry::new().with(
        ComponentDef::new(
            "ShowTail",
            "{#if show}<b>{name}</b>{:else}<i>none</i>{/if}<span>{tail}</span>",
        )
        .field("show", false)
        .field("name", "Ann")
        .field("tail", "end"),
    )
}

#[test]
fn if_flip_renders_the_new_branch_with_the_server_names() {
    let m = Mounted::new(show_tail(), "ShowTail");

    m.inst.set("show", true).unwrap();
    assert_eq!(m.html(), m.fresh());
    assert!(m.html().contains("<!--t0s-->Ann<!--t0-->"));

    m.inst.set("name", "Bob").unwrap();
    assert_eq!(m.html(), m.fresh());

    m.inst.set("show", false).unwrap();
    m.inst.set("name", "Cy").unwrap();
    m.inst.set("tail", "fin").unwrap();
    assert_eq!(m.html(), m.fresh());
    assert_eq!(
        m.html(),
        "<!--if0s--><i>none</i><!--if0--><span><!--t1s-->fin<!--t1--></span>"
    );
}

#[test]
fn if_only_rerenders_when_the_branch_changes() {
    let registry = Registry::new().with(
        ComponentDef::new("Gate", r#"{#if n > 1}<button @click="hit">big</button>{/if}"#)
            .field("n", 5)
            .field("hits", 0)
            .method("hit", |inst, _| increment(inst, "hits")),
    );
    let m = Mounted::new(registry, "Gate");
    let button = m.by_id("ev0");
    m.inst.set("n", 6).unwrap();
    // same branch: the button node survives
    assert_eq!(m.by_id("ev0"), button);
    m.dom.click(button);
    assert_eq!(m.inst.get("hits"), Some(Value::Int(1)));

    m.inst.set("n", 0).unwrap();
    assert_eq!(m.html(), "<!--if0s--><!--if0-->");
    m.inst.set("n", 2).unwrap();
    let again = m.by_id("ev0");
    m.dom.click(again);
    assert_eq!(m.inst.get("hits"), Some(Value::Int(2)));
}

fn list(items: Vec<&str>) -> Registry {
    Registry::new().with(
        ComponentDef::new(
            "List",
            r#"<ul>{#each items as item, i}<li><button @click="remove(item)">{i}:{item}</button></li>{:else}<li>none</li>{/each}</ul>"#,
        )
        .field("items", items)
        .method("remove", |inst, args| {
            let gone = args[0].clone();
            inst.update("items", |v| {
                if let Value::List(xs) = v {
                    xs.retain(|x| *x != gone);
                }
            })
            .unwrap();
        }),
    )
}

fn items(values: &[&str]) -> Value {
    Value::from(values.to_vec())
}

#[test]
fn each_patches_appends_and_removals() {
    let m = Mounted::new(list(vec!["a", "b"]), "List");

    m.inst.set("items", items(&["a", "b", "c"])).unwrap();
    assert_eq!(m.html(), m.fresh());

    m.inst.set("items", items(&["b", "c"])).unwrap();
    assert_eq!(m.html(), m.fresh());
    assert!(m.html().contains("<!--each0_0_t0s-->0<!--each0_0_t0-->:<!--each0_0_t1s-->b"));

    m.inst.set("items", items(&["z", "b", "c"])).unwrap();
    assert_eq!(m.html(), m.fresh());
}

#[test]
fn each_keeps_untouched_items_in_place() {
    let m = Mounted::new(list(vec!["a", "b"]), "List");
    let first = m.by_id("each0_0_ev0");
    m.inst.set("items", items(&["a", "b", "c"])).unwrap();
    assert_eq!(m.by_id("each0_0_ev0"), first);
}

#[test]
fn shifted_items_get_working_listeners() {
    let m = Mounted::new(list(vec!["a", "b", "c"]), "List");

    m.dom.click(m.by_id("each0_1_ev0"));
    assert_eq!(m.inst.get("items"), Some(items(&["a", "c"])));
    assert_eq!(m.html(), m.fresh());

    // "c" moved to index 1 and answers under its new name
    m.dom.click(m.by_id("each0_1_ev0"));
    assert_eq!(m.inst.get("items"), Some(items(&["a"])));
    assert_eq!(m.html(), m.fresh());

    m.dom.click(m.by_id("each0_0_ev0"));
    assert_eq!(m.html(), "<ul><!--each0s--><li>none</li><!--each0--></ul>");
}

#[test]
fn each_falls_back_to_a_full_render() {
    let m = Mounted::new(list(vec!["a", "a"]), "List");

    // duplicates: the set diff has nothing to say
    m.inst.set("items", items(&["a"])).unwrap();
    assert_eq!(m.html(), m.fresh());

    m.inst.set("items", items(&["x", "y"])).unwrap();
    m.inst.set("items", items(&["y", "x"])).unwrap();
    assert_eq!(m.html(), m.fresh());

    m.inst.set("items", items(&[])).unwrap();
    assert_eq!(m.html(), m.fresh());
    m.inst.set("items", items(&["q"])).unwrap();
    assert_eq!(m.html(), m.fresh());

    m.dom.click(m.by_id("each0_0_ev0"));
    assert_eq!(m.inst.get("items"), Some(items(&[])));
}

#[test]
fn two_way_value_binding() {
    let registry = Registry::new().with(
        ComponentDef::new("Form", r#"<input bind:value="name"><input bind:value="age"><p>{name} {age}</p>"#)
            .field("name", "Ann")
            .field("age", 3),
    );
    let m = Mounted::new(registry, "Form");
    let name = m.by_id("bind0");
    let age = m.by_id("bind1");

    m.dom.input(name, "Bob");
    m.dom.input(age, "41");
    assert_eq!(m.inst.get("name"), Some(Value::from("Bob")));
    assert_eq!(m.inst.get("age"), Some(Value::Int(41)));
    assert_eq!(m.html(), m.fresh());

    m.inst.set("name", "Cy").unwrap();
    assert_eq!(m.attr(name, "value").as_deref(), Some("Cy"));
}

#[test]
fn checkbox_binding() {
    let registry = Registry::new().with(
        ComponentDef::new("Todo", r#"<input type="checkbox" bind:checked="done">{#if done}ok{/if}"#)
            .field("done", false),
    );
    let m = Mounted::new(registry, "Todo");
    let boxed = m.by_id("bind0");

    m.dom.set_checked(boxed, true);
    assert_eq!(m.inst.get("done"), Some(Value::Bool(true)));
    assert!(m.html().contains("<!--if0s-->ok<!--if0-->"));

    m.inst.set("done", false).unwrap();
    assert_eq!(m.attr(boxed, "checked"), None);
    assert_eq!(m.html(), m.fresh());
}

#[test]
fn class_toggles_and_templated_attributes() {
    let registry = Registry::new().with(
        ComponentDef::new(
            "Row",
            r#"<li class="item" class:done={done} class:big={n > 2}>x</li><a href="/u/{n}/{name}">go</a>"#,
        )
        .field("done", false)
        .field("n", 1)
        .field("name", "ann"),
    );
    let m = Mounted::new(registry, "Row");
    let li = m.by_id("attr0");
    let a = m.dom.with(|d| d.element_by_attr("data-attrbind", "attr1")).unwrap();

    m.inst.set("done", true).unwrap();
    m.inst.set("n", 3).unwrap();
    assert!(m.dom.with(|d| d.has_class(li, "done") && d.has_class(li, "big")));
    assert_eq!(m.attr(a, "href").as_deref(), Some("/u/3/ann"));

    m.inst.set("done", false).unwrap();
    m.inst.set("name", "bo").unwrap();
    assert_eq!(m.attr(li, "class").as_deref(), Some("item big"));
    assert_eq!(m.attr(a, "href").as_deref(), Some("/u/3/bo"));
}

#[test]
fn raw_html_interpolation_is_reparsed() {
    let registry = Registry::new()
        .with(ComponentDef::new("Doc", "<div>{@html body}</div>").field("body", "<b>1</b>"));
    let m = Mounted::new(registry, "Doc");
    m.inst.set("body", "<i>2</i><i>3</i>").unwrap();
    assert_eq!(m.html(), "<div><!--t0s--><i>2</i><i>3</i><!--t0--></div>");
}

#[test]
fn event_modifiers() {
    let calls = log();
    let c1 = calls.clone();
    let c2 = calls.clone();
    let c3 = calls.clone();
    let c4 = calls.clone();
    let registry = Registry::new().with(
        ComponentDef::new(
            "Mods",
            concat!(
                r#"<div @click="outer"><button @click.stop.prevent="inner(1, label)">b</button></div>"#,
                r#"<button @click.once="once">o</button>"#,
                r#"<div @click.self="own"><span>in</span></div>"#,
            ),
        )
        .field("label", "x")
        .method("outer", move |_, _| c1.borrow_mut().push("outer".into()))
        .method("inner", move |_, args| {
            c2.borrow_mut()
                .push(format!("inner {} {}", args[0], args[1]))
        })
        .method("once", move |_, _| c3.borrow_mut().push("once".into()))
        .method("own", move |_, _| c4.borrow_mut().push("own".into())),
    );
    let m = Mounted::new(registry, "Mods");

    let ev = m.dom.click(m.by_id("ev1"));
    assert!(ev.default_prevented());
    assert!(ev.propagation_stopped());
    m.dom.click(m.by_id("ev0"));
    assert_eq!(*calls.borrow(), vec!["inner 1 x", "outer"]);

    calls.borrow_mut().clear();
    let once = m.by_id("ev2");
    m.dom.click(once);
    m.dom.click(once);
    assert_eq!(*calls.borrow(), vec!["once"]);

    calls.borrow_mut().clear();
    let own = m.by_id("ev3");
    let span = m.dom.with(|d| d.children(own)[0]);
    m.dom.click(span);
    assert!(calls.borrow().is_empty());
    m.dom.click(own);
    assert_eq!(*calls.borrow(), vec!["own"]);
}

#[test]
fn unknown_method_is_ignored() {
    let registry =
        Registry::new().with(ComponentDef::new("Bad", r#"<button @click="nothing">x</button>"#));
    let m = Mounted::new(registry, "Bad");
    m.dom.click(m.by_id("ev0"));
    assert_eq!(m.html(), r#"<button id="ev0">x</button>"#);
}

fn family() -> Registry {
    Registry::new()
        .with(
            ComponentDef::new(
                "Parent",
                r#"<Child label="{title}" @picked="choose"/><p>{chosen}</p>"#,
            )
            .field("title", "Hello")
            .field("chosen", "")
            .method("choose", |inst, args| {
                inst.set("chosen", args[0].clone()).unwrap();
            }),
        )
        .with(
            ComponentDef::new("Child", r#"<button @click="pick">{label}</button>"#)
                .field("label", "")
                .method("pick", |inst, _| {
                    inst.emit("picked", &[Value::from("from child")]);
                }),
        )
}

#[test]
fn component_props_flow_down_and_events_flow_up() {
    let m = Mounted::new(family(), "Parent");
    assert_eq!(
        m.hydration.markers(),
        ["comp0", "comp0_ev0", "comp0_t0", "t0"].map(String::from)
    );

    m.inst.set("title", "New").unwrap();
    assert_eq!(m.inst.child("comp0").unwrap().get("label"), Some(Value::from("New")));
    assert!(m.html().contains("<!--comp0_t0s-->New<!--comp0_t0-->"));

    m.dom.click(m.by_id("comp0_ev0"));
    assert_eq!(m.inst.get("chosen"), Some(Value::from("from child")));
    assert_eq!(m.html(), m.fresh());
}

#[test]
fn components_inside_a_branch_are_dropped_with_it() {
    let registry = family().with(
        ComponentDef::new("Shell", r#"{#if open}<Child label="x"/>{/if}"#).field("open", true),
    );
    let m = Mounted::new(registry, "Shell");
    assert!(m.inst.child("if0_comp0").is_none());
    assert!(m.inst.child("comp0").is_some());

    m.inst.set("open", false).unwrap();
    assert!(m.inst.child_keys().is_empty());
    m.inst.set("open", true).unwrap();
    assert_eq!(m.inst.child_keys(), vec!["comp0"]);
    assert_eq!(m.html(), m.fresh());
}

#[test]
fn route_swaps_pages() {
    let registry = Registry::new()
        .with(ComponentDef::new("App", "<nav>{page}</nav>").route("page", &["Home", "About"], "Home"))
        .with(ComponentDef::new("Home", r#"<h1 @click="bump">Home {n}</h1>"#).field("n", 0).method("bump", |inst, _| increment(inst, "n")))
        .with(ComponentDef::new("About", "<h1>About {n}</h1>").field("n", 1));
    let m = Mounted::new(registry, "App");
    let home = m.inst.child("route0").unwrap();
    m.dom.click(m.by_id("route0_ev0"));
    assert_eq!(home.get("n"), Some(Value::Int(1)));

    m.inst.navigate("page", "About").unwrap();
    assert_eq!(m.html(), m.fresh());
    let about = m.inst.child("route0").unwrap();
    assert_eq!(about.name(), "About");
    about.set("n", 9).unwrap();
    assert!(m.html().contains("<!--route0_t0s-->9<!--route0_t0-->"));

    m.inst.navigate("page", "Home").unwrap();
    assert_eq!(m.html(), m.fresh());
    // a fresh Home instance
    assert!(m.html().contains("<!--route0_t0s-->0<!--route0_t0-->"));
    assert!(m.inst.navigate("page", "Nowhere").is_err());
}

/// Server render, then apply `change` before the stale document is hydrated.
fn mount_after(registry: Registry, root: &str, change: impl FnOnce(&Instance)) -> Mounted {
    let registry = Rc::new(registry);
    let inst = registry.instantiate(root).unwrap();
    let html = render_instance(&registry, &inst).unwrap().html;
    change(&inst);
    let dom = Dom::parse(&html);
    let hydration = hydrate(&dom, registry.clone(), &inst).unwrap();
    Mounted {
        registry,
        inst,
        dom,
        hydration,
    }
}

impl Mounted {
    fn fresh_markers(&self) -> Vec<String> {
        render_instance(&self.registry, &self.inst).unwrap().markers
    }
}

#[test]
fn branch_changed_before_hydration_is_redrawn() {
    let m = mount_after(show_tail(), "ShowTail", |inst| {
        inst.set("show", true).unwrap();
        inst.set("tail", "fin").unwrap();
    });
    assert_eq!(m.hydration.markers(), ["if0", "t0", "t1"].map(String::from));
    assert_eq!(m.hydration.markers(), m.fresh_markers().as_slice());
    assert!(m.hydration.missing().is_empty(), "{:?}", m.hydration.missing());
    assert_eq!(m.html(), m.fresh());

    m.inst.set("name", "Bob").unwrap();
    assert!(m.html().contains("<!--t0s-->Bob<!--t0-->"), "{}", m.html());
    m.inst.set("show", false).unwrap();
    assert_eq!(m.html(), m.fresh());
}

#[test]
fn list_changed_before_hydration_is_redrawn() {
    let grown = mount_after(list(vec!["a", "b"]), "List", |inst| {
        inst.set("items", items(&["a", "b", "c"])).unwrap();
    });
    assert_eq!(grown.hydration.markers(), grown.fresh_markers().as_slice());
    assert!(grown.hydration.missing().is_empty());
    assert_eq!(grown.html(), grown.fresh());
    grown.dom.click(grown.by_id("each0_2_ev0"));
    assert_eq!(grown.inst.get("items"), Some(items(&["a", "b"])));
    assert_eq!(grown.html(), grown.fresh());

    let shrunk = mount_after(list(vec!["a", "b", "c"]), "List", |inst| {
        inst.set("items", items(&["b"])).unwrap();
    });
    assert_eq!(shrunk.hydration.markers(), shrunk.fresh_markers().as_slice());
    assert_eq!(shrunk.html(), shrunk.fresh());
    shrunk.dom.click(shrunk.by_id("each0_0_ev0"));
    assert_eq!(
        shrunk.html(),
        "<ul><!--each0s--><li>none</li><!--each0--></ul>"
    );
}

#[test]
fn page_changed_before_hydration_is_redrawn() {
    let registry = Registry::new()
        .with(ComponentDef::new("App", "<nav>{page}</nav>").route("page", &["Home", "About"], "Home"))
        .with(ComponentDef::new("Home", "<h1>Home</h1>"))
        .with(ComponentDef::new("About", "<h1>About {n}</h1>").field("n", 1));
    let m = mount_after(registry, "App", |inst| inst.navigate("page", "About").unwrap());
    assert_eq!(m.html(), m.fresh());
    assert_eq!(m.hydration.markers(), m.fresh_markers().as_slice());
    assert!(m.hydration.missing().is_empty());

    let about = m.inst.child("route0").unwrap();
    assert_eq!(about.name(), "About");
    about.set("n", 4).unwrap();
    assert!(m.html().contains("<!--route0_t0s-->4<!--route0_t0-->"), "{}", m.html());
}

#[test]
fn unchanged_props_are_not_passed_down_again() {
    let m = Mounted::new(family(), "Parent");
    let label = m.inst.child("comp0").unwrap().store("label").unwrap();
    let writes = Rc::new(RefCell::new(0));
    let counted = writes.clone();
    label.on_change(move |_| *counted.borrow_mut() += 1);

    m.inst.set("title", "Hello").unwrap();
    assert_eq!(*writes.borrow(), 0);
    m.inst.set("title", "Bye").unwrap();
    assert_eq!(*writes.borrow(), 1);
    assert!(m.html().contains("<!--comp0_t0s-->Bye<!--comp0_t0-->"));
}

/// `depth` levels of `branches` sibling blocks, alternating between a
/// conditional and a list. Every conditional reads its own flag; the innermost
/// content is a component.
fn nested_template(depth: usize, branches: usize, flags: &mut usize) -> String {
    if depth == 0 {
        return r#"<Leaf label="{label}"/>"#.to_string();
    }
    let mut out = String::new();
    for b in 0..branches {
        let inner = nested_template(depth - 1, branches, flags);
        if b % 2 == 0 {
            let flag = *flags;
            *flags += 1;
            out.push_str(&format!(
                "{{#if f{flag}}}<p>{inner}</p>{{:else}}<s>{{label}}</s>{{/if}}"
            ));
        } else {
            out.push_str(&format!(
                "<ul>{{#each xs as x, i}}<li>{{i}}{{x}}{inner}</li>{{:else}}<li>-</li>{{/each}}</ul>"
            ));
        }
    }
    out
}

fn nested(depth: usize, branches: usize) -> (Registry, usize) {
    let mut flags = 0;
    let template = nested_template(depth, branches, &mut flags);
    let mut tree = ComponentDef::new("Tree", template)
        .field("label", "L")
        .field("xs", vec!["a", "b"]);
    for flag in 0..flags {
        tree = tree.field(format!("f{flag}"), true);
    }
    let leaf = ComponentDef::new("Leaf", r#"<b @click="hit">{label}{hits}</b>"#)
        .field("label", "")
        .field("hits", 0)
        .method("hit", |inst, _| increment(inst, "hits"));
    (Registry::new().with(tree).with(leaf), flags)
}

fn flag(n: usize) -> String {
    format!("f{n}")
}

#[test]
fn generated_trees_hydrate_and_stay_in_sync() {
    for depth in 1..=3 {
        for branches in 1..=3 {
            let (registry, flags) = nested(depth, branches);
            let m = Mounted::new(registry, "Tree");
            let case = format!("depth {depth}, branches {branches}");

            for f in 0..flags {
                m.inst.set(&flag(f), false).unwrap();
                assert_eq!(m.html(), m.fresh(), "{case}, f{f} off");
                m.inst.set(&flag(f), true).unwrap();
                assert_eq!(m.html(), m.fresh(), "{case}, f{f} on");
            }
            m.inst.set("label", "M").unwrap();
            assert_eq!(m.html(), m.fresh(), "{case}, label");
            for xs in [vec!["b", "c", "a"], vec!["c"], vec![]] {
                m.inst.set("xs", items(&xs)).unwrap();
                assert_eq!(m.html(), m.fresh(), "{case}, xs {xs:?}");
            }

            // a second hydration of the current state claims the same markers
            let rendered = render_instance(&m.registry, &m.inst).unwrap();
            let dom = Dom::parse(&rendered.html);
            let again = hydrate(&dom, m.registry.clone(), &m.inst).unwrap();
            assert_eq!(again.markers(), rendered.markers.as_slice(), "{case}");
            assert!(again.missing().is_empty(), "{case}: {:?}", again.missing());
        }
    }
}

#[test]
fn generated_trees_recover_from_state_changed_before_hydration() {
    for depth in 1..=3 {
        for branches in 1..=3 {
            let (_, flags) = nested(depth, branches);
            for f in 0..flags {
                let m = mount_after(nested(depth, branches).0, "Tree", |inst| {
                    inst.set(&flag(f), false).unwrap();
                });
                let case = format!("depth {depth}, branches {branches}, f{f}");
                assert_eq!(m.hydration.markers(), m.fresh_markers().as_slice(), "{case}");
                assert!(m.hydration.missing().is_empty(), "{case}: {:?}", m.hydration.missing());
                assert_eq!(m.html(), m.fresh(), "{case}");

                m.inst.set(&flag(f), true).unwrap();
                assert_eq!(m.html(), m.fresh(), "{case}, back on");
            }

            let m = mount_after(nested(depth, branches).0, "Tree", |inst| {
                inst.set("xs", items(&["b", "z", "a"])).unwrap();
            });
            let case = format!("depth {depth}, branches {branches}, xs");
            assert_eq!(m.hydration.markers(), m.fresh_markers().as_slice(), "{case}");
            assert_eq!(m.html(), m.fresh(), "{case}");
        }
    }
}
