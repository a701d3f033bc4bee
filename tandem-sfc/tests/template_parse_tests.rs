use pretty_assertions::assert_eq;
use tandem_core::Value;
use tandem_sfc::{
    Arg, AttrPart, BindProperty, Condition, Interpolation, Modifier, PropValue, TemplateNode,
    parse_template,
};

fn text(s: &str) -> TemplateNode {
    TemplateNode::Text(s.to_string())
}

fn interp(field: &str) -> TemplateNode {
    TemplateNode::Interpolation(Interpolation {
        field: field.to_string(),
        html: false,
    })
}

#[test]
fn plain_markup_stays_text() {
    let ir = parse_template(r#"<div class="x"><p>hi</p></div>"#);
    assert!(ir.diagnostics.is_empty());
    assert_eq!(ir.nodes, vec![text(r#"<div class="x"><p>hi</p></div>"#)]);
}

#[test]
fn text_and_interpolation() {
    let ir = parse_template("<p>Hello {name}!</p>");
    assert_eq!(
        ir.nodes,
        vec![text("<p>Hello "), interp("name"), text("!</p>")]
    );
}

#[test]
fn raw_html_interpolation() {
    let ir = parse_template("{@html body}");
    assert_eq!(
        ir.nodes,
        vec![TemplateNode::Interpolation(Interpolation {
            field: "body".into(),
            html: true,
        })]
    );
}

#[test]
fn if_else_if_else() {
    let ir = parse_template("{#if a}A{:else if b > 1}B{:else}C{/if}");
    assert!(ir.diagnostics.is_empty(), "{:?}", ir.diagnostics);
    let TemplateNode::If(block) = &ir.nodes[0] else {
        panic!("expected if, got {:?}", ir.nodes[0]);
    };
    assert_eq!(block.id, "if0");
    assert_eq!(block.branches.len(), 2);
    assert_eq!(block.branches[0].condition, Condition::parse("a").unwrap());
    assert_eq!(block.branches[1].condition, Condition::parse("b > 1").unwrap());
    assert_eq!(block.branches[1].children, vec![text("B")]);
    assert_eq!(block.else_children, vec![text("C")]);
}

#[test]
fn nested_blocks_do_not_close_outer() {
    let src = "{#if a}{#if b}x{:else}y{/if}{:else}z{/if}tail";
    let ir = parse_template(src);
    assert!(ir.diagnostics.is_empty());
    assert_eq!(ir.nodes.len(), 2);
    let TemplateNode::If(outer) = &ir.nodes[0] else {
        panic!("expected if");
    };
    assert_eq!(outer.else_children, vec![text("z")]);
    let TemplateNode::If(inner) = &outer.branches[0].children[0] else {
        panic!("expected nested if");
    };
    assert_eq!(inner.else_children, vec![text("y")]);
    assert_eq!(ir.nodes[1], text("tail"));
}

#[test]
fn each_with_index_and_else() {
    let ir = parse_template("<ul>{#each items as item, i}<li>{i}: {item}</li>{:else}<li>none</li>{/each}</ul>");
    let TemplateNode::Each(each) = &ir.nodes[1] else {
        panic!("expected each, got {:?}", ir.nodes);
    };
    assert_eq!(each.id, "each0");
    assert_eq!(each.list, "items");
    assert_eq!(each.item, "item");
    assert_eq!(each.index.as_deref(), Some("i"));
    assert_eq!(
        each.body,
        vec![text("<li>"), interp("i"), text(": "), interp("item"), text("</li>")]
    );
    assert_eq!(each.else_children, vec![text("<li>none</li>")]);
}

#[test]
fn else_inside_each_inside_if_belongs_to_each() {
    let ir = parse_template("{#if a}{#each xs as x}{x}{:else}empty{/each}{:else}no{/if}");
    let TemplateNode::If(block) = &ir.nodes[0] else {
        panic!("expected if");
    };
    assert_eq!(block.else_children, vec![text("no")]);
    let TemplateNode::Each(each) = &block.branches[0].children[0] else {
        panic!("expected each");
    };
    assert_eq!(each.else_children, vec![text("empty")]);
}

#[test]
fn element_directives() {
    let src = r#"<button class="btn" id="old" @click.prevent.stop="Add('milk', 2, item)" class:active={count > 0}>+</button>"#;
    let ir = parse_template(src);
    let TemplateNode::Element(el) = &ir.nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(el.tag, "button");
    assert_eq!(el.attrs, vec![("class".to_string(), "btn".to_string())]);
    assert_eq!(el.events.len(), 1);
    let ev = &el.events[0];
    assert_eq!(ev.event, "click");
    assert_eq!(ev.modifiers, vec![Modifier::Prevent, Modifier::Stop]);
    assert_eq!(ev.method, "Add");
    assert_eq!(
        ev.args,
        vec![
            Arg::Literal(Value::from("milk")),
            Arg::Literal(Value::Int(2)),
            Arg::Name("item".into()),
        ]
    );
    assert_eq!(el.classes[0].class, "active");
    assert_eq!(el.children, vec![text("+")]);
    // the static id was dropped in favour of a generated one
    assert_eq!(ir.diagnostics.len(), 1);
}

#[test]
fn bindings_and_attribute_templates() {
    let ir = parse_template(r#"<input bind:value="name"><a href="{base}/u/{id}" title="x">go</a>"#);
    let TemplateNode::Element(input) = &ir.nodes[0] else {
        panic!("expected input");
    };
    let bind = input.bind.as_ref().expect("binding");
    assert_eq!(bind.property, BindProperty::Value);
    assert_eq!(bind.field, "name");
    assert!(input.children.is_empty());

    let TemplateNode::Element(a) = &ir.nodes[1] else {
        panic!("expected anchor");
    };
    let binding = &a.attr_bindings[0];
    assert_eq!(binding.name, "href");
    assert_eq!(
        binding.parts,
        vec![
            AttrPart::Field("base".into()),
            AttrPart::Static("/u/".into()),
            AttrPart::Field("id".into()),
        ]
    );
    assert_eq!(binding.fallback, "/u/");
    assert_eq!(a.attrs, vec![("title".to_string(), "x".to_string())]);
}

#[test]
fn components_keep_slot_raw() {
    let src = r#"<Card title="Hi" count="{n}" @close="Dismiss"><b>{x}</b>{#if y}!{/if}</Card><Badge/>"#;
    let ir = parse_template(src);
    assert!(ir.diagnostics.is_empty());
    let TemplateNode::Component(card) = &ir.nodes[0] else {
        panic!("expected component");
    };
    assert_eq!(card.id, "comp0");
    assert_eq!(card.name, "Card");
    assert_eq!(card.props[0].value, PropValue::Literal("Hi".into()));
    assert_eq!(card.props[1].value, PropValue::Field("n".into()));
    assert_eq!(card.events[0].method, "Dismiss");
    assert_eq!(card.slot, "<b>{x}</b>{#if y}!{/if}");

    let TemplateNode::Component(badge) = &ir.nodes[1] else {
        panic!("expected second component");
    };
    assert_eq!(badge.id, "comp1");
    assert!(badge.slot.is_empty());
}

#[test]
fn nested_same_name_components_match_depth() {
    let ir = parse_template("<Box><Box>inner</Box></Box>after");
    let TemplateNode::Component(outer) = &ir.nodes[0] else {
        panic!("expected component");
    };
    assert_eq!(outer.slot, "<Box>inner</Box>");
    assert_eq!(ir.nodes[1], text("after"));
}

#[test]
fn skip_regions_are_verbatim() {
    let ir = parse_template("<pre>{#if x}<b>{/if}</pre><script>let a = {b: 1};</script>");
    assert!(ir.diagnostics.is_empty());
    assert_eq!(
        ir.nodes,
        vec![text(
            "<pre>{#if x}&lt;b&gt;{/if}</pre><script>let a = {b: 1};</script>"
        )]
    );
}

#[test]
fn unterminated_if_is_literal() {
    let ir = parse_template("{#if x");
    assert_eq!(ir.nodes, vec![text("{#if x")]);
    assert_eq!(ir.diagnostics.len(), 1);
}

#[test]
fn missing_close_block_is_literal() {
    let ir = parse_template("{#if x}yes");
    assert_eq!(ir.nodes, vec![text("{#if x}yes")]);
    assert!(!ir.diagnostics.is_empty());
}

#[test]
fn malformed_inputs_never_panic() {
    let inputs = [
        "{", "}", "{{", "{/if}", "{:else}", "{#each}", "{#each xs}", "{#each xs as}",
        "<", "<div", "<div @click>", "<Comp", "<Comp>", "{@html}", "{#if a}{:else if}{/if}",
        "{#if (a}x{/if}", "<a href=\"{x\">", "{#if a}{/each}", "\u{e9}{\u{e9}}",
    ];
    for src in inputs {
        let ir = parse_template(src);
        let _ = ir.walk().count();
    }
}

#[test]
fn traversal_helpers_follow_source_order() {
    let src = r#"{a}{#if c1}{b}<i @click="M1">{c}</i>{:else}<Child @x="M2"/>{/if}{#each xs as x}<input bind:checked="done">{x}{/each}{d}"#;
    let ir = parse_template(src);
    let exprs: Vec<&str> = ir.expressions().map(|i| i.field.as_str()).collect();
    assert_eq!(exprs, vec!["a", "b", "c", "x", "d"]);
    let methods: Vec<&str> = ir.events().map(|e| e.method.as_str()).collect();
    assert_eq!(methods, vec!["M1", "M2"]);
    assert_eq!(ir.conditions().count(), 1);
    assert_eq!(ir.components().count(), 1);
    assert_eq!(ir.bindings().count(), 1);
}
