use tandem_core::{ComponentRef, Value, ValueKind};
use tandem_sfc::{ScriptError, compile_component, introspect};

const TODO_SCRIPT: &str = r#"
pub struct TodoList {
    pub items: Vec<String>,
    pub draft: String,
    pub count: i64,
    pub ratio: f64,
    pub done: bool,
}

impl TodoList {
    pub fn new() -> Self {
        Self {
            items: vec!["milk".to_string(), "eggs".into()],
            draft: String::new(),
            count: 2,
            ratio: 1,
            done: false,
        }
    }

    pub fn add(&mut self) {}
    pub fn remove(&mut self, index: i64) {}
    fn helper() -> i64 { 0 }
}
"#;

#[test]
fn reads_fields_defaults_and_methods() {
    let info = introspect(TODO_SCRIPT, "TodoList").unwrap();
    assert_eq!(info.name, "TodoList");
    let kinds: Vec<(&str, ValueKind)> = info.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("items", ValueKind::List),
            ("draft", ValueKind::Str),
            ("count", ValueKind::Int),
            ("ratio", ValueKind::Float),
            ("done", ValueKind::Bool),
        ]
    );
    assert_eq!(info.field("items").unwrap().default, Value::from(vec!["milk", "eggs"]));
    // String::new() is not a literal: zero value
    assert_eq!(info.field("draft").unwrap().default, Value::from(""));
    assert_eq!(info.field("count").unwrap().default, Value::Int(2));
    assert_eq!(info.field("ratio").unwrap().default, Value::Float(1.0));
    assert_eq!(info.methods, vec!["add", "remove"]);
}

#[test]
fn route_attribute_marks_component_fields() {
    let src = r#"
pub struct App {
    #[route("Home", "About")]
    pub page: Route,
    #[route("Inbox", "Sent")]
    pub tab: Route,
}
impl Default for App {
    fn default() -> Self { App { page: Route::new("About"), tab: Route::new("Nowhere") } }
}
"#;
    let info = introspect(src, "App").unwrap();
    let page = info.field("page").unwrap();
    assert_eq!(page.kind, ValueKind::Component);
    assert_eq!(page.routes, vec!["Home", "About"]);
    assert_eq!(page.default, Value::Component(ComponentRef::new("About")));
    // unknown initial route falls back to the first option
    assert_eq!(
        info.field("tab").unwrap().default,
        Value::Component(ComponentRef::new("Inbox"))
    );

    let schema = info.schema();
    assert_eq!(schema.routes["page"], vec!["Home".to_string(), "About".to_string()]);
    // trait impls do not contribute handlers
    assert!(info.methods.is_empty());
}

#[test]
fn prefers_the_struct_named_after_the_component() {
    let src = "struct Helper { x: i64 } struct Counter { count: i64 }";
    let info = introspect(src, "Counter").unwrap();
    assert_eq!(info.fields.len(), 1);
    assert_eq!(info.fields[0].name, "count");
}

#[test]
fn empty_script_has_no_state() {
    let info = introspect("   ", "Static").unwrap();
    assert!(info.fields.is_empty());
    assert!(info.methods.is_empty());
}

#[test]
fn script_errors() {
    assert!(matches!(introspect("fn main() {", "X"), Err(ScriptError::Syntax(_))));
    assert!(matches!(introspect("fn f() {}", "X"), Err(ScriptError::NoStruct)));
    assert!(matches!(introspect("struct X(i64);", "X"), Err(ScriptError::TupleStruct(_))));
    assert!(matches!(
        introspect("struct X { m: HashMap<String, i64> }", "X"),
        Err(ScriptError::UnsupportedType { .. })
    ));
    assert!(matches!(
        introspect("struct X { #[route(1)] p: Route }", "X"),
        Err(ScriptError::BadRoute { .. })
    ));
}

#[test]
fn compile_component_end_to_end() {
    let src = r#"<template>
  <p>{count}</p><button @click="add">+</button>
</template>
<script>
pub struct Counter { pub count: i64 }
impl Counter {
    pub fn add(&mut self) { self.count += 1; }
}
</script>"#;
    let compiled = compile_component(src, "Counter", true).unwrap();
    assert_eq!(compiled.name(), "Counter");
    assert_eq!(compiled.schema().kind("count"), Some(ValueKind::Int));
    assert_eq!(compiled.ir.expressions().count(), 1);
    assert_eq!(compiled.ir.events().count(), 1);
}

#[test]
fn strict_mode_rejects_diagnostics() {
    let src = "<template>{#if x</template>";
    assert!(compile_component(src, "Broken", false).is_ok());
    assert!(compile_component(src, "Broken", true).is_err());
}

#[test]
fn missing_template_is_an_error() {
    let err = compile_component("<script>struct A {}</script>", "A", false).unwrap_err();
    assert!(err.to_string().contains("template"), "{err}");
}
