//! Reads a component's state surface out of its `<script>` block.
//!
//! The script is ordinary Rust. The component struct gives the fields and their
//! kinds, a `new()`/`default()` struct literal gives initial values, inherent
//! methods become event handlers and `#[route("A", "B")]` marks router fields.

use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{
    Expr, Fields, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, Lit, LitStr, Stmt, Token, Type,
    UnOp,
};
use tandem_core::{ComponentRef, Value, ValueKind};
use thiserror::Error;

use crate::validate::Schema;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script does not parse as Rust: {0}")]
    Syntax(#[from] syn::Error),

    #[error("script declares no component struct")]
    NoStruct,

    #[error("component struct `{0}` must have named fields")]
    TupleStruct(String),

    #[error("field `{field}` has unsupported type `{ty}`")]
    UnsupportedType { field: String, ty: String },

    #[error("bad #[route] on `{field}`: {reason}")]
    BadRoute { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: ValueKind,
    pub default: Value,
    /// Router options, for component-valued fields.
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<String>,
}

impl ScriptInfo {
    pub fn schema(&self) -> Schema {
        let mut schema = Schema::new(&self.name);
        for f in &self.fields {
            schema = if f.routes.is_empty() {
                schema.field(&f.name, f.kind)
            } else {
                schema.route(&f.name, f.routes.iter().cloned())
            };
        }
        for m in &self.methods {
            schema = schema.method(m);
        }
        schema
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Introspect `source`. The struct named `component` is preferred, otherwise the
/// first struct in the file. An empty script yields a component with no state.
pub fn introspect(source: &str, component: &str) -> Result<ScriptInfo, ScriptError> {
    if source.trim().is_empty() {
        return Ok(ScriptInfo {
            name: component.to_string(),
            ..Default::default()
        });
    }
    let file = syn::parse_file(source)?;
    let item = component_struct(&file, component).ok_or(ScriptError::NoStruct)?;

    let impls: Vec<&ItemImpl> = file
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Impl(imp) if names_type(&imp.self_ty, &item.ident) => Some(imp),
            _ => None,
        })
        .collect();
    let ctor = impls.iter().find_map(|imp| constructor(imp));

    let mut fields = Vec::new();
    match &item.fields {
        Fields::Named(named) => {
            for f in &named.named {
                let name = f.ident.as_ref().map(ToString::to_string).unwrap_or_default();
                let routes = route_options(&name, &f.attrs)?;
                let kind = if routes.is_empty() {
                    field_kind(&f.ty).ok_or_else(|| ScriptError::UnsupportedType {
                        field: name.clone(),
                        ty: f.ty.to_token_stream().to_string(),
                    })?
                } else {
                    ValueKind::Component
                };
                let initial = ctor.and_then(|c| initial_value(c, &name));
                let fitted = initial.and_then(|v| fit(v, kind)).filter(|v| match v.as_component() {
                    Some(c) if !routes.is_empty() => {
                        let known = routes.iter().any(|r| r == c.name());
                        if !known {
                            tracing::warn!(field = %name, route = c.name(), "initial route is not an option");
                        }
                        known
                    }
                    _ => true,
                });
                let default = match fitted {
                    Some(v) => v,
                    None => {
                        if initial_expr_present(ctor, &name) {
                            tracing::warn!(field = %name, "unsupported initial value; using the zero value");
                        }
                        match routes.first() {
                            Some(first) => Value::Component(ComponentRef::new(first.as_str())),
                            None => kind.zero(),
                        }
                    }
                };
                fields.push(FieldInfo {
                    name,
                    kind,
                    default,
                    routes,
                });
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => return Err(ScriptError::TupleStruct(item.ident.to_string())),
    }

    let methods = handler_fns(&file, &item.ident)
        .iter()
        .map(|f| f.sig.ident.to_string())
        .collect();

    Ok(ScriptInfo {
        name: component.to_string(),
        fields,
        methods,
    })
}

/// The struct named `component`, otherwise the first struct in the file.
pub(crate) fn component_struct<'a>(file: &'a syn::File, component: &str) -> Option<&'a ItemStruct> {
    let structs: Vec<&ItemStruct> = file
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Struct(s) => Some(s),
            _ => None,
        })
        .collect();
    structs
        .iter()
        .find(|s| s.ident == component)
        .or_else(|| structs.first())
        .copied()
}

/// Inherent methods taking `self` in some form. These are the event handlers.
pub(crate) fn handler_fns<'a>(file: &'a syn::File, ident: &syn::Ident) -> Vec<&'a ImplItemFn> {
    file.items
        .iter()
        .filter_map(|i| match i {
            Item::Impl(imp) if imp.trait_.is_none() && names_type(&imp.self_ty, ident) => Some(imp),
            _ => None,
        })
        .flat_map(|imp| imp.items.iter())
        .filter_map(|ii| match ii {
            ImplItem::Fn(f) if f.sig.receiver().is_some() => Some(f),
            _ => None,
        })
        .collect()
}

fn names_type(ty: &Type, ident: &syn::Ident) -> bool {
    match ty {
        Type::Path(tp) => tp.path.segments.last().is_some_and(|s| s.ident == *ident),
        _ => false,
    }
}

fn field_kind(ty: &Type) -> Option<ValueKind> {
    match ty {
        Type::Path(tp) => {
            let last = tp.path.segments.last()?.ident.to_string();
            match last.as_str() {
                "String" | "str" => Some(ValueKind::Str),
                "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
                    Some(ValueKind::Int)
                }
                "bool" => Some(ValueKind::Bool),
                "f32" | "f64" => Some(ValueKind::Float),
                "Vec" => Some(ValueKind::List),
                "Route" | "Page" | "ComponentRef" => Some(ValueKind::Component),
                _ => None,
            }
        }
        Type::Reference(r) => field_kind(&r.elem),
        Type::Paren(p) => field_kind(&p.elem),
        Type::Group(g) => field_kind(&g.elem),
        _ => None,
    }
}

fn route_options(field: &str, attrs: &[syn::Attribute]) -> Result<Vec<String>, ScriptError> {
    let mut out = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("route")) {
        let names = attr
            .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)
            .map_err(|e| ScriptError::BadRoute {
                field: field.to_string(),
                reason: e.to_string(),
            })?;
        out.extend(names.iter().map(LitStr::value));
    }
    Ok(out)
}

/// The struct literal returned by `fn new() -> Self` or `fn default() -> Self`.
fn constructor(imp: &ItemImpl) -> Option<&syn::ExprStruct> {
    imp.items.iter().find_map(|ii| match ii {
        ImplItem::Fn(f)
            if (f.sig.ident == "new" || f.sig.ident == "default") && f.sig.inputs.is_empty() =>
        {
            match f.block.stmts.last()? {
                Stmt::Expr(e, None) => struct_literal(e),
                _ => None,
            }
        }
        _ => None,
    })
}

fn struct_literal(e: &Expr) -> Option<&syn::ExprStruct> {
    match e {
        Expr::Struct(s) => Some(s),
        Expr::Return(r) => struct_literal(r.expr.as_deref()?),
        Expr::Paren(p) => struct_literal(&p.expr),
        _ => None,
    }
}

fn field_expr<'a>(ctor: &'a syn::ExprStruct, name: &str) -> Option<&'a Expr> {
    ctor.fields.iter().find_map(|fv| match &fv.member {
        syn::Member::Named(id) if id == name => Some(&fv.expr),
        _ => None,
    })
}

fn initial_expr_present(ctor: Option<&syn::ExprStruct>, name: &str) -> bool {
    ctor.is_some_and(|c| field_expr(c, name).is_some())
}

fn initial_value(ctor: &syn::ExprStruct, name: &str) -> Option<Value> {
    literal(field_expr(ctor, name)?)
}

/// Evaluate the constant expressions a component constructor reasonably uses.
fn literal(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Lit(l) => match &l.lit {
            Lit::Str(s) => Some(Value::Str(s.value())),
            Lit::Int(i) => i.base10_parse::<i64>().ok().map(Value::Int),
            Lit::Float(f) => f.base10_parse::<f64>().ok().map(Value::Float),
            Lit::Bool(b) => Some(Value::Bool(b.value)),
            _ => None,
        },
        Expr::Unary(u) if matches!(u.op, UnOp::Neg(_)) => match literal(&u.expr)? {
            Value::Int(i) => Some(Value::Int(-i)),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        },
        // "x".into(), "x".to_string()
        Expr::MethodCall(m)
            if m.args.is_empty() && matches!(m.method.to_string().as_str(), "into" | "to_string" | "to_owned") =>
        {
            literal(&m.receiver)
        }
        // String::from("x"), Route::new("Home")
        Expr::Call(c) if c.args.len() == 1 => literal(&c.args[0]),
        Expr::Macro(m) if m.mac.path.is_ident("vec") => {
            let items = m
                .mac
                .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
                .ok()?;
            items
                .iter()
                .map(literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::List)
        }
        Expr::Paren(p) => literal(&p.expr),
        Expr::Group(g) => literal(&g.expr),
        _ => None,
    }
}

/// Adjust a literal to the declared field kind.
fn fit(value: Value, kind: ValueKind) -> Option<Value> {
    match (kind, value) {
        (ValueKind::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
        (ValueKind::Component, Value::Str(s)) => Some(Value::Component(ComponentRef::new(s))),
        (k, v) if v.kind() == k => Some(v),
        _ => None,
    }
}
