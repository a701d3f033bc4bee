//! Lowers a compiled component to a Rust module that registers it with the
//! renderer at startup.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, ImplItemFn, Item, ItemStruct, ReturnType, Type};
use tandem_core::Value;

use crate::script::{ScriptError, ScriptInfo, component_struct, handler_fns};

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn", "box", "yield",
];

/// `TodoList` -> `todo_list`.
pub fn module_name(component: &str) -> String {
    let mut out = String::with_capacity(component.len() + 4);
    for (i, c) in component.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

pub fn value_tokens(v: &Value) -> TokenStream {
    match v {
        Value::Str(s) => quote! { ::tandem_core::Value::Str(#s.to_string()) },
        Value::Int(i) => quote! { ::tandem_core::Value::Int(#i) },
        Value::Bool(b) => quote! { ::tandem_core::Value::Bool(#b) },
        Value::Float(f) if f.is_finite() => quote! { ::tandem_core::Value::Float(#f) },
        Value::Float(_) => quote! { ::tandem_core::Value::Float(0.0) },
        Value::List(items) => {
            let items = items.iter().map(value_tokens);
            quote! { ::tandem_core::Value::List(vec![#(#items),*]) }
        }
        Value::Component(c) => {
            let name = c.name();
            quote! { ::tandem_core::Value::Component(::tandem_core::ComponentRef::new(#name)) }
        }
    }
}

/// One `pub mod` per component holding the script items, the sources and a
/// `def()` constructor. Every handler is registered through an adapter that
/// loads the component struct from the instance, calls the method and stores
/// the fields back.
pub fn emit_component_module(
    info: &ScriptInfo,
    script: &str,
    template: &str,
    style: &str,
) -> Result<TokenStream, ScriptError> {
    let module = module_name(&info.name);
    let module = if RUST_KEYWORDS.contains(&module.as_str()) {
        format_ident!("r#{}", module)
    } else {
        format_ident!("{}", module)
    };
    let name = &info.name;

    let fields = info.fields.iter().map(|f| {
        let field = &f.name;
        if f.routes.is_empty() {
            let value = value_tokens(&f.default);
            quote! { .field(#field, #value) }
        } else {
            let options = &f.routes;
            let initial = f
                .default
                .as_component()
                .map(|c| c.name().to_string())
                .unwrap_or_default();
            quote! { .route(#field, &[#(#options),*], #initial) }
        }
    });
    let methods = &info.methods;

    let mut items = Vec::new();
    let mut adapters = Vec::new();
    let mut state = TokenStream::new();
    if !script.trim().is_empty() {
        let file = syn::parse_file(script)?;
        let item = component_struct(&file, &info.name).ok_or(ScriptError::NoStruct)?;
        let ident = item.ident.clone();
        adapters = handler_fns(&file, &ident).into_iter().map(handler_adapter).collect();
        if !adapters.is_empty() {
            state = state_accessors(item);
        }
        items = file
            .items
            .into_iter()
            .map(|mut i| {
                if let Item::Struct(s) = &mut i {
                    if s.ident == ident {
                        for f in s.fields.iter_mut() {
                            f.attrs.retain(|a| !a.path().is_ident("route"));
                        }
                    }
                }
                i
            })
            .collect();
    }

    Ok(quote! {
        pub mod #module {
            #[allow(unused_imports)]
            use ::tandem_core::prelude::*;

            #(#items)*

            pub const NAME: &str = #name;
            pub const TEMPLATE: &str = #template;
            pub const STYLE: &str = #style;
            /// Handlers the template may call. `def()` registers each of them.
            pub const METHODS: &[&str] = &[#(#methods),*];

            #state

            pub fn def() -> ::tandem_renderer::ComponentDef {
                ::tandem_renderer::ComponentDef::new(NAME, TEMPLATE)
                    .style(STYLE)
                    #(#fields)*
                    #(#adapters)*
            }
        }
    })
}

/// `__load` builds the component struct from the instance's stores, `__store`
/// writes every field back.
fn state_accessors(item: &ItemStruct) -> TokenStream {
    let ident = &item.ident;
    let fields: Vec<&syn::Ident> = item.fields.iter().filter_map(|f| f.ident.as_ref()).collect();
    let keys: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    quote! {
        #[allow(dead_code)]
        fn __load(inst: &::tandem_renderer::Instance) -> ::std::option::Option<#ident> {
            ::std::option::Option::Some(#ident { #(#fields: inst.field_as(#keys)?,)* })
        }

        #[allow(dead_code, unused_variables)]
        fn __store(state: #ident, inst: &::tandem_renderer::Instance) {
            #(inst.store_field(#keys, state.#fields);)*
        }
    }
}

/// `.method("name", |inst, args| ...)` for one handler. Arguments are converted
/// from the call's values; a borrowed parameter receives a reference to an owned
/// copy.
fn handler_adapter(f: &ImplItemFn) -> TokenStream {
    let method = &f.sig.ident;
    let name = method.to_string();
    let mut bindings = Vec::new();
    let mut call = Vec::new();
    let typed = f.sig.inputs.iter().filter_map(|a| match a {
        FnArg::Typed(t) => Some(t),
        FnArg::Receiver(_) => None,
    });
    for (i, input) in typed.enumerate() {
        let arg = format_ident!("arg{}", i);
        match &*input.ty {
            Type::Reference(r) => {
                let owned = owned_type(&r.elem);
                let m = r.mutability;
                bindings.push(quote! {
                    let ::std::option::Option::Some(#m #arg) =
                        ::tandem_renderer::handler_arg::<#owned>(args, #i) else { return };
                });
                call.push(quote! { & #m #arg });
            }
            ty => {
                bindings.push(quote! {
                    let ::std::option::Option::Some(#arg) =
                        ::tandem_renderer::handler_arg::<#ty>(args, #i) else { return };
                });
                call.push(quote! { #arg });
            }
        }
    }
    let args = if call.is_empty() {
        quote! { _ }
    } else {
        quote! { args }
    };
    let invoke = match f.sig.output {
        ReturnType::Default => quote! { state.#method(#(#call),*); },
        ReturnType::Type(..) => quote! { let _ = state.#method(#(#call),*); },
    };
    let mutates = f
        .sig
        .receiver()
        .is_some_and(|r| r.reference.is_some() && r.mutability.is_some());
    let body = if mutates {
        quote! {
            let ::std::option::Option::Some(mut state) = __load(inst) else { return };
            #invoke
            __store(state, inst);
        }
    } else {
        quote! {
            let ::std::option::Option::Some(state) = __load(inst) else { return };
            #invoke
        }
    };
    quote! {
        .method(#name, |inst: &::tandem_renderer::Instance, #args: &[::tandem_core::Value]| {
            #(#bindings)*
            #body
        })
    }
}

/// `str` -> `String`, `[T]` -> `Vec<T>`.
fn owned_type(ty: &Type) -> TokenStream {
    match ty {
        Type::Path(tp) if tp.path.is_ident("str") => quote! { ::std::string::String },
        Type::Slice(s) => {
            let elem = &s.elem;
            quote! { ::std::vec::Vec<#elem> }
        }
        other => quote! { #other },
    }
}

/// Concatenate component modules into one source file.
pub fn emit_components_file(modules: impl IntoIterator<Item = TokenStream>) -> String {
    let modules = modules.into_iter();
    let body = quote! { #(#modules)* };
    format!("// @generated by tandem. Do not edit.\n{body}\n")
}
