pub mod condition;
pub mod error;
pub mod ids;
pub mod script;
pub mod sfc;
pub mod template_ast;
pub mod template_codegen;
pub mod template_parse;
pub mod validate;

pub use condition::{CmpOp, Condition, ConditionError, Lookup, Operand};
pub use error::SfcError;
pub use ids::{IdCounter, Kind, element_kind, item_marker, join, number_blocks};
pub use script::{FieldInfo, ScriptError, ScriptInfo, introspect};
pub use sfc::{Attr, Block, Sfc, parse_sfc};
pub use template_ast::*;
pub use template_codegen::{emit_component_module, emit_components_file, module_name};
pub use template_parse::{expand_slot, parse_template};
pub use validate::{
    Catalog, CatalogEntry, Schema, ValidationError, ValidationErrors, prepare, resolve_routes,
    validate,
};

/// A component file after splitting, script introspection and a first parse.
#[derive(Debug, Clone)]
pub struct CompiledComponent {
    pub sfc: Sfc,
    pub script: ScriptInfo,
    /// The template parsed with an empty slot and routes resolved.
    pub ir: TemplateIR,
}

impl CompiledComponent {
    pub fn name(&self) -> &str {
        &self.script.name
    }

    pub fn schema(&self) -> Schema {
        self.script.schema()
    }
}

/// Split, introspect and parse one component file. Parse diagnostics are kept
/// on the IR; `strict` turns them into an error.
pub fn compile_component(source: &str, name: &str, strict: bool) -> Result<CompiledComponent, SfcError> {
    let sfc = parse_sfc(source)?;
    if sfc.template.is_none() {
        return Err(SfcError::MissingTemplate);
    }
    let script = introspect(sfc.script_source(), name)?;
    let ir = prepare(sfc.template_source(), "", &script.schema());
    for d in &ir.diagnostics {
        tracing::warn!(component = name, "{d}");
    }
    if strict && !ir.diagnostics.is_empty() {
        return Err(SfcError::Diagnostics {
            component: name.to_string(),
            diagnostics: ir.diagnostics.clone(),
        });
    }
    Ok(CompiledComponent { sfc, script, ir })
}
