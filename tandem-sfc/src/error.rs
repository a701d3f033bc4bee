use thiserror::Error;

use crate::script::ScriptError;
use crate::template_ast::ParseDiagnostic;
use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum SfcError {
    #[error("cannot split component file: {0}")]
    Split(String),

    #[error("component file has no <template> block")]
    MissingTemplate,

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("template of `{component}` has {} problem(s):\n{}", .diagnostics.len(), render_diagnostics(.diagnostics))]
    Diagnostics {
        component: String,
        diagnostics: Vec<ParseDiagnostic>,
    },
}

fn render_diagnostics(diagnostics: &[ParseDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}
