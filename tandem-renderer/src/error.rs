use tandem_core::RouteError;
use tandem_sfc::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown component `{name}`; available: {available}")]
    UnknownComponent { name: String, available: String },

    #[error("`{component}` has no field `{field}`")]
    UnknownField { component: String, field: String },

    #[error("`{component}` has no method `{method}`")]
    UnknownMethod { component: String, method: String },

    #[error("`{component}` has no router field `{field}`")]
    NotARoute { component: String, field: String },

    #[error("components nested more than {limit} deep at `{component}`")]
    TooDeep { component: String, limit: usize },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
