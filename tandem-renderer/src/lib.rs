//! Server rendering and client hydration of tandem components.
//!
//! Both passes run the same template walk and claim markers from the same
//! counter rules, so every marker the server writes is found again by
//! [`hydrate`] without any lookup table travelling between them.

mod component;
mod error;
mod events;
mod hydrate;
mod page;
mod registry;
mod scope;
mod ssr;
mod walk;

pub use component::{ComponentDef, EmitId, Handler, Instance, handler_arg};
pub use error::RenderError;
pub use hydrate::{Hydration, Hydrator, hydrate};
pub use page::{PageOptions, render_page, render_route_pages};
pub use registry::Registry;
pub use ssr::{Rendered, render_instance, render_to_string};
pub use walk::MAX_DEPTH;
