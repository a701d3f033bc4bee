//! Reactive primitives shared by the server and client passes.
//!
//! Everything here is single-threaded: stores are meant to be shared through `Rc`
//! and notify synchronously.

pub mod router;
pub mod store;
pub mod value;
pub mod watch;

pub use router::{RouteError, Router};
pub use store::{Store, SubscriptionId};
pub use value::{ComponentRef, FromValue, Value, ValueKind};
pub use watch::watch;

/// Names a component script sees in generated modules.
pub mod prelude {
    pub use crate::value::{ComponentRef, FromValue, Value};

    /// Router field type in component scripts.
    pub type Route = ComponentRef;
    pub type Page = ComponentRef;
}
