//! Mock route definitions and the mutable route set.

mod store;
mod types;

pub use store::RouteStore;
pub use types::{
    RequestMethod, Route, RouteConfig, RouteId, RoutePatch, StoreError, ValidationError,
};
