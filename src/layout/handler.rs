//! Layout handler trait.
//!
//! A layout handler performs the remote fetch for one [`LayoutRequest`].
//! Handlers are registered by name on a
//! [`LayoutClientBuilder`](crate::layout::LayoutClientBuilder) as factories
//! and built the first time they are used.

use std::sync::Arc;

use crate::error::Result;
use crate::handler::BoxFuture;
use crate::layout::request::LayoutRequest;
use crate::layout::response::LayoutResponse;
use crate::services::Services;

pub trait LayoutHandler: Send + Sync + 'static {
    fn fetch<'a>(&'a self, request: &'a LayoutRequest) -> BoxFuture<'a, Result<LayoutResponse>>;
}

/// Builds a handler from registered services. Runs once per handler name,
/// on first use.
pub type HandlerFactory =
    Arc<dyn Fn(&Services) -> Result<Arc<dyn LayoutHandler>> + Send + Sync + 'static>;
