//! Named layout-handler registry.
//!
//! Handlers are registered as factories at startup and built on the first
//! fetch that names them:
//!
//! ```text
//! LayoutClientBuilder::add_handler("pages", factory)     ← startup
//!        ↓ RenderingEngineBuilder::build
//! LayoutClient { "pages" → Entry { factory, OnceCell } } ← frozen
//!        ↓ first fetch naming "pages"
//! factory(&services) → Arc<dyn LayoutHandler>            ← cached
//!        ↓ every later fetch
//! handler.fetch(&request)
//! ```
//!
//! Building late means a handler whose collaborators were never registered
//! does not stop the app from starting; the error reaches the first request
//! that needs it. Concurrent first fetches wait on the same `OnceCell`, so
//! a factory never runs twice for one successful build.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::handler::{HandlerFactory, LayoutHandler};
use crate::layout::http_handler::HttpLayoutHandler;
use crate::layout::request::LayoutRequest;
use crate::layout::response::LayoutResponse;
use crate::layout::serializer::LayoutSerializer;
use crate::services::Services;

/// Collects handler factories by name. Consumed by
/// [`RenderingEngineBuilder::build`](crate::RenderingEngineBuilder::build).
///
/// ```rust,no_run
/// # use rendra::layout::LayoutClientBuilder;
/// LayoutClientBuilder::new()
///     .add_http_handler("default", "https://cms.example.com/layout/render")
///     .add_pages_handler()
///     .default_handler("default");
/// ```
#[derive(Default)]
pub struct LayoutClientBuilder {
    factories: HashMap<String, HandlerFactory>,
    default: Option<String>,
}

impl LayoutClientBuilder {
    pub fn new() -> Self { Self::default() }

    /// Registers a handler factory under `name`. A later registration under
    /// the same name replaces the earlier one.
    pub fn add_handler<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Services) -> Result<Arc<dyn LayoutHandler>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!(handler = %name, "layout handler registered twice, keeping the latest");
        }
        self
    }

    /// Registers an [`HttpLayoutHandler`] for `endpoint`. It resolves the
    /// shared `reqwest::Client` and serializer on first use.
    pub fn add_http_handler(self, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let name = name.into();
        let endpoint = endpoint.into();
        let handler_name = name.clone();
        self.add_handler(name, move |services: &Services| {
            let client = services.resolve::<reqwest::Client>()?;
            let serializer = services.resolve::<Arc<dyn LayoutSerializer>>()?;
            Ok(Arc::new(HttpLayoutHandler::new(handler_name.clone(), endpoint.clone(), client, serializer))
                as Arc<dyn LayoutHandler>)
        })
    }

    /// Handler used when a fetch names none.
    pub fn default_handler(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub(crate) fn build(self, services: Arc<Services>) -> Result<LayoutClient> {
        if let Some(default) = &self.default {
            if !self.factories.contains_key(default) {
                return Err(Error::UnknownHandler(default.clone()));
            }
        }
        let entries = self.factories.into_iter()
            .map(|(name, factory)| (name, Entry { factory, instance: OnceCell::new() }))
            .collect();
        Ok(LayoutClient { entries, default: self.default, services })
    }
}

struct Entry {
    factory: HandlerFactory,
    instance: OnceCell<Arc<dyn LayoutHandler>>,
}

/// Dispatches layout requests to named handlers.
///
/// Each handler is built from its factory on first use and cached for the
/// life of the client. A factory that fails (say, a service was never
/// registered) returns the error to that caller and is tried again on the
/// next fetch.
pub struct LayoutClient {
    entries: HashMap<String, Entry>,
    default: Option<String>,
    services: Arc<Services>,
}

impl LayoutClient {
    /// Fetches `request` with the handler called `handler`, or the default
    /// handler when `None`.
    pub async fn fetch(&self, request: &LayoutRequest, handler: Option<&str>) -> Result<LayoutResponse> {
        let name = match handler {
            Some(name) => name,
            None => self.default.as_deref().ok_or(Error::NoDefaultHandler)?,
        };
        let entry = self.entries.get(name).ok_or_else(|| Error::UnknownHandler(name.to_owned()))?;
        let instance = entry.instance
            .get_or_try_init(|| async { (entry.factory)(&self.services) })
            .await?;

        debug!(handler = name, path = request.path().unwrap_or(""), "fetching layout");
        instance.fetch(request).await
    }

    pub fn default_handler(&self) -> Option<&str> { self.default.as_deref() }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
