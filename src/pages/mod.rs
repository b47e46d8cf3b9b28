//! In-context editing ("Pages") support.
//!
//! Opt in at startup with [`RenderingEngineBuilder::with_pages`], register
//! the editing layout handler with [`LayoutClientBuilder::add_pages_handler`],
//! then call [`App::use_pages`](crate::App::use_pages) to put the
//! [`PagesStage`] in the request pipeline. Without the opt-in,
//! `use_pages` adds nothing and every request renders normally.

mod graphql;
mod handler;
mod mapper;
mod stage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use graphql::{DEFAULT_EDGE_URL, GraphQlClient, GraphQlClientFactory};
pub use handler::GraphQlEditingHandler;
pub use mapper::{EDITING_QUERY_PARAMS, map_query_to_layout_request};
pub use stage::{EditingContext, EditingMode, PagesStage};

use crate::engine::RenderingEngineBuilder;
use crate::layout::{LayoutClientBuilder, LayoutHandler, LayoutSerializer};
use crate::services::Services;

/// Name of the editing layout handler. Editing requests are always fetched
/// through the handler registered under this name; a custom editing handler
/// must be registered with [`LayoutClientBuilder::add_handler`] under it.
pub const PAGES_HANDLER: &str = "pages";

/// Pages configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesOptions {
    /// Path the editor calls to discover the site's components.
    pub config_endpoint: String,
    /// Path the editor calls to open a page for editing.
    pub render_endpoint: String,
    /// Shared secret the editor presents as the `secret` query parameter.
    /// Required by the config and render endpoints. When set, page requests
    /// in edit or preview mode must present it too.
    pub editing_secret: Option<String>,
    pub valid_editing_origin: String,
    /// Extra origins allowed to frame editing pages.
    pub valid_origins: Vec<String>,
    pub edge_url: String,
}

impl Default for PagesOptions {
    fn default() -> Self {
        Self {
            config_endpoint: "/api/editing/config".to_owned(),
            render_endpoint: "/api/editing/render".to_owned(),
            editing_secret: None,
            valid_editing_origin: "https://pages.sitecorecloud.io".to_owned(),
            valid_origins: Vec::new(),
            edge_url: DEFAULT_EDGE_URL.to_owned(),
        }
    }
}

impl RenderingEngineBuilder {
    /// Enables Pages with default options. See
    /// [`with_pages_configured`](Self::with_pages_configured).
    pub fn with_pages(self, context_id: impl Into<String>) -> Self {
        self.with_pages_configured(context_id, |_| {})
    }

    /// Enables Pages: registers a [`GraphQlClientFactory`] for
    /// `context_id`, applies `configure` to the options, and appends
    /// [`map_query_to_layout_request`] to the request mappers.
    ///
    /// Only the first call has any effect; later calls return the builder
    /// unchanged.
    pub fn with_pages_configured(
        mut self,
        context_id: impl Into<String>,
        configure: impl FnOnce(&mut PagesOptions),
    ) -> Self {
        if self.pages.is_some() {
            trace!("pages already enabled");
            return self;
        }

        let mut options = PagesOptions::default();
        configure(&mut options);

        let clients = GraphQlClientFactory::new(context_id).with_base_url(options.edge_url.as_str());
        self.services.register(clients);
        self.options.map_to_request(map_query_to_layout_request);
        self.pages = Some(options);
        self
    }
}

impl LayoutClientBuilder {
    /// Registers the [`GraphQlEditingHandler`] as `"pages"`. Its GraphQL
    /// client factory and serializer are resolved when it first serves a
    /// request, so a missing `with_pages` call shows up then as
    /// [`Error::MissingService`](crate::Error::MissingService).
    pub fn add_pages_handler(self) -> Self {
        self.add_handler(PAGES_HANDLER, |services: &Services| {
            let clients = services.resolve::<GraphQlClientFactory>()?;
            let serializer = services.resolve::<Arc<dyn LayoutSerializer>>()?;
            Ok(Arc::new(GraphQlEditingHandler::new(PAGES_HANDLER, clients, serializer))
                as Arc<dyn LayoutHandler>)
        })
    }
}
