//! Rendering engine: builds layout requests from page requests and fetches
//! layout through the configured handler.
//!
//! Everything here is assembled once at startup by
//! [`RenderingEngineBuilder`] and shared read-only afterwards. Request
//! handlers reach the engine through [`Request::engine`].
//!
//! ```rust,no_run
//! use rendra::{App, Error, RenderingEngine, Request, Response};
//! use http::Method;
//!
//! # fn main() -> Result<(), Error> {
//! let engine = RenderingEngine::builder()
//!     .layout_client(|client| client
//!         .add_http_handler("default", "https://cms.example.com/sitecore/api/layout/render/jss")
//!         .add_pages_handler()
//!         .default_handler("default"))
//!     .with_pages("my-context-id")
//!     .build()?;
//!
//! let app = App::new()
//!     .with_engine(engine)
//!     .use_pages()
//!     .on(Method::GET, "/{*path}", page);
//! # Ok(()) }
//!
//! async fn page(req: Request) -> Result<Response, Error> {
//!     let engine = req.engine().ok_or(Error::Config("no rendering engine".into()))?;
//!     let layout = engine.fetch_layout(&req).await?;
//!     Ok(Response::json(serde_json::to_vec(&layout)?))
//! }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::layout::{
    API_KEY, ITEM, JsonLayoutSerializer, LANGUAGE, LayoutClient, LayoutClientBuilder,
    LayoutRequest, LayoutResponse, LayoutSerializer, SITE,
};
use crate::pages::{EditingContext, PagesOptions};
use crate::request::Request;
use crate::services::Services;

/// Copies data from an inbound request onto the outgoing layout request.
pub type RequestMapper = Arc<dyn Fn(&Request, &mut LayoutRequest) + Send + Sync + 'static>;

/// Request-mapping and component configuration shared by all requests.
#[derive(Clone, Default)]
pub struct RenderingEngineOptions {
    pub default_language: Option<String>,
    pub default_site: Option<String>,
    pub api_key: Option<String>,
    mappers: Vec<RequestMapper>,
    components: Vec<String>,
}

impl RenderingEngineOptions {
    /// Appends a mapper. Mappers run in the order they were added, after the
    /// built-in one that sets the item path and defaults.
    pub fn map_to_request<F>(&mut self, mapper: F) -> &mut Self
    where
        F: Fn(&Request, &mut LayoutRequest) + Send + Sync + 'static,
    {
        self.mappers.push(Arc::new(mapper));
        self
    }

    /// Declares a component the site can render. The list is reported to
    /// the editor through the Pages config endpoint.
    pub fn add_component(&mut self, name: impl Into<String>) -> &mut Self {
        self.components.push(name.into());
        self
    }

    pub fn mappers(&self) -> &[RequestMapper] { &self.mappers }
    pub fn components(&self) -> &[String] { &self.components }
}

/// Startup-time assembly of services, options, layout handlers and the
/// Pages opt-in.
pub struct RenderingEngineBuilder {
    pub(crate) services: Services,
    pub(crate) options: RenderingEngineOptions,
    pub(crate) layout: LayoutClientBuilder,
    pub(crate) pages: Option<PagesOptions>,
}

impl RenderingEngineBuilder {
    /// Starts with the JSON serializer and a shared `reqwest::Client`
    /// registered.
    pub fn new() -> Self {
        let mut services = Services::new();
        services
            .register::<Arc<dyn LayoutSerializer>>(Arc::new(JsonLayoutSerializer))
            .register(reqwest::Client::new());
        Self {
            services,
            options: RenderingEngineOptions::default(),
            layout: LayoutClientBuilder::new(),
            pages: None,
        }
    }

    pub fn configure(mut self, f: impl FnOnce(&mut RenderingEngineOptions)) -> Self {
        f(&mut self.options);
        self
    }

    pub fn layout_client(mut self, f: impl FnOnce(LayoutClientBuilder) -> LayoutClientBuilder) -> Self {
        self.layout = f(self.layout);
        self
    }

    pub fn services_mut(&mut self) -> &mut Services { &mut self.services }
    pub fn services(&self) -> &Services { &self.services }
    pub fn options(&self) -> &RenderingEngineOptions { &self.options }

    /// `true` once [`with_pages`](Self::with_pages) has been called.
    pub fn pages_enabled(&self) -> bool { self.pages.is_some() }

    pub fn build(self) -> Result<RenderingEngine> {
        let services = Arc::new(self.services);
        let client = self.layout.build(Arc::clone(&services))?;
        Ok(RenderingEngine {
            inner: Arc::new(Inner {
                services,
                options: self.options,
                client,
                pages: self.pages.map(Arc::new),
            }),
        })
    }
}

impl Default for RenderingEngineBuilder {
    fn default() -> Self { Self::new() }
}

struct Inner {
    services: Arc<Services>,
    options: RenderingEngineOptions,
    client: LayoutClient,
    pages: Option<Arc<PagesOptions>>,
}

/// The assembled engine. Cheap to clone; all state is behind one `Arc`.
#[derive(Clone)]
pub struct RenderingEngine {
    inner: Arc<Inner>,
}

impl RenderingEngine {
    pub fn builder() -> RenderingEngineBuilder { RenderingEngineBuilder::new() }

    pub fn pages_enabled(&self) -> bool { self.inner.pages.is_some() }
    pub fn pages_options(&self) -> Option<&Arc<PagesOptions>> { self.inner.pages.as_ref() }
    pub fn options(&self) -> &RenderingEngineOptions { &self.inner.options }
    pub fn services(&self) -> &Services { &self.inner.services }
    pub fn client(&self) -> &LayoutClient { &self.inner.client }

    /// Builds the layout request for `req`.
    pub fn layout_request(&self, req: &Request) -> LayoutRequest {
        let options = &self.inner.options;
        let mut layout = LayoutRequest::new();
        layout.set_param(ITEM, req.path());
        if let Some(language) = &options.default_language {
            layout.set_param(LANGUAGE, language.as_str());
        }
        if let Some(site) = &options.default_site {
            layout.set_param(SITE, site.as_str());
        }
        if let Some(key) = &options.api_key {
            layout.set_param(API_KEY, key.as_str());
        }
        for mapper in &options.mappers {
            mapper(req, &mut layout);
        }
        layout
    }

    /// Maps `req` and fetches its layout. Editing requests (those the Pages
    /// stage marked) go to the editing handler; everything else to the
    /// default handler.
    pub async fn fetch_layout(&self, req: &Request) -> Result<LayoutResponse> {
        let layout = self.layout_request(req);
        let handler = req.editing_context().map(|ctx| ctx.handler.as_str());
        let resolved = handler.or(self.inner.client.default_handler()).unwrap_or("<none>");
        debug!(path = req.path(), handler = resolved, "resolving layout");
        self.inner.client.fetch(&layout, handler).await
    }
}

impl Request {
    /// The rendering engine the app was built with, if any.
    pub fn engine(&self) -> Option<&RenderingEngine> {
        self.extensions().get::<RenderingEngine>()
    }

    /// Set by the Pages stage on editing requests.
    pub fn editing_context(&self) -> Option<&EditingContext> {
        self.extensions().get::<EditingContext>()
    }
}
