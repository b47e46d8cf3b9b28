//! Application: routes, middleware pipeline and rendering engine.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use tracing::debug;

use crate::engine::RenderingEngine;
use crate::handler::Handler;
use crate::middleware::{Middleware, Pipeline, Terminal};
use crate::pages::PagesStage;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Everything the server needs to answer a request. Build it once at
/// startup; each [`App::on`] / [`App::layer`] call returns `self` so
/// registrations chain.
///
/// Stages run in the order they are added, so call
/// [`use_pages`](App::use_pages) where the editing stage belongs relative to
/// your own layers.
pub struct App {
    router: Router,
    pipeline: Pipeline,
    engine: Option<RenderingEngine>,
}

impl App {
    pub fn new() -> Self {
        Self { router: Router::new(), pipeline: Pipeline::default(), engine: None }
    }

    /// Makes `engine` available to handlers through [`Request::engine`].
    pub fn with_engine(mut self, engine: RenderingEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax, catch-alls `{*name}`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.router.add(method, path, handler);
        self
    }

    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.pipeline.push(Arc::new(middleware));
        self
    }

    /// Adds the Pages stage if the engine was built with Pages enabled.
    /// Otherwise a no-op: the pipeline is left exactly as it was.
    pub fn use_pages(mut self) -> Self {
        let stage = self.engine.as_ref().and_then(|engine| {
            engine.pages_options()
                .map(|options| PagesStage::new(engine.clone(), Arc::clone(options)))
        });
        match stage {
            Some(stage) => {
                let handlers: Vec<&str> = stage.engine().client().handler_names().collect();
                debug!(?handlers, "pages stage enabled");
                self.pipeline.push(Arc::new(stage));
            }
            None => debug!("pages not enabled, stage skipped"),
        }
        self
    }

    /// Names of the pipeline stages, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.names()
    }

    /// Runs one request through the app in memory, without a socket.
    pub async fn oneshot(&self, req: http::Request<Bytes>) -> Response {
        self.handle(Request::from_http(req)).await
    }

    pub(crate) async fn handle(&self, req: Request) -> Response {
        let (terminal, params) = match self.router.lookup(req.method(), req.path()) {
            Some((handler, params)) => (Terminal::Route(handler), params),
            None => (Terminal::NotFound, Default::default()),
        };
        let mut req = req.with_params(params);
        if let Some(engine) = &self.engine {
            req.extensions_mut().insert(engine.clone());
        }
        self.pipeline.run(req, terminal).await
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    async fn hello(req: Request) -> Response {
        Response::text(format!("hello {}", req.param("name").unwrap_or("?")))
    }

    #[tokio::test]
    async fn routes_with_params() {
        let app = App::new().on(Method::GET, "/hello/{name}", hello);
        let res = app.oneshot(http::Request::get("/hello/ada").body(Bytes::new()).unwrap()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"hello ada");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = App::new();
        let res = app.oneshot(http::Request::get("/nope").body(Bytes::new()).unwrap()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn use_pages_without_engine_adds_nothing() {
        assert!(App::new().use_pages().stage_names().is_empty());
    }

    #[test]
    fn use_pages_without_opt_in_adds_nothing() {
        let engine = RenderingEngine::builder().build().unwrap();
        let app = App::new().with_engine(engine).use_pages();
        assert!(app.stage_names().is_empty());
    }

    #[test]
    fn use_pages_with_opt_in_adds_one_stage() {
        let engine = RenderingEngine::builder().with_pages("ctx").build().unwrap();
        let app = App::new().with_engine(engine).use_pages();
        assert_eq!(app.stage_names(), vec!["pages"]);
    }
}
