//! # rendra
//!
//! A minimal HTTP framework for server-rendered sites whose content lives in
//! a headless CMS. Pages fetch their layout from the CMS layout service and
//! render it; optionally, the CMS's in-context editor can open those same
//! pages for editing.
//!
//! ## The request path
//!
//! ```text
//! request → [pages stage: setup] → route handler → [pages stage: render] → response
//!                                       ↓
//!                     engine.fetch_layout(&req)
//!                                       ↓
//!        mappers build a LayoutRequest (path, defaults, editing params)
//!                                       ↓
//!        LayoutClient picks a handler: "pages" when editing, else the default
//! ```
//!
//! The Pages stage exists only if the engine was built with
//! [`RenderingEngineBuilder::with_pages`]. That is decided once at startup.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use rendra::{App, Error, RenderingEngine, Request, Response, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let engine = RenderingEngine::builder()
//!         .layout_client(|c| c
//!             .add_http_handler("default", "https://cms.example.com/sitecore/api/layout/render/jss")
//!             .add_pages_handler()
//!             .default_handler("default"))
//!         .with_pages("my-context-id")
//!         .build()?;
//!
//!     let app = App::new()
//!         .with_engine(engine)
//!         .use_pages()
//!         .on(Method::GET, "/{*path}", page)
//!         .on(Method::GET, "/", page);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn page(req: Request) -> Result<Response, Error> {
//!     let engine = req.engine().ok_or(Error::Config("no rendering engine".into()))?;
//!     let layout = engine.fetch_layout(&req).await?;
//!     Ok(Response::json(serde_json::to_vec(&layout)?))
//! }
//! ```

mod app;
mod config;
mod engine;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod services;

pub mod layout;
pub mod middleware;
pub mod pages;

pub use app::App;
pub use config::{DEFAULT_HANDLER, LayoutSettings, PagesSettings, Settings};
pub use engine::{RenderingEngine, RenderingEngineBuilder, RenderingEngineOptions, RequestMapper};
pub use error::{Error, Result};
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::Server;
pub use services::Services;
