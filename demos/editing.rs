//! Layout-driven pages with in-context editing.
//!
//! Run with:
//!   RENDRA_LAYOUT_URL=https://cms.example.com/sitecore/api/layout/render/jss \
//!   RENDRA_CONTEXT_ID=my-context-id \
//!   RENDRA_EDITING_SECRET=s3cret \
//!   RUST_LOG=rendra=debug cargo run --example editing
//!
//! Or point it at a file: `cargo run --example editing -- rendra.toml`.
//!
//! Try:
//!   curl http://localhost:3000/about
//!   curl 'http://localhost:3000/api/editing/config?secret=s3cret'
//!   curl -i 'http://localhost:3000/api/editing/render?route=/about&mode=edit&sc_itemid=%7BA1%7D&sc_site=web&sc_lang=en&secret=s3cret'
//!   curl 'http://localhost:3000/about?mode=edit&sc_itemid=%7BA1%7D&sc_site=web&sc_lang=en&secret=s3cret'

use http::Method;
use rendra::{App, Error, RenderingEngineBuilder, Request, Response, Server, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    }
    .apply_env();

    let engine = RenderingEngineBuilder::from_settings(&settings)?
        .configure(|o| {
            o.add_component("Hero").add_component("RichText").add_component("Footer");
        })
        .build()?;

    let app = App::new()
        .with_engine(engine)
        .use_pages()
        .on(Method::GET, "/", page)
        .on(Method::GET, "/{*path}", page);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /{*path}
//
// Editing requests arrive here already marked by the Pages stage;
// fetch_layout picks the editing handler for them on its own.
async fn page(req: Request) -> Result<Response, Error> {
    let engine = req.engine().ok_or(Error::Config("no rendering engine".into()))?;
    let layout = engine.fetch_layout(&req).await?;

    let title = layout.sitecore.route.as_ref()
        .and_then(|r| r.name.as_deref())
        .unwrap_or("untitled");
    let components: Vec<&str> = layout.placeholder("main").iter()
        .map(|c| c.component_name.as_str())
        .collect();

    Ok(Response::html(format!(
        "<!doctype html><title>{title}</title><h1>{title}</h1><p>editing: {}</p><p>main: {}</p>",
        layout.is_editing(),
        components.join(", "),
    )))
}
