//! The Pages pipeline stage.
//!
//! One stage, two phases, always in this order:
//!
//! 1. **setup** (before the route handler): answers the editor's config
//!    and render endpoints directly, and marks `mode=edit` / `mode=preview`
//!    page requests with an [`EditingContext`]. A request that claims
//!    editing but fails the secret check is rejected here; it never falls
//!    through to normal rendering.
//! 2. **render** (after the route handler): adds the frame-ancestors and
//!    no-store headers the editor needs to host the page in its iframe.
//!
//! Keeping both phases in one [`Middleware`] means neither can be
//! registered without the other or out of order.

use std::sync::Arc;

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL, CONTENT_SECURITY_POLICY,
};
use http::{HeaderValue, Method, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use crate::engine::RenderingEngine;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::pages::{PAGES_HANDLER, PagesOptions};
use crate::pages::mapper::EDITING_QUERY_PARAMS;
use crate::request::Request;
use crate::response::Response;

/// Editing flavour requested through the `mode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingMode {
    Edit,
    Preview,
}

impl EditingMode {
    fn parse(mode: &str) -> Option<Self> {
        match mode {
            "edit" => Some(Self::Edit),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }
}

/// Per-request editing state set by the setup phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingContext {
    pub mode: EditingMode,
    /// Layout handler that serves this request.
    pub handler: String,
}

enum Setup {
    Continue,
    Respond(Response),
}

pub struct PagesStage {
    engine: RenderingEngine,
    options: Arc<PagesOptions>,
}

impl PagesStage {
    pub(crate) fn new(engine: RenderingEngine, options: Arc<PagesOptions>) -> Self {
        Self { engine, options }
    }

    pub(crate) fn engine(&self) -> &RenderingEngine { &self.engine }

    fn setup(&self, req: &mut Request) -> Setup {
        let path = req.path();
        if path == self.options.config_endpoint {
            return Setup::Respond(self.config(req));
        }
        if path == self.options.render_endpoint {
            return Setup::Respond(self.render_redirect(req));
        }

        let Some(mode) = req.query("mode").and_then(EditingMode::parse) else {
            return Setup::Continue;
        };
        if self.options.editing_secret.is_some() && !self.secret_valid(req) {
            warn!(path = req.path(), "editing request with invalid secret rejected");
            return Setup::Respond(Response::status(StatusCode::UNAUTHORIZED));
        }

        debug!(path = req.path(), ?mode, "editing request");
        req.extensions_mut().insert(EditingContext {
            mode,
            handler: PAGES_HANDLER.to_owned(),
        });
        Setup::Continue
    }

    fn render(&self, res: &mut Response) {
        let mut ancestors = vec!["'self'", self.options.valid_editing_origin.as_str()];
        ancestors.extend(self.options.valid_origins.iter().map(String::as_str));
        let policy = format!("frame-ancestors {}", ancestors.join(" "));

        let headers = res.headers_mut();
        match HeaderValue::from_str(&policy) {
            Ok(value) => { headers.insert(CONTENT_SECURITY_POLICY, value); }
            Err(_) => warn!(%policy, "editing origins do not form a valid header"),
        }
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    fn secret_valid(&self, req: &Request) -> bool {
        match (&self.options.editing_secret, req.query("secret")) {
            (Some(expected), Some(given)) => secrets_match(expected.as_bytes(), given.as_bytes()),
            _ => false,
        }
    }

    fn cors(&self, res: Response) -> Response {
        let mut res = res;
        let headers = res.headers_mut();
        if let Ok(origin) = HeaderValue::from_str(&self.options.valid_editing_origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"));
        res
    }

    /// Lists the site's components for the editor.
    fn config(&self, req: &Request) -> Response {
        if req.method() == Method::OPTIONS {
            return self.cors(Response::status(StatusCode::NO_CONTENT));
        }
        if !self.secret_valid(req) {
            warn!("editing config requested with invalid secret");
            return Response::status(StatusCode::UNAUTHORIZED);
        }
        let body = json!({
            "components": self.engine.options().components(),
            "packages": {},
            "editMode": "metadata",
        });
        self.cors(Response::json(body.to_string().into_bytes()))
    }

    /// Sends the editor on to the page route, keeping its editing params.
    fn render_redirect(&self, req: &Request) -> Response {
        if !self.secret_valid(req) {
            warn!("editing render requested with invalid secret");
            return Response::status(StatusCode::UNAUTHORIZED);
        }
        let Some(route) = req.query("route").filter(|r| is_local_route(r)) else {
            warn!("editing render requested with a non-local route");
            return Response::status(StatusCode::BAD_REQUEST);
        };

        let carried: Vec<(&str, &str)> = EDITING_QUERY_PARAMS.iter()
            .filter(|name| **name != "route")
            .flat_map(|name| req.query_all(name).into_iter().map(move |v| (*name, v)))
            .collect();
        let location = match serde_urlencoded::to_string(&carried) {
            Ok(query) if !query.is_empty() => format!("{route}?{query}"),
            _ => route.to_owned(),
        };
        Response::redirect(&location)
    }
}

/// `true` for a path on this site. Browsers read `//host` and `/\host` in a
/// `Location` header as another origin, and drop tabs and newlines before
/// doing so.
fn is_local_route(route: &str) -> bool {
    let bytes = route.as_bytes();
    bytes.first() == Some(&b'/')
        && !matches!(bytes.get(1), Some(b'/' | b'\\'))
        && !bytes.iter().any(u8::is_ascii_control)
}

/// Length-revealing but otherwise constant-time comparison.
fn secrets_match(expected: &[u8], given: &[u8]) -> bool {
    expected.len() == given.len()
        && expected.iter().zip(given).fold(0_u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

impl Middleware for PagesStage {
    fn name(&self) -> &'static str { "pages" }

    fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut req = req;
            if let Setup::Respond(res) = self.setup(&mut req) {
                return res;
            }
            let editing = req.editing_context().is_some();
            let mut res = next.run(req).await;
            if editing {
                self.render(&mut res);
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_values() {
        assert_eq!(EditingMode::parse("edit"), Some(EditingMode::Edit));
        assert_eq!(EditingMode::parse("preview"), Some(EditingMode::Preview));
        assert_eq!(EditingMode::parse("normal"), None);
        assert_eq!(EditingMode::parse("EDIT"), None);
    }

    #[test]
    fn local_routes() {
        assert!(is_local_route("/"));
        assert!(is_local_route("/about/team"));
        assert!(is_local_route("/a//b"));
        assert!(!is_local_route(""));
        assert!(!is_local_route("about"));
        assert!(!is_local_route("//evil.example"));
        assert!(!is_local_route("/\\evil.example"));
        assert!(!is_local_route("/\t/evil.example"));
        assert!(!is_local_route("/about\r\nSet-Cookie: x=1"));
        assert!(!is_local_route("https://evil.example"));
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match(b"abc", b"abc"));
        assert!(!secrets_match(b"abc", b"abd"));
        assert!(!secrets_match(b"abc", b"abcd"));
        assert!(secrets_match(b"", b""));
    }
}
