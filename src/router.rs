//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. A catch-all route such
//! as `/{*path}` is how a CMS-driven site sends every page to one handler:
//! the layout service, not the router, knows which pages exist.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// Route table. Built once at startup by [`App`](crate::App), then only
/// read; lookups allocate nothing but the captured parameters.
pub(crate) struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// # Panics
    ///
    /// Panics on a malformed or conflicting path. Routes are fixed at
    /// startup, so this fails before the first request is served.
    pub(crate) fn add(&mut self, method: Method, path: &str, handler: impl Handler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    /// The handler for `path` and its captured parameters. `None` becomes
    /// a 404 at the end of the pipeline, after the Pages stage had its turn,
    /// so the editing endpoints need no route of their own.
    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn page(_: Request) -> Response { Response::text("page") }

    #[test]
    fn catch_all_captures_the_route() {
        let mut router = Router::new();
        router.add(Method::GET, "/{*path}", page);
        let (_, params) = router.lookup(&Method::GET, "/about/team").unwrap();
        assert_eq!(params["path"], "about/team");
    }

    #[test]
    fn method_mismatch_misses() {
        let mut router = Router::new();
        router.add(Method::GET, "/", page);
        assert!(router.lookup(&Method::POST, "/").is_none());
    }
}
