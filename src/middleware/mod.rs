//! Middleware layer.
//!
//! Middleware intercepts a request before its route handler runs and the
//! response after. Stages run in registration order; each receives a
//! [`Next`] it must call exactly once to continue, or skip to short-circuit
//! with its own response.
//!
//! ```text
//! Request → stage 1 → stage 2 → … → route handler
//!                                       ↓
//! Response ← stage 1 ← stage 2 ← … ←────┘
//! ```

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;

/// A pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    /// Stable stage name, used in logs and [`App::stage_names`](crate::App::stage_names).
    fn name(&self) -> &'static str;

    fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// The rest of the chain after the current stage.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Terminal),
}

/// What the chain ends in: a matched route, or nothing (404).
pub(crate) enum Terminal {
    Route(BoxedHandler),
    NotFound,
}

impl<'a> Next<'a> {
    /// Runs the next stage, or the route handler when no stages remain.
    pub async fn run(self, req: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(req, *next).await,
            NextInner::Handler(Terminal::Route(handler)) => handler.call(req).await,
            NextInner::Handler(Terminal::NotFound) => {
                Response::status(http::StatusCode::NOT_FOUND)
            }
        }
    }
}

/// Ordered list of stages, fixed once the app starts serving.
#[derive(Default)]
pub(crate) struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub(crate) fn push(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub(crate) async fn run(&self, req: Request, terminal: Terminal) -> Response {
        let mut next = Next { inner: NextInner::Handler(terminal) };
        for stage in self.stages.iter().rev() {
            next = Next {
                inner: NextInner::Chain { middleware: stage.as_ref(), next: Box::new(next) },
            };
        }
        next.run(req).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::handler::Handler;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Record {
        fn name(&self) -> &'static str { self.name }

        fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name);
                next.run(req).await
            })
        }
    }

    struct Deny;

    impl Middleware for Deny {
        fn name(&self) -> &'static str { "deny" }

        fn process<'a>(&'a self, _req: Request, _next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async { Response::status(StatusCode::FORBIDDEN) })
        }
    }

    fn req() -> Request {
        Request::from_http(http::Request::get("/").body(Bytes::new()).unwrap())
    }

    async fn ok(_: Request) -> Response { Response::text("ok") }

    #[tokio::test]
    async fn stages_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::default();
        pipeline.push(Arc::new(Record { name: "first", log: Arc::clone(&log) }));
        pipeline.push(Arc::new(Record { name: "second", log: Arc::clone(&log) }));

        let res = pipeline.run(req(), Terminal::Route(ok.into_boxed_handler())).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(pipeline.names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::default();
        pipeline.push(Arc::new(Deny));
        pipeline.push(Arc::new(Record { name: "after", log: Arc::clone(&log) }));

        let res = pipeline.run(req(), Terminal::Route(ok.into_boxed_handler())).await;

        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let pipeline = Pipeline::default();
        let res = pipeline.run(req(), Terminal::NotFound).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }
}
