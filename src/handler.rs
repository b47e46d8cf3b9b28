//! Route handler trait and type erasure.
//!
//! # Storing page handlers
//!
//! Every `async fn` has its own anonymous type, and so does the future it
//! returns. A route table holds one value type, so each handler is wrapped
//! in `FnHandler` and stored as `Arc<dyn ErasedHandler>`. The Pages stage
//! and any other middleware then reach the route through the same
//! [`Next`](crate::middleware::Next) call, whatever the handler's type.
//!
//! ```text
//! async fn page(req: Request) -> Result<Response, Error>   ← user code
//!        ↓ app.on(Method::GET, "/{*path}", page)
//! page.into_boxed_handler()                                ← blanket impl
//!        ↓
//! Arc::new(FnHandler(page))                                ← BoxedHandler
//!        ↓ at request time, after the pipeline's setup phases
//! handler.call(req)                                        ← one dynamic call
//!        ↓
//! Box::pin(async { page(req).await.into_response() })      ← BoxFuture
//! ```
//!
//! Per request this costs one atomic increment (the `Arc` clone out of the
//! router) and one virtual call, next to a layout fetch over the network.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
///
/// Shared by route handlers, middleware and layout handlers, so a
/// [`LayoutHandler`](crate::layout::LayoutHandler) can be an object too. The
/// runtime polls it in place, hence the `Pin`; `Send` lets tokio move the
/// task between worker threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)`: it appears in the return
/// type of [`Handler::into_boxed_handler`]. Nothing outside the crate has a
/// use for it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

/// A type-erased handler shared across concurrent requests.
///
/// Cloned out of the router once per request; the handler itself is never
/// copied.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Never implemented by hand. Any function of this shape qualifies:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// `Result<Response, Error>` is an `IntoResponse`, so page handlers can use
/// `?` on [`RenderingEngine::fetch_layout`](crate::RenderingEngine::fetch_layout).
///
/// Sealed through a private supertrait: only the blanket impl below can
/// satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Private, so other crates cannot name `Sealed` and cannot implement
/// `Handler` themselves.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

/// Covers named `async fn`s, closures returning an `async` block (the
/// integration tests capture state this way) and anything else that is `Fn`.

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds one concrete handler and implements [`ErasedHandler`] for it.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        // The concrete future is only known here; box it after mapping its
        // output to a `Response` so the signature matches the trait.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
