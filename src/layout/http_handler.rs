//! Plain HTTP layout handler.

use std::sync::Arc;

use tracing::{Instrument, debug, debug_span};

use crate::error::{Error, Result};
use crate::handler::BoxFuture;
use crate::layout::handler::LayoutHandler;
use crate::layout::request::LayoutRequest;
use crate::layout::response::LayoutResponse;
use crate::layout::serializer::LayoutSerializer;

/// Fetches layout with a `GET` against the layout service endpoint.
///
/// Layout-request params become the query string. Layout-request headers
/// are sent as HTTP headers, multiple values joined with `,`.
pub struct HttpLayoutHandler {
    name: String,
    endpoint: String,
    client: reqwest::Client,
    serializer: Arc<dyn LayoutSerializer>,
}

impl HttpLayoutHandler {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        client: reqwest::Client,
        serializer: Arc<dyn LayoutSerializer>,
    ) -> Self {
        Self { name: name.into(), endpoint: endpoint.into(), client, serializer }
    }

    async fn send(&self, request: &LayoutRequest) -> Result<LayoutResponse> {
        let mut outgoing = self.client.get(&self.endpoint).query(request.params());
        for (name, values) in request.headers() {
            outgoing = outgoing.header(name.as_str(), values.join(","));
        }

        let res = outgoing.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::LayoutService { status: status.as_u16() });
        }

        let body = res.bytes().await?;
        debug!(bytes = body.len(), "layout received");
        self.serializer.deserialize(&body)
    }
}

impl LayoutHandler for HttpLayoutHandler {
    fn fetch<'a>(&'a self, request: &'a LayoutRequest) -> BoxFuture<'a, Result<LayoutResponse>> {
        let span = debug_span!("layout_fetch", handler = %self.name, endpoint = %self.endpoint);
        Box::pin(self.send(request).instrument(span))
    }
}
