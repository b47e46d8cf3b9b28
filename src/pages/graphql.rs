//! GraphQL client for the editing endpoint.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_EDGE_URL: &str = "https://edge-platform.sitecorecloud.io";
const GRAPHQL_PATH: &str = "/v1/content/api/graphql/v1";

/// Hands out [`GraphQlClient`]s bound to one context id.
///
/// Registered in [`Services`](crate::Services) by
/// [`with_pages`](crate::RenderingEngineBuilder::with_pages).
#[derive(Debug, Clone)]
pub struct GraphQlClientFactory {
    context_id: String,
    base_url: String,
    http: reqwest::Client,
}

impl GraphQlClientFactory {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            base_url: DEFAULT_EDGE_URL.to_owned(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn context_id(&self) -> &str { &self.context_id }

    pub fn endpoint(&self) -> String {
        format!("{}{GRAPHQL_PATH}", self.base_url.trim_end_matches('/'))
    }

    pub fn create(&self) -> GraphQlClient {
        GraphQlClient {
            http: self.http.clone(),
            endpoint: self.endpoint(),
            context_id: self.context_id.clone(),
            headers: HeaderMap::new(),
        }
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
    context_id: String,
    headers: HeaderMap,
}

impl GraphQlClient {
    /// Adds a header sent with every query from this client. `name` must be
    /// a lowercase header name.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidEditingRequest(format!("`{name}` is not a valid header value")))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    /// Posts `query` and decodes `data` as `T`. A non-empty `errors` array
    /// fails the call even when `data` is present.
    pub async fn query<T: DeserializeOwned>(&self, query: &str, variables: &Value) -> Result<T> {
        let res = self.http
            .post(&self.endpoint)
            .query(&[("sitecoreContextId", self.context_id.as_str())])
            .headers(self.headers.clone())
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::LayoutService { status: status.as_u16() });
        }

        let body: GraphQlResponse<T> = res.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GraphQl(messages.join("; ")));
        }
        body.data.ok_or_else(|| Error::GraphQl("response carried no data".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Ping {
        ping: String,
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let factory = GraphQlClientFactory::new("ctx").with_base_url("https://edge.example.com/");
        assert_eq!(factory.endpoint(), "https://edge.example.com/v1/content/api/graphql/v1");
    }

    #[test]
    fn rejects_unencodable_header_values() {
        let client = GraphQlClientFactory::new("ctx").create();
        assert!(client.with_header("authorization", "bad\nvalue").is_err());
    }

    #[tokio::test]
    async fn posts_query_with_context_id_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(query_param("sitecoreContextId", "ctx-1"))
            .and(header("sc_editmode", "true"))
            .and(body_partial_json(serde_json::json!({ "variables": { "n": 1 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "ping": "pong" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphQlClientFactory::new("ctx-1")
            .with_base_url(server.uri())
            .create()
            .with_header("sc_editmode", "true")
            .unwrap();

        let data: Ping = client.query("query { ping }", &serde_json::json!({ "n": 1 })).await.unwrap();
        assert_eq!(data.ping, "pong");
    }

    #[tokio::test]
    async fn errors_array_fails_the_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [ { "message": "item not found" }, { "message": "bad site" } ]
            })))
            .mount(&server)
            .await;

        let client = GraphQlClientFactory::new("ctx").with_base_url(server.uri()).create();
        let err = client.query::<Ping>("query { ping }", &Value::Null).await.unwrap_err();
        match err {
            Error::GraphQl(msg) => assert_eq!(msg, "item not found; bad site"),
            other => panic!("expected GraphQl error, got {other:?}"),
        }
    }
}
