//! The `"pages"` layout handler: fetches edit-time layout over GraphQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{Instrument, debug, debug_span, warn};

use crate::error::{Error, Result};
use crate::handler::BoxFuture;
use crate::layout::{LayoutHandler, LayoutRequest, LayoutResponse, LayoutSerializer};
use crate::pages::graphql::{GraphQlClient, GraphQlClientFactory};

const DICTIONARY_PAGE_SIZE: u32 = 50;
/// Upper bound on dictionary pages per editing fetch, the first included.
const MAX_DICTIONARY_PAGES: usize = 100;
const DEFAULT_LANGUAGE: &str = "en";

const EDITING_QUERY: &str = r#"
query EditingQuery($siteName: String!, $itemId: String!, $language: String!, $version: String, $after: String, $pageSize: Int) {
  item(path: $itemId, language: $language, version: $version) {
    rendered
  }
  site {
    siteInfo(site: $siteName) {
      dictionary(language: $language, first: $pageSize, after: $after) {
        pageInfo { endCursor hasNext }
        results { key value }
      }
    }
  }
}"#;

const DICTIONARY_QUERY: &str = r#"
query DictionaryQuery($siteName: String!, $language: String!, $after: String, $pageSize: Int) {
  site {
    siteInfo(site: $siteName) {
      dictionary(language: $language, first: $pageSize, after: $after) {
        pageInfo { endCursor hasNext }
        results { key value }
      }
    }
  }
}"#;

#[derive(Deserialize)]
struct EditingData {
    item: Option<RenderedItem>,
    site: Option<SiteData>,
}

#[derive(Deserialize)]
struct DictionaryData {
    site: Option<SiteData>,
}

#[derive(Deserialize)]
struct RenderedItem {
    rendered: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteData {
    site_info: Option<SiteInfo>,
}

#[derive(Deserialize)]
struct SiteInfo {
    dictionary: DictionaryPage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DictionaryPage {
    page_info: PageInfo,
    #[serde(default)]
    results: Vec<DictionaryEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next: bool,
}

#[derive(Deserialize)]
struct DictionaryEntry {
    key: String,
    value: String,
}

fn dictionary_of(site: Option<SiteData>) -> Option<DictionaryPage> {
    site.and_then(|s| s.site_info).map(|i| i.dictionary)
}

/// Reads the editing parameters the query mapper copied onto the layout
/// request (`sc_itemid`, `sc_site`, `sc_lang`, `sc_version`, `secret`),
/// runs the editing query, and deserializes the rendered layout with the
/// shared serializer. Dictionary pages are followed until exhausted.
pub struct GraphQlEditingHandler {
    name: String,
    clients: GraphQlClientFactory,
    serializer: Arc<dyn LayoutSerializer>,
}

impl GraphQlEditingHandler {
    pub fn new(
        name: impl Into<String>,
        clients: GraphQlClientFactory,
        serializer: Arc<dyn LayoutSerializer>,
    ) -> Self {
        Self { name: name.into(), clients, serializer }
    }

    fn client_for(&self, request: &LayoutRequest) -> Result<GraphQlClient> {
        let client = self.clients.create().with_header("sc_editmode", "true")?;
        match request.header_value("secret") {
            Some(secret) => client.with_header("authorization", &format!("Bearer {secret}")),
            None => Ok(client),
        }
    }

    async fn run(&self, request: &LayoutRequest) -> Result<LayoutResponse> {
        let item_id = request.header_value("sc_itemid")
            .ok_or_else(|| Error::InvalidEditingRequest("missing sc_itemid".to_owned()))?;
        let site = request.header_value("sc_site")
            .ok_or_else(|| Error::InvalidEditingRequest("missing sc_site".to_owned()))?;
        let language = request.header_value("sc_lang").unwrap_or(DEFAULT_LANGUAGE);
        let version = request.header_value("sc_version");

        let client = self.client_for(request)?;
        let mut variables = json!({
            "siteName": site,
            "itemId": item_id,
            "language": language,
            "version": version,
            "after": null,
            "pageSize": DICTIONARY_PAGE_SIZE,
        });

        let data: EditingData = client.query(EDITING_QUERY, &variables).await?;
        let item = data.item
            .ok_or_else(|| Error::GraphQl(format!("item {item_id} not found for editing")))?;
        let mut layout = self.serializer.deserialize(&serde_json::to_vec(&item.rendered)?)?;

        let mut dictionary = BTreeMap::new();
        let mut page = dictionary_of(data.site);
        let mut fetched = 1;
        let mut previous: Option<String> = None;
        while let Some(current) = page.take() {
            dictionary.extend(current.results.into_iter().map(|e| (e.key, e.value)));
            if !current.page_info.has_next {
                break;
            }
            // A missing or repeated cursor would restart or repeat the same page.
            let Some(cursor) = current.page_info.end_cursor else {
                warn!(item = item_id, "dictionary page claims more results but has no cursor");
                break;
            };
            if previous.as_deref() == Some(cursor.as_str()) {
                warn!(item = item_id, %cursor, "dictionary cursor did not advance");
                break;
            }
            if fetched >= MAX_DICTIONARY_PAGES {
                return Err(Error::GraphQl(format!(
                    "dictionary exceeded {MAX_DICTIONARY_PAGES} pages",
                )));
            }

            variables["after"] = json!(cursor);
            let next: DictionaryData = client.query(DICTIONARY_QUERY, &variables).await?;
            fetched += 1;
            previous = Some(cursor);
            page = dictionary_of(next.site);
        }

        debug!(item = item_id, entries = dictionary.len(), "editing layout fetched");
        layout.sitecore.context.dictionary.extend(dictionary);
        Ok(layout)
    }
}

impl LayoutHandler for GraphQlEditingHandler {
    fn fetch<'a>(&'a self, request: &'a LayoutRequest) -> BoxFuture<'a, Result<LayoutResponse>> {
        let span = debug_span!("layout_fetch", handler = %self.name, context_id = self.clients.context_id());
        Box::pin(self.run(request).instrument(span))
    }
}
