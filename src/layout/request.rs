//! Outgoing layout request.

use std::collections::{BTreeMap, HashMap};

/// Route path of the page to fetch layout for.
pub const ITEM: &str = "item";
pub const LANGUAGE: &str = "sc_lang";
pub const SITE: &str = "sc_site";
pub const API_KEY: &str = "sc_apikey";

/// What to fetch from the layout service for the current page.
///
/// Built fresh per inbound request. `params` travel as the layout-service
/// query string; `headers` are forwarded as request headers (or, for the
/// editing handler, read back as GraphQL variables). Mapping only ever adds
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRequest {
    params: BTreeMap<String, String>,
    headers: HashMap<String, Vec<String>>,
}

impl LayoutRequest {
    pub fn new() -> Self { Self::default() }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> { &self.params }

    pub fn path(&self) -> Option<&str> { self.param(ITEM) }
    pub fn language(&self) -> Option<&str> { self.param(LANGUAGE) }
    pub fn site(&self) -> Option<&str> { self.param(SITE) }

    /// Sets `name` to `values`. A second write to the same name replaces
    /// the first.
    pub fn add_header<I, V>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.headers.insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name).map(Vec::as_slice)
    }

    /// First value of a header.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, Vec<String>> { &self.headers }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_header_write_wins() {
        let mut req = LayoutRequest::new();
        req.add_header("mode", ["edit"]);
        req.add_header("mode", ["preview"]);
        assert_eq!(req.header("mode"), Some(&["preview".to_owned()][..]));
        assert_eq!(req.headers().len(), 1);
    }

    #[test]
    fn multi_valued_headers_keep_order() {
        let mut req = LayoutRequest::new();
        req.add_header("sc_site", vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(req.header_value("sc_site"), Some("a"));
        assert_eq!(req.header("sc_site").map(<[String]>::len), Some(2));
    }

    #[test]
    fn well_known_params() {
        let mut req = LayoutRequest::new();
        req.set_param(ITEM, "/about").set_param(LANGUAGE, "da");
        assert_eq!(req.path(), Some("/about"));
        assert_eq!(req.language(), Some("da"));
        assert_eq!(req.site(), None);
    }
}
