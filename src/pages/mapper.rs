//! Editing query-string parameters → layout request headers.

use tracing::trace;

use crate::layout::LayoutRequest;
use crate::request::Request;

/// Query parameters the editor sends that the layout fetch needs, in the
/// order they are copied.
pub const EDITING_QUERY_PARAMS: [&str; 9] = [
    "mode",
    "sc_itemid",
    "sc_version",
    "sc_lang",
    "sc_site",
    "sc_layoutKind",
    "secret",
    "tenant_id",
    "route",
];

/// Copies every [`EDITING_QUERY_PARAMS`] entry present on `req` into
/// `layout` as a header of the same name, values verbatim. Absent names
/// are skipped; other query parameters are ignored.
pub fn map_query_to_layout_request(req: &Request, layout: &mut LayoutRequest) {
    for name in EDITING_QUERY_PARAMS {
        let values = req.query_all(name);
        if values.is_empty() {
            trace!(param = name, "editing param absent");
            continue;
        }
        layout.add_header(name, values);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use proptest::prelude::*;

    use super::*;

    fn get(uri: &str) -> Request {
        Request::from_http(http::Request::get(uri).body(Bytes::new()).unwrap())
    }

    fn mapped(uri: &str) -> LayoutRequest {
        let mut layout = LayoutRequest::new();
        map_query_to_layout_request(&get(uri), &mut layout);
        layout
    }

    #[test]
    fn copies_allow_listed_params_only() {
        let layout = mapped("/?mode=edit&sc_lang=en&unrelated=1");
        assert_eq!(layout.headers().len(), 2);
        assert_eq!(layout.header_value("mode"), Some("edit"));
        assert_eq!(layout.header_value("sc_lang"), Some("en"));
        assert!(layout.header("unrelated").is_none());
    }

    #[test]
    fn no_query_string_adds_nothing() {
        assert!(mapped("/about").headers().is_empty());
    }

    #[test]
    fn names_are_case_sensitive() {
        let layout = mapped("/?sc_layoutkind=final&SC_LANG=en");
        assert!(layout.headers().is_empty());
    }

    #[test]
    fn repeated_values_are_all_copied() {
        let layout = mapped("/?sc_site=a&sc_site=b");
        assert_eq!(layout.header("sc_site"), Some(&["a".to_owned(), "b".to_owned()][..]));
    }

    #[test]
    fn existing_entries_are_kept() {
        let mut layout = LayoutRequest::new();
        layout.add_header("x-custom", ["1"]);
        map_query_to_layout_request(&get("/?route=%2Fhome"), &mut layout);
        assert_eq!(layout.header_value("x-custom"), Some("1"));
        assert_eq!(layout.header_value("route"), Some("/home"));
    }

    fn value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 /:{}_.=&-]{0,16}"
    }

    proptest! {
        #[test]
        fn maps_exactly_the_present_subset(
            picks in proptest::collection::vec(proptest::option::of(value()), 9),
            noise in proptest::collection::vec(("x_[a-z]{1,6}", value()), 0..4),
        ) {
            let mut pairs: Vec<(String, String)> = EDITING_QUERY_PARAMS.iter()
                .zip(&picks)
                .filter_map(|(name, v)| v.as_ref().map(|v| ((*name).to_owned(), v.clone())))
                .collect();
            pairs.extend(noise);
            let query = serde_urlencoded::to_string(&pairs).unwrap();

            let layout = mapped(&format!("/?{query}"));

            let expected = picks.iter().filter(|v| v.is_some()).count();
            prop_assert_eq!(layout.headers().len(), expected);
            for (name, pick) in EDITING_QUERY_PARAMS.iter().zip(&picks) {
                match pick {
                    Some(v) => prop_assert_eq!(layout.header(name), Some(&[v.clone()][..])),
                    None => prop_assert!(layout.header(name).is_none()),
                }
            }
        }

        #[test]
        fn unrelated_params_add_nothing(
            noise in proptest::collection::vec(("x_[a-z]{1,6}", value()), 0..6),
        ) {
            let query = serde_urlencoded::to_string(&noise).unwrap();
            let uri = format!("/?{query}");
            prop_assert!(mapped(&uri).headers().is_empty());
        }
    }
}
