//! Layout service response model.
//!
//! Only the parts the rendering engine reads are typed; everything else is
//! kept as raw JSON so a round-trip through the serializer loses nothing.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResponse {
    #[serde(default)]
    pub sitecore: SitecoreData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitecoreData {
    #[serde(default)]
    pub context: Context,
    #[serde(default)]
    pub route: Option<Route>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default)]
    pub page_editing: bool,
    #[serde(default)]
    pub page_state: PageState,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub site: Option<Site>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dictionary: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    #[default]
    Normal,
    Edit,
    Preview,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_language: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub placeholders: BTreeMap<String, Vec<Component>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub uid: Option<String>,
    pub component_name: String,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub placeholders: BTreeMap<String, Vec<Component>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    /// Reads one top-level property of the component by its wire name
    /// (`"uid"`, `"dataSource"`, `"params"`, or anything the layout service
    /// added) and deserializes it as `T`.
    ///
    /// `Ok(None)` when the component has no such property or it is `null`.
    pub fn property<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let value = match self.extra.get(name) {
            Some(value) => value.clone(),
            None => match serde_json::to_value(self)? {
                Value::Object(mut props) => props.remove(name).unwrap_or(Value::Null),
                _ => Value::Null,
            },
        };
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Deserializes the component's `fields` into a model.
    ///
    /// ```rust
    /// # use rendra::layout::Component;
    /// #[derive(serde::Deserialize)]
    /// struct Title { value: String }
    ///
    /// #[derive(serde::Deserialize)]
    /// struct Hero { title: Title }
    ///
    /// let component: Component = serde_json::from_str(
    ///     r#"{ "componentName": "Hero", "fields": { "title": { "value": "Hi" } } }"#,
    /// )?;
    /// let hero: Hero = component.bind()?;
    /// assert_eq!(hero.title.value, "Hi");
    /// # Ok::<(), rendra::Error>(())
    /// ```
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

impl LayoutResponse {
    /// `true` when the layout was produced for an editing session.
    pub fn is_editing(&self) -> bool {
        self.sitecore.context.page_editing || self.sitecore.context.page_state == PageState::Edit
    }

    /// Components in a top-level placeholder of the route.
    pub fn placeholder(&self, name: &str) -> &[Component] {
        self.sitecore.route.as_ref()
            .and_then(|r| r.placeholders.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
