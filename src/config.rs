//! File and environment configuration.
//!
//! ```toml
//! [layout]
//! service_url = "https://cms.example.com/sitecore/api/layout/render/jss"
//! api_key = "{GUID}"
//! site = "web"
//! language = "en"
//!
//! [pages]
//! context_id = "abc123"
//! editing_secret = "s3cret"
//! ```
//!
//! Environment overrides, applied by [`Settings::apply_env`]:
//! `RENDRA_LAYOUT_URL`, `RENDRA_CONTEXT_ID`, `RENDRA_EDITING_SECRET`.

use std::path::Path;

use serde::Deserialize;

use crate::engine::RenderingEngineBuilder;
use crate::error::{Error, Result};
use crate::pages::PagesOptions;

/// Name of the HTTP layout handler wired from `[layout]`.
pub const DEFAULT_HANDLER: &str = "default";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub pages: Option<PagesSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    pub service_url: Option<String>,
    pub api_key: Option<String>,
    pub site: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagesSettings {
    pub context_id: String,
    #[serde(flatten)]
    pub options: PagesOptions,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Applies `RENDRA_*` overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Setting a context id turns
    /// Pages on even when the file had no `[pages]` table.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("RENDRA_LAYOUT_URL") {
            self.layout.service_url = Some(url);
        }
        if let Some(context_id) = lookup("RENDRA_CONTEXT_ID") {
            match &mut self.pages {
                Some(pages) => pages.context_id = context_id,
                None => {
                    self.pages = Some(PagesSettings { context_id, options: PagesOptions::default() });
                }
            }
        }
        if let Some(secret) = lookup("RENDRA_EDITING_SECRET") {
            if let Some(pages) = &mut self.pages {
                pages.options.editing_secret = Some(secret);
            }
        }
        self
    }
}

impl RenderingEngineBuilder {
    /// Wires the `[layout]` service as the default HTTP handler and, when
    /// `[pages]` is present, enables Pages with the editing handler.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let layout = &settings.layout;
        let url = layout.service_url.clone()
            .ok_or_else(|| Error::Config("layout.service_url is required".to_owned()))?;

        let mut builder = Self::new()
            .configure(|o| {
                o.default_language = layout.language.clone();
                o.default_site = layout.site.clone();
                o.api_key = layout.api_key.clone();
            })
            .layout_client(|client| client
                .add_http_handler(DEFAULT_HANDLER, url)
                .default_handler(DEFAULT_HANDLER));

        if let Some(pages) = &settings.pages {
            let options = pages.options.clone();
            builder = builder
                .with_pages_configured(pages.context_id.as_str(), |o| *o = options)
                .layout_client(|client| client.add_pages_handler());
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::pages::PAGES_HANDLER;

    const FULL: &str = r#"
[layout]
service_url = "https://cms.example.com/layout"
site = "web"
language = "en"

[pages]
context_id = "ctx"
editing_secret = "s3cret"
valid_origins = ["https://staging.example.com"]
"#;

    #[test]
    fn parses_full_file() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        assert_eq!(settings.layout.site.as_deref(), Some("web"));
        let pages = settings.pages.unwrap();
        assert_eq!(pages.context_id, "ctx");
        assert_eq!(pages.options.editing_secret.as_deref(), Some("s3cret"));
        assert_eq!(pages.options.config_endpoint, "/api/editing/config");
    }

    #[test]
    fn rejects_unknown_layout_keys() {
        let err = Settings::from_toml_str("[layout]\nservice_uri = \"x\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn env_overrides_enable_pages() {
        let env: HashMap<&str, &str> = [
            ("RENDRA_LAYOUT_URL", "http://localhost:9000/layout"),
            ("RENDRA_CONTEXT_ID", "from-env"),
            ("RENDRA_EDITING_SECRET", "env-secret"),
        ].into();
        let settings = Settings::default()
            .apply_overrides(|k| env.get(k).map(|v| (*v).to_owned()));

        assert_eq!(settings.layout.service_url.as_deref(), Some("http://localhost:9000/layout"));
        let pages = settings.pages.unwrap();
        assert_eq!(pages.context_id, "from-env");
        assert_eq!(pages.options.editing_secret.as_deref(), Some("env-secret"));
    }

    #[test]
    fn builder_from_settings() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        let builder = RenderingEngineBuilder::from_settings(&settings).unwrap();
        assert!(builder.pages_enabled());
        assert!(builder.layout.contains(DEFAULT_HANDLER));
        assert!(builder.layout.contains(PAGES_HANDLER));
        assert_eq!(builder.options().default_site.as_deref(), Some("web"));
    }

    #[test]
    fn service_url_is_required() {
        let result = RenderingEngineBuilder::from_settings(&Settings::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
