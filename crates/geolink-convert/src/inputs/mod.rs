//! Registry of supported map services.
//!
//! Each provider is pure data: a guard regex claiming the shared text,
//! ordered extraction rules, optional short-link and HTML/web fallback
//! declarations, and the prompt strings the UI shows around network
//! consent. New providers are added here without touching the state
//! machine.

mod amap;
mod apple;
mod baidu;
mod bing;
mod google;
mod here;
mod kr;
mod misc;
mod organic;
mod osm;
mod plain;
mod waze;
mod yandex;

use std::sync::LazyLock;

use regex::Regex;

use geolink_core::point::ReferenceSystem;

use crate::pattern::{HtmlPattern, UriPattern};

/// HTTP method used to resolve a provider's short links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortUriMethod {
    /// Follow redirects and use the effective URL.
    Get,
    /// Read the `Location` header of the first redirect.
    Head,
}

/// One supported map service. Read-only after construction.
pub struct Input {
    pub name: &'static str,
    /// Reference system of coordinates extracted from this provider.
    pub system: ReferenceSystem,
    pub uri_pattern: UriPattern,
    pub short_uri_pattern: Option<Regex>,
    pub short_uri_method: ShortUriMethod,
    pub html_pattern: Option<HtmlPattern>,
    /// Whether an embedded browser can resolve links this provider only
    /// materializes client-side.
    pub web_parse: bool,
    /// Consent question shown before any network access for this provider.
    pub permission_prompt: &'static str,
    /// Progress text shown while a network step runs.
    pub loading_indicator: &'static str,
}

impl Input {
    fn new(
        name: &'static str,
        system: ReferenceSystem,
        uri_pattern: UriPattern,
        permission_prompt: &'static str,
        loading_indicator: &'static str,
    ) -> Self {
        Self {
            name,
            system,
            uri_pattern,
            short_uri_pattern: None,
            short_uri_method: ShortUriMethod::Get,
            html_pattern: None,
            web_parse: false,
            permission_prompt,
            loading_indicator,
        }
    }

    fn with_short(mut self, pattern: &str, method: ShortUriMethod) -> Self {
        self.short_uri_pattern = Some(Regex::new(pattern).expect("valid regex"));
        self.short_uri_method = method;
        self
    }

    fn with_html(mut self, html_pattern: HtmlPattern) -> Self {
        self.html_pattern = Some(html_pattern);
        self
    }

    fn with_web_parse(mut self) -> Self {
        self.web_parse = true;
        self
    }
}

static REGISTRY: LazyLock<Vec<Input>> = LazyLock::new(|| {
    vec![
        plain::geo(),
        google::input(),
        apple::input(),
        osm::input(),
        waze::input(),
        organic::ge0(),
        organic::omaps(),
        yandex::input(),
        baidu::input(),
        amap::input(),
        bing::input(),
        here::input(),
        kr::kakao(),
        kr::naver(),
        misc::two_gis(),
        misc::magic_earth(),
        misc::mapy_cz(),
        misc::moovit(),
        misc::petal(),
        misc::citymapper(),
        misc::sygic(),
        plain::coordinates(),
    ]
});

/// The ordered, immutable provider registry. First match wins, so the
/// catch-all bare-coordinates input sits last.
#[must_use]
pub fn registry() -> &'static [Input] {
    &REGISTRY
}
