//! Request classification.
//!
//! Rules are evaluated in table order and the first match wins. Requests
//! that match no rule revalidate in the background.

use serde::Serialize;
use std::fmt;
use stowaway_core::AppConfig;

use crate::request::InterceptedRequest;

/// Caching strategy chosen for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CacheFirst => write!(f, "cache-first"),
            Strategy::NetworkFirst => write!(f, "network-first"),
            Strategy::StaleWhileRevalidate => write!(f, "stale-while-revalidate"),
        }
    }
}

/// What the router does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted: straight to the network, no cache reads or writes.
    Passthrough,
    Intercept(Strategy),
}

struct Rule {
    name: &'static str,
    matches: fn(&Classifier, &InterceptedRequest) -> bool,
    strategy: Strategy,
}

const RULES: &[Rule] = &[
    Rule { name: "static-asset", matches: Classifier::is_static_asset, strategy: Strategy::CacheFirst },
    Rule { name: "api", matches: Classifier::is_api_request, strategy: Strategy::NetworkFirst },
    Rule { name: "html-page", matches: Classifier::is_html_page, strategy: Strategy::NetworkFirst },
];

const FALLBACK: Strategy = Strategy::StaleWhileRevalidate;

/// Maps requests to strategies.
#[derive(Debug, Clone)]
pub struct Classifier {
    static_paths: Vec<String>,
    static_prefix: String,
    api_prefix: String,
    asset_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(
        static_paths: Vec<String>, static_prefix: impl Into<String>, api_prefix: impl Into<String>,
        asset_hosts: Vec<String>,
    ) -> Self {
        Self {
            static_paths,
            static_prefix: static_prefix.into(),
            api_prefix: api_prefix.into(),
            asset_hosts: asset_hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.manifest_paths().map(String::from).collect(),
            config.static_prefix.clone(),
            config.api_prefix.clone(),
            config.asset_hosts.clone(),
        )
    }

    /// Pick the route for a request. Only GET is intercepted.
    pub fn classify(&self, request: &InterceptedRequest) -> Route {
        if request.method != reqwest::Method::GET {
            return Route::Passthrough;
        }

        let strategy = RULES
            .iter()
            .find(|rule| (rule.matches)(self, request))
            .map(|rule| {
                tracing::trace!(rule = rule.name, url = %request.url, "classified");
                rule.strategy
            })
            .unwrap_or(FALLBACK);

        Route::Intercept(strategy)
    }

    /// Whether the URL lives under the API prefix.
    pub fn is_api(&self, url: &url::Url) -> bool {
        url.path().starts_with(&self.api_prefix)
    }

    fn is_static_asset(&self, request: &InterceptedRequest) -> bool {
        let path = request.url.path();
        self.static_paths.iter().any(|p| p == path)
            || path.starts_with(&self.static_prefix)
            || request
                .url
                .host_str()
                .is_some_and(|host| self.asset_hosts.iter().any(|h| h == host))
    }

    fn is_api_request(&self, request: &InterceptedRequest) -> bool {
        self.is_api(&request.url)
    }

    fn is_html_page(&self, request: &InterceptedRequest) -> bool {
        request.accepts_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn classifier() -> Classifier {
        Classifier::from_config(&AppConfig::default())
    }

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(url::Url::parse(url).unwrap())
    }

    #[test]
    fn test_non_get_passes_through() {
        let c = classifier();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let request = InterceptedRequest::new(method, url::Url::parse("http://localhost:5000/static/x.js").unwrap());
            assert_eq!(c.classify(&request), Route::Passthrough);
        }
    }

    #[test]
    fn test_static_prefix_is_cache_first() {
        let route = classifier().classify(&get("http://localhost:5000/static/js/kanban.js"));
        assert_eq!(route, Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_manifest_path_is_cache_first() {
        // "/" is in the manifest, so the shell wins over the html rule
        let request = get("http://localhost:5000/").with_header("Accept", "text/html");
        assert_eq!(classifier().classify(&request), Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_asset_host_is_cache_first() {
        let route = classifier().classify(&get("https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.min.js"));
        assert_eq!(route, Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_api_is_network_first() {
        let route = classifier().classify(&get("http://localhost:5000/api/flows/templates"));
        assert_eq!(route, Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_static_rule_precedes_api_rule() {
        let c = Classifier::new(Vec::new(), "/api/assets/", "/api/", Vec::new());
        assert_eq!(c.classify(&get("http://localhost:5000/api/assets/logo.png")), Route::Intercept(Strategy::CacheFirst));
    }

    #[test]
    fn test_html_page_is_network_first() {
        let request = get("http://localhost:5000/dashboard").with_header("Accept", "text/html,*/*;q=0.8");
        assert_eq!(classifier().classify(&request), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_html_in_repeated_accept_is_network_first() {
        let request = get("http://localhost:5000/dashboard")
            .with_header("Accept", "application/json")
            .with_header("Accept", "text/html");
        assert_eq!(classifier().classify(&request), Route::Intercept(Strategy::NetworkFirst));
    }

    #[test]
    fn test_other_is_stale_while_revalidate() {
        assert_eq!(
            classifier().classify(&get("http://localhost:5000/favicon.ico")),
            Route::Intercept(Strategy::StaleWhileRevalidate)
        );
        let request = get("http://localhost:5000/dashboard").with_header("Accept", "application/json");
        assert_eq!(classifier().classify(&request), Route::Intercept(Strategy::StaleWhileRevalidate));
    }

    #[test]
    fn test_is_api() {
        let c = classifier();
        assert!(c.is_api(&url::Url::parse("http://localhost:5000/api/user/projects").unwrap()));
        assert!(!c.is_api(&url::Url::parse("http://localhost:5000/apiary").unwrap()));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
    }
}
