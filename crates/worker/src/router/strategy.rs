//! Strategy executors.

use std::sync::Arc;
use stowaway_core::{CacheDb, CachedEntry, CachedResponse, Error, RequestKey};

use super::{ResponseSource, Routed, Router, Strategy, fallback};
use crate::request::InterceptedRequest;

/// Store a response; a failed write never fails the request.
async fn store_response(db: &CacheDb, store: &str, key: &RequestKey, response: &CachedResponse) {
    match db.put_entry(store, key, response).await {
        Ok(()) => tracing::debug!(store, %key, "cached"),
        Err(e) => tracing::warn!(store, %key, "cache write failed: {e}"),
    }
}

fn routed(strategy: Strategy, source: ResponseSource, response: CachedResponse) -> Routed {
    Routed { strategy, source, response }
}

impl Router {
    /// Lookup across all stores; storage errors count as a miss.
    async fn lookup_any(&self, key: &RequestKey) -> Option<CachedEntry> {
        self.db.match_any(key).await.unwrap_or_else(|e| {
            tracing::warn!(%key, "cache lookup failed: {e}");
            None
        })
    }

    async fn lookup_in(&self, store: &str, key: &RequestKey) -> Option<CachedEntry> {
        self.db.match_in_store(store, key).await.unwrap_or_else(|e| {
            tracing::warn!(store, %key, "cache lookup failed: {e}");
            None
        })
    }

    pub(super) async fn cache_first(&self, request: &InterceptedRequest) -> Routed {
        let strategy = Strategy::CacheFirst;
        let key = request.key();

        if let Some(entry) = self.lookup_any(&key).await {
            tracing::debug!(%key, store = %entry.store, "cache hit");
            return routed(strategy, ResponseSource::Cache, entry.response);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store_response(&self.db, &self.static_store, &key, &response).await;
                }
                routed(strategy, ResponseSource::Network, response)
            }
            Err(e) => {
                tracing::warn!(%key, "cache-first miss while offline: {e}");
                routed(strategy, ResponseSource::Synthesized, fallback::resource_unavailable())
            }
        }
    }

    pub(super) async fn network_first(&self, request: &InterceptedRequest) -> Routed {
        let strategy = Strategy::NetworkFirst;
        let key = request.key();

        let error = match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    store_response(&self.db, &self.dynamic_store, &key, &response).await;
                }
                return routed(strategy, ResponseSource::Network, response);
            }
            Err(e) => e,
        };

        tracing::warn!(%key, "network failed, trying cache: {error}");

        if let Some(entry) = self.lookup_any(&key).await {
            return routed(strategy, ResponseSource::Cache, entry.response);
        }

        let response = if self.classifier.is_api(&request.url) {
            fallback::api_unavailable()
        } else {
            fallback::offline_page(&self.app_name)
        };
        routed(strategy, ResponseSource::Synthesized, response)
    }

    pub(super) async fn stale_while_revalidate(&self, request: &InterceptedRequest) -> Result<Routed, Error> {
        let strategy = Strategy::StaleWhileRevalidate;
        let key = request.key();
        let cached = self.lookup_in(&self.dynamic_store, &key).await;

        let revalidate = {
            let db = self.db.clone();
            let network = Arc::clone(&self.network);
            let store = self.dynamic_store.clone();
            let request = request.clone();
            async move {
                let response = network.fetch(&request).await?;
                if response.is_ok() {
                    store_response(&db, &store, &request.key(), &response).await;
                }
                Ok::<_, Error>(response)
            }
        };

        match cached {
            Some(entry) => {
                let background_key = key.clone();
                let mut revalidations = self.revalidations.lock().await;
                // drop finished revalidations
                while revalidations.try_join_next().is_some() {}
                revalidations.spawn(async move {
                    if let Err(e) = revalidate.await {
                        tracing::debug!(key = %background_key, "background revalidation failed: {e}");
                    }
                });
                tracing::debug!(%key, "serving stale copy");
                Ok(routed(strategy, ResponseSource::Cache, entry.response))
            }
            None => {
                let response = revalidate.await.inspect_err(|e| {
                    tracing::warn!(%key, "no cached copy and network failed: {e}");
                })?;
                Ok(routed(strategy, ResponseSource::Network, response))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::router::{FetchOutcome, ResponseSource, Routed, Router, Strategy};
    use crate::testing::{get, ok, page, setup, url};
    use reqwest::Method;
    use std::sync::Arc;
    use stowaway_core::{CachedResponse, Error, RequestKey};

    use crate::request::InterceptedRequest;

    async fn responded(router: &Router, request: &InterceptedRequest) -> Routed {
        match router.route(request).await.unwrap() {
            FetchOutcome::Responded(routed) => routed,
            FetchOutcome::Passthrough => panic!("expected the request to be intercepted"),
        }
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let (db, network, config) = setup().await;
        let asset = url("/static/js/dashboard.js");
        db.put_entry(&config.static_store(), &RequestKey::get(asset.as_str()), &ok("cached"))
            .await
            .unwrap();
        network.respond(asset.as_str(), ok("fresh"));
        let router = Router::new(db, network.clone(), &config);

        let routed = responded(&router, &get("/static/js/dashboard.js")).await;
        assert_eq!(routed.strategy, Strategy::CacheFirst);
        assert_eq!(routed.source, ResponseSource::Cache);
        assert_eq!(routed.response.text(), "cached");
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_round_trip_fetches_once() {
        let (db, network, config) = setup().await;
        let asset = url("/static/css/style.css");
        network.respond(asset.as_str(), ok("body{}"));
        let router = Router::new(db.clone(), network.clone(), &config);

        let first = responded(&router, &get("/static/css/style.css")).await;
        assert_eq!(first.source, ResponseSource::Network);
        let second = responded(&router, &get("/static/css/style.css")).await;
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.text(), "body{}");

        assert_eq!(network.calls_to(asset.as_str()), 1);
        let stored = db.match_in_store(&config.static_store(), &RequestKey::get(asset.as_str())).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_cache_first_error_status_not_stored() {
        let (db, network, config) = setup().await;
        let asset = url("/static/js/missing.js");
        network.respond(asset.as_str(), CachedResponse::new(404, "not found"));
        let router = Router::new(db.clone(), network.clone(), &config);

        let routed = responded(&router, &get("/static/js/missing.js")).await;
        assert_eq!(routed.response.status, 404);
        assert_eq!(routed.source, ResponseSource::Network);
        assert!(db.match_any(&RequestKey::get(asset.as_str())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_is_plain_503() {
        let (db, network, config) = setup().await;
        let router = Router::new(db, network, &config);

        let routed = responded(&router, &get("/static/js/roi.js")).await;
        assert_eq!(routed.source, ResponseSource::Synthesized);
        assert_eq!(routed.response.status, 503);
        assert!(routed.response.content_type().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_network_first_stores_in_dynamic() {
        let (db, network, config) = setup().await;
        let api = url("/api/user/projects");
        network.respond(api.as_str(), ok("[]").with_header("Content-Type", "application/json"));
        let router = Router::new(db.clone(), network.clone(), &config);

        let routed = responded(&router, &get("/api/user/projects")).await;
        assert_eq!(routed.strategy, Strategy::NetworkFirst);
        assert_eq!(routed.source, ResponseSource::Network);

        let entry = db
            .match_in_store(&config.dynamic_store(), &RequestKey::get(api.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.response.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_network_first_passes_server_error_through() {
        let (db, network, config) = setup().await;
        let api = url("/api/flows");
        db.put_entry(&config.dynamic_store(), &RequestKey::get(api.as_str()), &ok("stale"))
            .await
            .unwrap();
        network.respond(api.as_str(), CachedResponse::new(500, "boom"));
        let router = Router::new(db.clone(), network, &config);

        let routed = responded(&router, &get("/api/flows")).await;
        assert_eq!(routed.response.status, 500);
        assert_eq!(routed.source, ResponseSource::Network);

        let entry = db.match_any(&RequestKey::get(api.as_str())).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "stale");
    }

    #[tokio::test]
    async fn test_network_first_offline_uses_cache() {
        let (db, network, config) = setup().await;
        let api = url("/api/user/analytics");
        db.put_entry(&config.dynamic_store(), &RequestKey::get(api.as_str()), &ok("{\"roi\":3}"))
            .await
            .unwrap();
        let router = Router::new(db, network, &config);

        let routed = responded(&router, &get("/api/user/analytics")).await;
        assert_eq!(routed.source, ResponseSource::Cache);
        assert_eq!(routed.response.text(), "{\"roi\":3}");
    }

    #[tokio::test]
    async fn test_network_first_offline_api_is_json_503() {
        let (db, network, config) = setup().await;
        let router = Router::new(db, network, &config);

        for path in ["/api/flows", "/api/user/recommendations?limit=5", "/api/language"] {
            let routed = responded(&router, &get(path)).await;
            assert_eq!(routed.source, ResponseSource::Synthesized);
            assert_eq!(routed.response.status, 503);
            let body: serde_json::Value = serde_json::from_slice(&routed.response.body).unwrap();
            assert_eq!(body["status"], "error");
        }
    }

    #[tokio::test]
    async fn test_network_first_offline_page_is_html_200() {
        let (db, network, config) = setup().await;
        let router = Router::new(db, network, &config);

        for path in ["/dashboard", "/recommended-flows", "/login"] {
            let routed = responded(&router, &page(path)).await;
            assert_eq!(routed.source, ResponseSource::Synthesized);
            assert_eq!(routed.response.status, 200);
            assert!(routed.response.text().contains("window.location.reload()"));
        }
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_returns_cached_then_refreshes() {
        let (db, network, config) = setup().await;
        let icon = url("/favicon.ico");
        let key = RequestKey::get(icon.as_str());
        db.put_entry(&config.dynamic_store(), &key, &ok("old")).await.unwrap();
        network.respond(icon.as_str(), ok("new"));
        let router = Router::new(db.clone(), network.clone(), &config);

        let routed = responded(&router, &get("/favicon.ico")).await;
        assert_eq!(routed.strategy, Strategy::StaleWhileRevalidate);
        assert_eq!(routed.source, ResponseSource::Cache);
        assert_eq!(routed.response.text(), "old");

        router.settle().await;
        assert_eq!(network.calls_to(icon.as_str()), 1);
        let entry = db.match_in_store(&config.dynamic_store(), &key).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "new");
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_background_failure_keeps_copy() {
        let (db, network, config) = setup().await;
        let icon = url("/favicon.ico");
        let key = RequestKey::get(icon.as_str());
        db.put_entry(&config.dynamic_store(), &key, &ok("old")).await.unwrap();
        let router = Router::new(db.clone(), network, &config);

        let routed = responded(&router, &get("/favicon.ico")).await;
        assert_eq!(routed.response.text(), "old");

        router.settle().await;
        let entry = db.match_in_store(&config.dynamic_store(), &key).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "old");
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_error_status_keeps_copy() {
        let (db, network, config) = setup().await;
        let icon = url("/favicon.ico");
        let key = RequestKey::get(icon.as_str());
        db.put_entry(&config.dynamic_store(), &key, &ok("old")).await.unwrap();
        network.respond(icon.as_str(), CachedResponse::new(500, "boom"));
        let router = Router::new(db.clone(), network.clone(), &config);

        let routed = responded(&router, &get("/favicon.ico")).await;
        assert_eq!(routed.source, ResponseSource::Cache);
        assert_eq!(routed.response.text(), "old");

        router.settle().await;
        assert_eq!(network.calls_to(icon.as_str()), 1);
        let entry = db.match_in_store(&config.dynamic_store(), &key).await.unwrap().unwrap();
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.response.text(), "old");
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_miss_awaits_network() {
        let (db, network, config) = setup().await;
        let icon = url("/favicon.ico");
        network.respond(icon.as_str(), ok("icon"));
        let router = Router::new(db.clone(), network, &config);

        let routed = responded(&router, &get("/favicon.ico")).await;
        assert_eq!(routed.source, ResponseSource::Network);
        assert_eq!(routed.response.text(), "icon");
        assert!(
            db.match_in_store(&config.dynamic_store(), &RequestKey::get(icon.as_str()))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_rejects_when_empty_and_offline() {
        let (db, network, config) = setup().await;
        let router = Router::new(db, network, &config);

        let result = router.route(&get("/favicon.ico")).await;
        assert!(matches!(result, Err(Error::FetchFailed(_))));
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_ignores_static_store() {
        let (db, network, config) = setup().await;
        let icon = url("/favicon.ico");
        db.put_entry(&config.static_store(), &RequestKey::get(icon.as_str()), &ok("static"))
            .await
            .unwrap();
        network.respond(icon.as_str(), ok("network"));
        let router = Router::new(db, network, &config);

        let routed = responded(&router, &get("/favicon.ico")).await;
        assert_eq!(routed.source, ResponseSource::Network);
        assert_eq!(routed.response.text(), "network");
    }

    #[tokio::test]
    async fn test_non_get_touches_neither_cache_nor_network() {
        let (db, network, config) = setup().await;
        let router = Router::new(db.clone(), network.clone(), &config);

        let request = InterceptedRequest::new(Method::POST, url("/api/projects")).with_body("{}");
        let outcome = router.route(&request).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(network.calls(), 0);
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_router_accepts_shared_network() {
        let (db, network, config) = setup().await;
        let shared: Arc<dyn crate::fetch::Network> = network;
        let router = Router::new(db, shared, &config);
        assert!(router.classifier().is_api(&url("/api/status")));
    }
}
