//! Responses synthesized when neither network nor cache can answer.

use stowaway_core::CachedResponse;

/// Plain-text 503 returned by cache-first on a miss with no network.
pub fn resource_unavailable() -> CachedResponse {
    CachedResponse::new(503, "Resource not available offline").with_header("Content-Type", "text/plain; charset=utf-8")
}

/// JSON 503 returned for API requests with no network and no cached copy.
pub fn api_unavailable() -> CachedResponse {
    let body = serde_json::json!({
        "status": "error",
        "message": "service unavailable offline",
    });
    CachedResponse::new(503, body.to_string()).with_header("Content-Type", "application/json")
}

/// Offline page returned for navigations with no network and no cached copy.
pub fn offline_page(app_name: &str) -> CachedResponse {
    let title = escape_html(app_name);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Offline - {title}</title>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
        .offline-message {{ max-width: 500px; margin: 0 auto; }}
        .btn {{ padding: 10px 20px; background: #0d6efd; color: white; border: none; border-radius: 5px; cursor: pointer; }}
    </style>
</head>
<body>
    <div class="offline-message">
        <h1>You are offline</h1>
        <p>Some features of {title} may be limited until the connection is back.</p>
        <button class="btn" onclick="window.location.reload()">Try again</button>
    </div>
</body>
</html>
"#
    );
    CachedResponse::new(200, html).with_header("Content-Type", "text/html; charset=utf-8")
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
