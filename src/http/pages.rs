//! Fixed pages served next to the proxy route.

use axum::{extract::State, response::Html, Json};
use serde_json::{json, Value};

use super::server::AppState;

const LANDING_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Site Proxy</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; align-items: center; justify-content: center; background: #f4f4f5; }
form { display: flex; gap: .5rem; width: min(40rem, 90vw); }
input { flex: 1; padding: .6rem .8rem; font-size: 1rem; border: 1px solid #a1a1aa; border-radius: .4rem; }
button { padding: .6rem 1.2rem; font-size: 1rem; border: 0; border-radius: .4rem; background: #18181b; color: #fff; cursor: pointer; }
</style>
</head>
<body>
<form id="go">
<input id="target" type="text" placeholder="example.com or https://example.com/page" autofocus required>
<button type="submit">Go</button>
</form>
<script>
const PREFIX = __PREFIX__;
document.getElementById("go").addEventListener("submit", (event) => {
  event.preventDefault();
  const input = document.getElementById("target").value.trim();
  if (input) {
    window.location.href = PREFIX + encodeURIComponent(input);
  }
});
</script>
</body>
</html>
"#;

/// Render the landing page for a routing prefix.
pub fn render_landing(prefix: &str) -> String {
    // JSON string literal is a valid JS string literal.
    let literal = serde_json::to_string(prefix).unwrap_or_else(|_| "\"/proxy/\"".to_string());
    LANDING_TEMPLATE.replace("__PREFIX__", &literal)
}

/// `GET /`
pub async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(state.landing.to_string())
}

/// `GET /healthz`
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
