//! WebSocket endpoint resolution from an HTTP API base.

use tracing::warn;
use url::Url;

/// Path the STOMP endpoint is mounted on when none is given.
pub const DEFAULT_WS_PATH: &str = "/ws";

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn resolve_base_url(api_base: Option<&str>) -> Option<Url> {
    let api_base = api_base.filter(|s| !s.is_empty())?;
    let parsed = if api_base.starts_with('/') {
        Url::parse(&format!("http://localhost{}", api_base))
    } else {
        Url::parse(api_base)
    };
    match parsed {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(api_base, error = %e, "invalid api base, falling back to localhost");
            None
        }
    }
}

/// Build the `ws://` / `wss://` URL of the STOMP endpoint.
///
/// `api_base` is the HTTP base of the backend (absolute, or a path such as
/// `/api` served from the same origin). An `https` base maps to `wss`; any
/// other scheme maps to `ws`. A non-root base path prefixes `path`.
/// Without a usable base the result is `ws://localhost<path>`.
pub fn resolve_ws_url(api_base: Option<&str>, path: &str) -> String {
    let Some(base) = resolve_base_url(api_base) else {
        return format!("ws://localhost{}", join_base_path("", path));
    };

    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    let host = match (base.host_str(), base.port()) {
        (Some(h), Some(p)) => format!("{}:{}", h, p),
        (Some(h), None) => h.to_string(),
        (None, _) => "localhost".to_string(),
    };
    let base_path = match base.path() {
        "/" => "",
        p => p,
    };
    format!("{}://{}{}", scheme, host, join_base_path(base_path, path))
}
