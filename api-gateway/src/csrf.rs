//! Anti-CSRF token acquisition and per-request header assembly

use tracing::debug;

use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

pub const SETTINGS_PATH: &str = "/api/settings";
/// Header name Portainer uses on `/api/settings`
pub const SETTINGS_CSRF_HEADER: &str = "X-Csrf-Token";
/// Header name Portainer uses on `/api/auth` and expects on authenticated calls
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Attach `Referer`/`Origin`; some deployments refuse requests without them
pub fn with_origin(request: HttpRequest, base_url: &str) -> HttpRequest {
    request
        .header("Referer", base_url)
        .header("Origin", base_url)
}

/// Build the full header set for an authenticated call
pub fn authorize(
    request: HttpRequest,
    base_url: &str,
    token: &str,
    csrf_token: Option<&str>,
) -> HttpRequest {
    let request = with_origin(request, base_url).header("Authorization", format!("Bearer {token}"));
    match csrf_token {
        Some(csrf) => request.header(CSRF_HEADER, csrf),
        None => request,
    }
}

/// Non-empty CSRF value from a response header, if present
pub fn csrf_from_response(response: &HttpResponse, header: &str) -> Option<String> {
    response
        .header(header)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Best-effort `GET /api/settings`; any failure means "no token"
pub async fn fetch_settings_csrf(transport: &dyn HttpTransport, base_url: &str) -> Option<String> {
    let request = with_origin(HttpRequest::get(SETTINGS_PATH), base_url);
    match transport.send(request).await {
        Ok(resp) if resp.is_success() => {
            let token = csrf_from_response(&resp, SETTINGS_CSRF_HEADER);
            debug!("Settings CSRF token present: {}", token.is_some());
            token
        }
        Ok(resp) => {
            debug!("Settings fetch returned {}, continuing without CSRF token", resp.status);
            None
        }
        Err(e) => {
            debug!("Settings fetch failed, continuing without CSRF token: {e}");
            None
        }
    }
}
