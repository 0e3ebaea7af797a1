//! Reverse proxy to the upstream chosen by the route table.
//!
//! Method, path, query, end-to-end headers and body are forwarded as-is; the
//! upstream's status, headers and body are relayed back. No retries.

use anyhow::anyhow;
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, header},
    response::Response,
};
use estatehub_core::AppError;
use http_body_util::LengthLimitError;
use reqwest::Url;
use estatehub_observability::track_upstream_request;
use tracing::{instrument, warn};

use super::GatewayState;

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [header::HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[instrument(skip(state, req), fields(method = %req.method(), path = %req.uri().path()))]
pub async fn forward(State(state): State<GatewayState>, req: Request) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();
    let route = state
        .routes
        .resolve(&path)
        .ok_or_else(|| AppError::not_found(anyhow!("No upstream route for {}", path)))?;

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = Url::parse(&format!("{}{}", route.upstream, path_and_query))
        .map_err(|e| AppError::bad_request(anyhow!("Cannot build upstream URL: {}", e)))?;

    // The upstream must receive the path the authentication filter classified.
    if !url.path().ends_with(path.as_str()) {
        warn!(path = %path, upstream_path = %url.path(), "Request path is not canonical");
        return Err(AppError::bad_request(anyhow!(
            "Request path {} is not in canonical form",
            path
        )));
    }

    let (parts, body) = req.into_parts();
    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(body_read_error)?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let upstream = match state
        .client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(upstream = %route.upstream, error = %e, "Upstream request failed");
            track_upstream_request(&route.prefix, 502);
            return Err(AppError::bad_gateway(anyhow!("Upstream {} is unreachable", route.upstream)));
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    response_headers.remove(header::CONTENT_LENGTH);

    let bytes = upstream.bytes().await.map_err(|e| {
        track_upstream_request(&route.prefix, 502);
        AppError::bad_gateway(anyhow!("Failed to read upstream response: {}", e))
    })?;
    track_upstream_request(&route.prefix, status.as_u16());

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn body_read_error(err: axum::Error) -> AppError {
    let inner = err.into_inner();
    if inner.downcast_ref::<LengthLimitError>().is_some() {
        return AppError::payload_too_large(anyhow!(
            "Request body exceeds {} bytes",
            MAX_BODY_BYTES
        ));
    }
    AppError::bad_request(anyhow!("Failed to read request body: {}", inner))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named by Connection are hop-by-hop as well.
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
