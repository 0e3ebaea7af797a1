use std::env;

use crate::{ConfigError, split_list};

pub const DEFAULT_USER_ID_HEADER: &str = "X-User-Id";
pub const DEFAULT_USER_ROLES_HEADER: &str = "X-User-Roles";

/// One `prefix=upstream` entry of `GATEWAY_ROUTES`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteConfig {
    pub prefix: String,
    pub upstream: String,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub routes: Vec<RouteConfig>,
    pub user_id_header: String,
    pub user_roles_header: String,
    /// Remove client-supplied trusted headers from requests that carry no principal.
    pub strip_untrusted_headers: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_routes = lookup("GATEWAY_ROUTES")
            .unwrap_or_else(|| "/api/v1=http://localhost:8081".to_string());

        let routes = split_list(&raw_routes)
            .into_iter()
            .map(|entry| parse_route(&entry))
            .collect::<Result<Vec<_>, _>>()?;

        let strip_untrusted_headers = match lookup("GATEWAY_STRIP_UNTRUSTED_HEADERS") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                name: "GATEWAY_STRIP_UNTRUSTED_HEADERS",
                reason: format!("'{raw}' is not a boolean"),
            })?,
            None => true,
        };

        Ok(Self {
            routes,
            user_id_header: lookup("GATEWAY_USER_ID_HEADER")
                .unwrap_or_else(|| DEFAULT_USER_ID_HEADER.to_string()),
            user_roles_header: lookup("GATEWAY_USER_ROLES_HEADER")
                .unwrap_or_else(|| DEFAULT_USER_ROLES_HEADER.to_string()),
            strip_untrusted_headers,
        })
    }
}

fn parse_route(entry: &str) -> Result<RouteConfig, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name: "GATEWAY_ROUTES",
        reason: format!("'{entry}': {reason}"),
    };

    let (prefix, upstream) = entry
        .split_once('=')
        .ok_or_else(|| invalid("expected prefix=upstream"))?;
    let prefix = prefix.trim();
    let upstream = upstream.trim().trim_end_matches('/');

    if !prefix.starts_with('/') {
        return Err(invalid("prefix must start with '/'"));
    }
    if !(upstream.starts_with("http://") || upstream.starts_with("https://")) {
        return Err(invalid("upstream must be an http(s) URL"));
    }

    Ok(RouteConfig {
        prefix: prefix.to_string(),
        upstream: upstream.to_string(),
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
