use estatehub_config::RouteConfig;

use crate::middleware::authenticate::matches_prefix;

/// Upstream routes, searched longest prefix first.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<RouteConfig>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    pub fn resolve(&self, path: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|r| matches_prefix(path, &r.prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
