use std::env;

use crate::split_list;

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let allowed_origins = split_list(
            &lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000,http://localhost:5173".to_string()),
        );

        Self { allowed_origins }
    }
}
