//! Named CORS policies.

use std::collections::HashMap;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Name under which the default policy is registered and later installed.
pub const CORS_POLICY_NAME: &str = "CorsPolicy";

pub const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:4321",
    "http://localhost:3000",
    "https://withrisk.netlify.app",
];

/// Fixed origins; any method and any header.
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
}

impl CorsPolicy {
    pub fn allow_origins(origins: &[&'static str]) -> Self {
        Self {
            origins: origins
                .iter()
                .map(|origin| HeaderValue::from_static(*origin))
                .collect(),
        }
    }

    pub fn origins(&self) -> &[HeaderValue] {
        &self.origins
    }

    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.iter().cloned()))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::allow_origins(&ALLOWED_ORIGINS)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CorsPolicies {
    policies: HashMap<&'static str, CorsPolicy>,
}

impl CorsPolicies {
    pub fn with_policy(mut self, name: &'static str, policy: CorsPolicy) -> Self {
        self.policies.insert(name, policy);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CorsPolicy> {
        self.policies.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_lists_the_three_origins() {
        let policy = CorsPolicy::default();
        let origins: Vec<_> = policy
            .origins()
            .iter()
            .map(|value| value.to_str().expect("ascii"))
            .collect();
        assert_eq!(origins, ALLOWED_ORIGINS);
    }

    #[test]
    fn policies_are_looked_up_by_name() {
        let policies = CorsPolicies::default().with_policy(CORS_POLICY_NAME, CorsPolicy::default());
        assert!(policies.get(CORS_POLICY_NAME).is_some());
        assert!(policies.get("Other").is_none());
    }
}
