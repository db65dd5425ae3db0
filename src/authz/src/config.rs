//! Resolver configuration

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};

/// Naming conventions used when resolving policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Appended to the canonical resource name to form the policy name
    pub policy_suffix: String,

    /// Appended to the ambient action name to form the default query
    pub query_marker: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            policy_suffix: "Policy".to_string(),
            query_marker: "?".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Parse and validate a JSON configuration document
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AuthzError::Configuration(format!("invalid resolver config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every convention is usable
    pub fn validate(&self) -> Result<()> {
        if self.policy_suffix.is_empty() {
            return Err(AuthzError::Configuration(
                "policy_suffix cannot be empty".to_string(),
            ));
        }
        if self.query_marker.is_empty() {
            return Err(AuthzError::Configuration(
                "query_marker cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
