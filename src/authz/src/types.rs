//! Subject and action types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Acting subject (user, service account, agent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (e.g., "user:alice@example.com")
    pub id: String,

    /// Principal type (user, service, agent, etc.)
    #[serde(rename = "type")]
    pub principal_type: String,

    /// Additional attributes (e.g., department)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// Create a new principal from an ID string
    ///
    /// The type is taken from the `kind:` prefix of the id and falls back to
    /// `user` when the id has no prefix.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let principal_type = match id.split_once(':') {
            Some((kind, _)) if !kind.is_empty() => kind.to_string(),
            _ => "user".to_string(),
        };

        Self {
            id,
            principal_type,
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the principal
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Ambient action of the current interaction (e.g. `update`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action name (show, update, destroy, etc.)
    pub name: String,
}

impl Action {
    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Default policy query for this action: the name followed by `marker`
    pub fn query(&self, marker: &str) -> String {
        format!("{}{}", self.name, marker)
    }
}
