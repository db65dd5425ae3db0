//! Error types for policy resolution and authorization sessions

use crate::policy::Policy;
use crate::resource::ResourceRef;
use std::sync::Arc;
use thiserror::Error;

/// Authorization errors
///
/// The three `*NotFound` variants describe missing policy definitions and are
/// only produced by the strict accessors. `NotAuthorized` is a legitimate
/// denial. `AuthorizationNotPerformed` signals a forgotten check in the
/// embedding layer.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// No policy class could be resolved for the resource
    #[error("unable to find policy {policy} for {resource}")]
    PolicyNotFound {
        /// Attempted policy name
        policy: String,
        /// Reference the lookup started from
        resource: ResourceRef,
    },

    /// The policy (or its nested scope) could not be resolved
    #[error("unable to find scope {policy}::Scope for {resource}")]
    ScopeNotFound {
        /// Attempted policy name
        policy: String,
        /// Reference the lookup started from
        resource: ResourceRef,
    },

    /// The policy (or its nested attributes) could not be resolved
    #[error("unable to find attributes {policy}::Attributes for {resource}")]
    AttributesNotFound {
        /// Attempted policy name
        policy: String,
        /// Reference the lookup started from
        resource: ResourceRef,
    },

    /// The policy answered a query with `false`
    #[error("not allowed to {query} this {resource}")]
    NotAuthorized {
        /// Query that was checked (e.g. `update?`)
        query: String,
        /// Resource the query was checked against
        resource: ResourceRef,
        /// Policy instance that denied the query
        policy: Arc<dyn Policy>,
    },

    /// A verification guard ran before any check was attempted
    #[error("{0} was not performed")]
    AuthorizationNotPerformed(&'static str),

    /// The policy does not define the requested query
    #[error("policy {policy} does not define query {query}")]
    UndefinedQuery {
        /// Query that was requested
        query: String,
        /// Debug rendering of the policy instance
        policy: String,
    },

    /// The parameter bag has no usable entry for the resource key
    #[error("param is missing or the value is empty: {0}")]
    MissingParams(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure raised by a scope or attributes collaborator
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// True for the missing-definition family (`PolicyNotFound`,
    /// `ScopeNotFound`, `AttributesNotFound`).
    pub fn is_not_defined(&self) -> bool {
        matches!(
            self,
            AuthzError::PolicyNotFound { .. }
                | AuthzError::ScopeNotFound { .. }
                | AuthzError::AttributesNotFound { .. }
        )
    }

    /// True when the error is an access denial
    pub fn is_denial(&self) -> bool {
        matches!(self, AuthzError::NotAuthorized { .. })
    }
}

impl From<anyhow::Error> for AuthzError {
    fn from(err: anyhow::Error) -> Self {
        AuthzError::Internal(format!("{:#}", err))
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
