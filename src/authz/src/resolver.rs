//! Stateless policy resolution entry points
//!
//! [`PolicyResolver`] pairs a [`PolicyRegistry`] with a [`ResolverConfig`]
//! and offers one-shot lookups that do not record anything: no caching, no
//! audit flags. Use a [`Session`](crate::session::Session) for per-request
//! enforcement.

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::finder::PolicyFinder;
use crate::policy::{Permitted, Policy, PolicyRegistry, Scoped};
use crate::resource::ResourceRef;
use crate::types::Principal;
use std::sync::Arc;
use tracing::debug;

/// Resolves policies, scopes and permitted attributes for resources
///
/// Cloning is cheap and clones share the registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warrant_authz::{PolicyRegistry, PolicyResolver, Principal, ResourceRef};
///
/// let resolver = PolicyResolver::new(Arc::new(PolicyRegistry::new()));
/// let user = Principal::new("user:alice");
///
/// // Nothing registered: the lenient lookup yields None, the strict one fails
/// assert!(resolver.policy(&user, &ResourceRef::symbol("article")).is_none());
/// assert!(resolver.require_policy(&user, &ResourceRef::symbol("article")).is_err());
/// ```
#[derive(Clone)]
pub struct PolicyResolver {
    registry: Arc<PolicyRegistry>,
    config: ResolverConfig,
}

impl PolicyResolver {
    /// Create a resolver with the default naming conventions
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self {
            registry,
            config: ResolverConfig::default(),
        }
    }

    /// Create a resolver with custom naming conventions
    ///
    /// # Errors
    ///
    /// `Configuration` when `config` fails validation.
    pub fn with_config(registry: Arc<PolicyRegistry>, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Finder for a single reference
    pub fn finder<'a>(&'a self, resource: &'a ResourceRef) -> PolicyFinder<'a> {
        PolicyFinder::new(&self.registry, &self.config, resource)
    }

    /// Policy instance for `subject` and `resource`, if a policy resolves
    pub fn policy(&self, subject: &Principal, resource: &ResourceRef) -> Option<Arc<dyn Policy>> {
        self.finder(resource)
            .policy()
            .map(|class| class.instantiate(subject, resource))
    }

    /// Policy instance for `subject` and `resource`
    ///
    /// # Errors
    ///
    /// `PolicyNotFound` when no policy resolves.
    pub fn require_policy(
        &self,
        subject: &Principal,
        resource: &ResourceRef,
    ) -> Result<Arc<dyn Policy>> {
        let class = self.finder(resource).require_policy()?;
        debug!("Instantiating {} for {}", class.display_name(), resource);
        Ok(class.instantiate(subject, resource))
    }

    /// Resolved scope of `collection`, if the policy defines a Scope
    ///
    /// # Errors
    ///
    /// Only errors raised by the scope's own `resolve()`.
    pub fn policy_scope(
        &self,
        subject: &Principal,
        collection: &ResourceRef,
    ) -> Result<Option<Scoped>> {
        match self.finder(collection).scope() {
            Some(scope) => scope.instantiate(subject, collection).resolve().map(Some),
            None => Ok(None),
        }
    }

    /// Resolved scope of `collection`
    ///
    /// # Errors
    ///
    /// `ScopeNotFound` when the policy or its Scope is missing, or errors
    /// raised by `resolve()`.
    pub fn require_policy_scope(
        &self,
        subject: &Principal,
        collection: &ResourceRef,
    ) -> Result<Scoped> {
        let scope = self.finder(collection).require_scope()?;
        debug!("Resolving {:?} for {}", scope, collection);
        scope.instantiate(subject, collection).resolve()
    }

    /// Permitted attributes for `resource`, if the policy defines Attributes
    pub fn policy_attributes(
        &self,
        subject: &Principal,
        resource: &ResourceRef,
    ) -> Result<Option<Permitted>> {
        match self.finder(resource).attributes() {
            Some(attributes) => attributes
                .instantiate(subject, resource)
                .permitted_attributes()
                .map(Some),
            None => Ok(None),
        }
    }

    /// Permitted attributes for `resource`
    ///
    /// # Errors
    ///
    /// `AttributesNotFound` when the policy or its Attributes are missing,
    /// or errors raised by `permitted_attributes()`.
    pub fn require_policy_attributes(
        &self,
        subject: &Principal,
        resource: &ResourceRef,
    ) -> Result<Permitted> {
        let attributes = self.finder(resource).require_attributes()?;
        debug!("Collecting {:?} for {}", attributes, resource);
        attributes.instantiate(subject, resource).permitted_attributes()
    }

    /// Parameter-bag key for `resource`
    pub fn params_key(&self, resource: &ResourceRef) -> String {
        self.finder(resource).params_key()
    }
}
