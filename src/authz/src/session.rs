//! Per-interaction authorization session
//!
//! A [`Session`] binds a [`PolicyResolver`] to one acting subject for the
//! lifetime of one interaction (typically a request). It caches what it
//! resolves and records whether an authorization check and a scope
//! resolution happened, so the embedding layer can fail closed with
//! [`Session::verify_authorized`] and [`Session::verify_policy_scoped`].
//!
//! Sessions are not shared: create one per interaction. The audit flags are
//! never reset.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warrant_authz::{Policy, PolicyClass, PolicyRegistry, PolicyResolver, Principal, ResourceRef, Session};
//!
//! #[derive(Debug)]
//! struct NotePolicy;
//!
//! impl Policy for NotePolicy {
//!     fn query(&self, query: &str) -> Option<bool> {
//!         match query {
//!             "show?" => Some(true),
//!             "update?" => Some(false),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let registry = Arc::new(PolicyRegistry::new());
//! registry.register(PolicyClass::new("NotePolicy", |_: &Principal, _: &ResourceRef| NotePolicy)).unwrap();
//!
//! let mut session = Session::for_subject(PolicyResolver::new(registry), Principal::new("user:alice"))
//!     .with_action_name("show");
//!
//! assert!(session.verify_authorized().is_err());
//! assert!(session.authorize(&ResourceRef::symbol("note"), None).unwrap());
//! assert!(session.authorize(&ResourceRef::symbol("note"), Some("update?")).is_err());
//! assert!(session.verify_authorized().is_ok());
//! ```

use crate::error::{AuthzError, Result};
use crate::params::{ParamsPermitter, SliceParams};
use crate::policy::{Permitted, Policy, Scoped};
use crate::resolver::PolicyResolver;
use crate::resource::{ResourceKey, ResourceRef};
use crate::types::{Action, Principal};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type SubjectFn = dyn Fn() -> Principal + Send + Sync;
type ActionFn = dyn Fn() -> Option<Action> + Send + Sync;

/// Capabilities an embedding layer provides to a session
pub trait SessionHost: Send + Sync + 'static {
    /// Currently authenticated actor
    fn current_user(&self) -> Principal;

    /// Ambient action name, used to derive the default query
    fn action(&self) -> Option<Action> {
        None
    }

    /// Raw parameter bag of the interaction
    fn params(&self) -> Value {
        Value::Null
    }
}

/// Per-interaction authorization context
pub struct Session {
    resolver: PolicyResolver,
    subject: Box<SubjectFn>,
    action: Option<Box<ActionFn>>,
    params: Value,
    permitter: Box<dyn ParamsPermitter>,

    policy: Option<Arc<dyn Policy>>,
    policies: HashMap<ResourceKey, Arc<dyn Policy>>,
    policy_scope: Option<Scoped>,
    scopes: HashMap<ResourceKey, Scoped>,
    policy_attributes: Option<Arc<Permitted>>,
    attributes: HashMap<ResourceKey, Arc<Permitted>>,

    authorized: bool,
    scoped: bool,
}

impl Session {
    /// Create a session whose subject is produced by `subject`
    pub fn new<F>(resolver: PolicyResolver, subject: F) -> Self
    where
        F: Fn() -> Principal + Send + Sync + 'static,
    {
        Self {
            resolver,
            subject: Box::new(subject),
            action: None,
            params: Value::Null,
            permitter: Box::new(SliceParams),
            policy: None,
            policies: HashMap::new(),
            policy_scope: None,
            scopes: HashMap::new(),
            policy_attributes: None,
            attributes: HashMap::new(),
            authorized: false,
            scoped: false,
        }
    }

    /// Create a session for a fixed subject
    pub fn for_subject(resolver: PolicyResolver, subject: Principal) -> Self {
        Self::new(resolver, move || subject.clone())
    }

    /// Create a session wired to an embedding layer
    pub fn from_host<H: SessionHost>(resolver: PolicyResolver, host: Arc<H>) -> Self {
        let params = host.params();
        let action_host = Arc::clone(&host);
        Self::new(resolver, move || host.current_user())
            .with_action(move || action_host.action())
            .with_params(params)
    }

    /// Set the ambient action accessor
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn() -> Option<Action> + Send + Sync + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Use a fixed ambient action
    pub fn with_action_name(self, name: impl Into<String>) -> Self {
        let action = Action::new(name);
        self.with_action(move || Some(action.clone()))
    }

    /// Set the raw parameter bag
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Replace the parameter permitting strategy (default: [`SliceParams`])
    pub fn with_permitter<P: ParamsPermitter + 'static>(mut self, permitter: P) -> Self {
        self.permitter = Box::new(permitter);
        self
    }

    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    /// Acting subject, as supplied by the embedding layer
    pub fn subject(&self) -> Principal {
        (self.subject)()
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    /// True once `authorize` has been attempted
    pub fn authorization_performed(&self) -> bool {
        self.authorized
    }

    /// True once a scope result has been produced
    pub fn policy_scoping_performed(&self) -> bool {
        self.scoped
    }

    /// Policy for `resource`
    ///
    /// An injected policy wins over resolution. Otherwise the policy is
    /// resolved strictly, instantiated for the subject once per call target
    /// and cached.
    ///
    /// # Errors
    ///
    /// `PolicyNotFound` when no policy resolves.
    pub fn policy(&mut self, resource: &ResourceRef) -> Result<Arc<dyn Policy>> {
        if let Some(policy) = &self.policy {
            debug!("Using injected policy for {}", resource);
            return Ok(Arc::clone(policy));
        }

        let key = resource.key();
        if let Some(policy) = self.policies.get(&key) {
            debug!("Policy cache hit for {}", resource);
            return Ok(Arc::clone(policy));
        }

        let policy = self.resolver.require_policy(&self.subject(), resource)?;
        self.policies.insert(key, Arc::clone(&policy));
        Ok(policy)
    }

    /// Inject a policy used for every subsequent `policy` / `authorize` call
    pub fn set_policy(&mut self, policy: Arc<dyn Policy>) {
        self.policy = Some(policy);
    }

    /// Query derived from the ambient action (`update` -> `update?`)
    ///
    /// # Errors
    ///
    /// `InvalidInput` when no ambient action is available.
    pub fn default_query(&self) -> Result<String> {
        let action = self
            .action
            .as_ref()
            .and_then(|action| action())
            .ok_or_else(|| {
                AuthzError::InvalidInput(
                    "no query given and no ambient action is available".to_string(),
                )
            })?;
        Ok(action.query(&self.resolver.config().query_marker))
    }

    /// Check `query` (or the default query) against the policy for `resource`
    ///
    /// The authorization flag is set before anything else, so a denied or
    /// failed check still counts as performed.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` when the policy answers `false`
    /// - `UndefinedQuery` when the policy does not define the query
    /// - `PolicyNotFound` when no policy resolves
    pub fn authorize(&mut self, resource: &ResourceRef, query: Option<&str>) -> Result<bool> {
        self.authorized = true;

        let query = match query {
            Some(query) => query.to_string(),
            None => self.default_query()?,
        };

        let policy = self.policy(resource)?;
        match policy.query(&query) {
            Some(true) => {
                debug!("Authorized {} on {}", query, resource);
                Ok(true)
            }
            Some(false) => {
                info!("Authorization denied: {} on {}", query, resource);
                Err(AuthzError::NotAuthorized {
                    query,
                    resource: resource.clone(),
                    policy,
                })
            }
            None => Err(AuthzError::UndefinedQuery {
                query,
                policy: format!("{:?}", policy),
            }),
        }
    }

    /// Scope of `collection` visible to the subject
    ///
    /// An injected scope result wins over resolution. Otherwise the Scope is
    /// resolved strictly, `resolve()` runs once per call target and the
    /// result is cached; repeated calls return the same allocation.
    ///
    /// # Errors
    ///
    /// `ScopeNotFound`, or errors raised by `resolve()`.
    pub fn policy_scope(&mut self, collection: &ResourceRef) -> Result<Scoped> {
        if let Some(scoped) = self.policy_scope.clone() {
            debug!("Using injected scope for {}", collection);
            self.scoped = true;
            return Ok(scoped);
        }

        let key = collection.key();
        if let Some(scoped) = self.scopes.get(&key).cloned() {
            debug!("Scope cache hit for {}", collection);
            self.scoped = true;
            return Ok(scoped);
        }

        let scoped = self
            .resolver
            .require_policy_scope(&self.subject(), collection)?;
        self.scopes.insert(key, scoped.clone());
        self.scoped = true;
        Ok(scoped)
    }

    /// Inject a pre-computed scope result
    pub fn set_policy_scope(&mut self, scoped: Scoped) {
        self.policy_scope = Some(scoped);
    }

    /// Attributes of `resource` the subject may act on
    ///
    /// Accepts a symbol, a type or an instance; all resolve through the same
    /// canonical name. Cached per call target.
    ///
    /// # Errors
    ///
    /// `AttributesNotFound`, or errors raised by `permitted_attributes()`.
    pub fn policy_attributes(&mut self, resource: &ResourceRef) -> Result<Arc<Permitted>> {
        if let Some(permitted) = &self.policy_attributes {
            debug!("Using injected attributes for {}", resource);
            return Ok(Arc::clone(permitted));
        }

        let key = resource.key();
        if let Some(permitted) = self.attributes.get(&key) {
            debug!("Attributes cache hit for {}", resource);
            return Ok(Arc::clone(permitted));
        }

        let permitted = Arc::new(
            self.resolver
                .require_policy_attributes(&self.subject(), resource)?,
        );
        self.attributes.insert(key, Arc::clone(&permitted));
        Ok(permitted)
    }

    /// Inject a pre-computed attribute set
    pub fn set_policy_attributes(&mut self, permitted: Permitted) {
        self.policy_attributes = Some(Arc::new(permitted));
    }

    /// Entry of the parameter bag for `resource`, reduced to permitted attributes
    ///
    /// A symbol keys the bag directly; any other reference uses its
    /// `params_key`.
    ///
    /// # Errors
    ///
    /// Attribute resolution errors, `MissingParams`, or `InvalidInput` when
    /// the entry is not an object.
    pub fn permitted_params(&mut self, resource: &ResourceRef) -> Result<Map<String, Value>> {
        let key = match resource {
            ResourceRef::Symbol(symbol) => symbol.clone(),
            _ => self.resolver.params_key(resource),
        };
        let permitted = self.policy_attributes(resource)?;
        self.permitter.permit(&self.params, &key, &permitted)
    }

    /// Fail unless `authorize` was attempted in this session
    ///
    /// # Errors
    ///
    /// `AuthorizationNotPerformed`
    pub fn verify_authorized(&self) -> Result<()> {
        if self.authorized {
            Ok(())
        } else {
            warn!("Interaction finished without an authorization check");
            Err(AuthzError::AuthorizationNotPerformed("authorization"))
        }
    }

    /// Fail unless a scope result was produced in this session
    ///
    /// # Errors
    ///
    /// `AuthorizationNotPerformed`
    pub fn verify_policy_scoped(&self) -> Result<()> {
        if self.scoped {
            Ok(())
        } else {
            warn!("Interaction finished without policy scoping");
            Err(AuthzError::AuthorizationNotPerformed("policy scoping"))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authorized", &self.authorized)
            .field("scoped", &self.scoped)
            .field("cached_policies", &self.policies.len())
            .field("cached_scopes", &self.scopes.len())
            .field("cached_attributes", &self.attributes.len())
            .finish_non_exhaustive()
    }
}
