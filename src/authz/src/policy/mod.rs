//! Policy capability contracts and type-erased policy classes
//!
//! A policy is constructed from `(subject, resource)` and answers named
//! boolean queries such as `update?`. A policy class may carry two nested
//! constructors:
//!
//! - **Scope**: built from `(subject, collection)`, `resolve()` returns the
//!   part of the collection the subject may see
//! - **Attributes**: built from `(subject, resource)`,
//!   `permitted_attributes()` returns the attribute names the subject may set
//!
//! Classes are plain values. They are registered by name in a
//! [`PolicyRegistry`] or attached directly to a resource type as an
//! explicit override, in which case they may be anonymous.
//!
//! # Example
//!
//! ```rust
//! use warrant_authz::{permitted, Policy, PolicyClass, PolicyRegistry, Principal, ResourceRef};
//!
//! #[derive(Debug)]
//! struct NotePolicy {
//!     user: Principal,
//! }
//!
//! impl Policy for NotePolicy {
//!     fn query(&self, query: &str) -> Option<bool> {
//!         match query {
//!             "show?" => Some(true),
//!             "destroy?" => Some(self.user.principal_type == "admin"),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let class = PolicyClass::new("NotePolicy", |user: &Principal, _: &ResourceRef| NotePolicy {
//!     user: user.clone(),
//! });
//!
//! let registry = PolicyRegistry::new();
//! registry.register(class).unwrap();
//! assert!(registry.contains("NotePolicy"));
//! ```

mod registry;

pub use registry::PolicyRegistry;

use crate::error::Result;
use crate::resource::ResourceRef;
use crate::types::Principal;
use indexmap::IndexSet;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Attribute names a subject may act on, in declaration order
pub type Permitted = IndexSet<String>;

/// Build a [`Permitted`] set from attribute names
pub fn permitted<I, S>(names: I) -> Permitted
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

/// Answers yes/no questions about one resource for one subject
pub trait Policy: Send + Sync + fmt::Debug {
    /// Evaluate a named query such as `update?`
    ///
    /// Returns `None` when the policy does not define the query.
    fn query(&self, query: &str) -> Option<bool>;
}

/// Narrows a collection to what the subject may see
pub trait PolicyScope: Send + Sync {
    fn resolve(&self) -> Result<Scoped>;
}

/// Lists the attributes the subject may act on
pub trait PolicyAttributes: Send + Sync {
    fn permitted_attributes(&self) -> Result<Permitted>;
}

/// Opaque result of a scope resolution
///
/// Whatever the collaborator returns is passed through untouched; callers
/// downcast to the collection type they expect. Clones share the same
/// allocation, so cached results can be compared by identity.
#[derive(Clone)]
pub struct Scoped(Arc<dyn Any + Send + Sync>);

impl Scoped {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// True when both values are the same allocation
    pub fn ptr_eq(&self, other: &Scoped) -> bool {
        thin_addr(Arc::as_ptr(&self.0)) == thin_addr(Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Scoped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scoped(..)")
    }
}

fn thin_addr<T: ?Sized>(ptr: *const T) -> usize {
    ptr as *const () as usize
}

type PolicyFactory = dyn Fn(&Principal, &ResourceRef) -> Arc<dyn Policy> + Send + Sync;
type ScopeFactory = dyn Fn(&Principal, &ResourceRef) -> Box<dyn PolicyScope> + Send + Sync;
type AttributesFactory =
    dyn Fn(&Principal, &ResourceRef) -> Box<dyn PolicyAttributes> + Send + Sync;

const ANONYMOUS: &str = "<anonymous policy>";

/// Constructor for a policy plus its optional nested Scope and Attributes
///
/// Cloning is cheap; clones share identity (see [`PolicyClass::ptr_eq`]).
#[derive(Clone)]
pub struct PolicyClass {
    name: Option<Arc<str>>,
    build: Arc<PolicyFactory>,
    scope: Option<Arc<ScopeFactory>>,
    attributes: Option<Arc<AttributesFactory>>,
}

impl PolicyClass {
    /// Create a named policy class
    pub fn new<F, P>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Principal, &ResourceRef) -> P + Send + Sync + 'static,
        P: Policy + 'static,
    {
        Self::from_parts(Some(Arc::from(name.into())), build)
    }

    /// Create a policy class without a name
    ///
    /// Anonymous classes cannot be registered; they are reachable only
    /// through an explicit override on a resource.
    pub fn anonymous<F, P>(build: F) -> Self
    where
        F: Fn(&Principal, &ResourceRef) -> P + Send + Sync + 'static,
        P: Policy + 'static,
    {
        Self::from_parts(None, build)
    }

    fn from_parts<F, P>(name: Option<Arc<str>>, build: F) -> Self
    where
        F: Fn(&Principal, &ResourceRef) -> P + Send + Sync + 'static,
        P: Policy + 'static,
    {
        let build: Arc<PolicyFactory> =
            Arc::new(move |subject: &Principal, resource: &ResourceRef| {
                Arc::new(build(subject, resource)) as Arc<dyn Policy>
            });

        Self {
            name,
            build,
            scope: None,
            attributes: None,
        }
    }

    /// Attach the nested Scope constructor
    pub fn with_scope<F, S>(mut self, build: F) -> Self
    where
        F: Fn(&Principal, &ResourceRef) -> S + Send + Sync + 'static,
        S: PolicyScope + 'static,
    {
        let build: Arc<ScopeFactory> =
            Arc::new(move |subject: &Principal, collection: &ResourceRef| {
                Box::new(build(subject, collection)) as Box<dyn PolicyScope>
            });
        self.scope = Some(build);
        self
    }

    /// Attach the nested Attributes constructor
    pub fn with_attributes<F, A>(mut self, build: F) -> Self
    where
        F: Fn(&Principal, &ResourceRef) -> A + Send + Sync + 'static,
        A: PolicyAttributes + 'static,
    {
        let build: Arc<AttributesFactory> =
            Arc::new(move |subject: &Principal, resource: &ResourceRef| {
                Box::new(build(subject, resource)) as Box<dyn PolicyAttributes>
            });
        self.attributes = Some(build);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name used in messages; anonymous classes render as `<anonymous policy>`
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Construct a policy instance for `subject` and `resource`
    pub fn instantiate(&self, subject: &Principal, resource: &ResourceRef) -> Arc<dyn Policy> {
        (self.build)(subject, resource)
    }

    /// Nested Scope constructor, if defined
    pub fn scope(&self) -> Option<ScopeClass> {
        self.scope.as_ref().map(|build| ScopeClass {
            policy: self.name.clone(),
            build: Arc::clone(build),
        })
    }

    /// Nested Attributes constructor, if defined
    pub fn attributes(&self) -> Option<AttributesClass> {
        self.attributes.as_ref().map(|build| AttributesClass {
            policy: self.name.clone(),
            build: Arc::clone(build),
        })
    }

    /// True when both values are clones of the same class
    pub fn ptr_eq(&self, other: &PolicyClass) -> bool {
        self.identity() == other.identity()
    }

    pub(crate) fn identity(&self) -> usize {
        thin_addr(Arc::as_ptr(&self.build))
    }
}

impl fmt::Debug for PolicyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyClass")
            .field("name", &self.display_name())
            .field("scope", &self.scope.is_some())
            .field("attributes", &self.attributes.is_some())
            .finish()
    }
}

/// Nested Scope constructor of a policy class
#[derive(Clone)]
pub struct ScopeClass {
    policy: Option<Arc<str>>,
    build: Arc<ScopeFactory>,
}

impl ScopeClass {
    /// Name of the owning policy class
    pub fn policy_name(&self) -> &str {
        self.policy.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn instantiate(&self, subject: &Principal, collection: &ResourceRef) -> Box<dyn PolicyScope> {
        (self.build)(subject, collection)
    }
}

impl fmt::Debug for ScopeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::Scope", self.policy_name())
    }
}

/// Nested Attributes constructor of a policy class
#[derive(Clone)]
pub struct AttributesClass {
    policy: Option<Arc<str>>,
    build: Arc<AttributesFactory>,
}

impl AttributesClass {
    /// Name of the owning policy class
    pub fn policy_name(&self) -> &str {
        self.policy.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn instantiate(
        &self,
        subject: &Principal,
        resource: &ResourceRef,
    ) -> Box<dyn PolicyAttributes> {
        (self.build)(subject, resource)
    }
}

impl fmt::Debug for AttributesClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::Attributes", self.policy_name())
    }
}
