//! Resource references and the metadata policies are resolved from
//!
//! A resource reaches the resolver in one of four shapes: a type
//! descriptor, a live instance, a symbolic name (`"post"`, `"article_tags"`)
//! or an already-resolved [`PolicyClass`]. Domain types opt in by
//! implementing [`Resource`]; the resolver never looks for optional
//! accessors at runtime.

use crate::policy::PolicyClass;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Domain object that can be authorized
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use warrant_authz::{Resource, ResourceRef, ResourceType};
///
/// #[derive(Debug)]
/// struct Post {
///     title: String,
/// }
///
/// impl Post {
///     fn model() -> ResourceType {
///         ResourceType::new("Post")
///     }
/// }
///
/// impl Resource for Post {
///     fn resource_type(&self) -> ResourceType {
///         Post::model()
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let post = ResourceRef::instance(Post { title: "Hello".into() });
/// assert_eq!(post.downcast_ref::<Post>().unwrap().title, "Hello");
/// ```
pub trait Resource: Any + Send + Sync + fmt::Debug {
    /// Descriptor of the runtime type of this instance
    fn resource_type(&self) -> ResourceType;

    /// Semantic name of this particular instance, if it has one
    fn model_name(&self) -> Option<String> {
        None
    }

    /// Explicit policy for this particular instance, bypassing naming
    fn policy_target(&self) -> Option<PolicyTarget> {
        None
    }

    /// Upcast used by policies to reach the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Explicit policy override
#[derive(Debug, Clone)]
pub enum PolicyTarget {
    /// A policy class value, possibly anonymous
    Class(PolicyClass),
    /// A policy name looked up in the registry at resolution time
    Named(String),
}

impl From<PolicyClass> for PolicyTarget {
    fn from(class: PolicyClass) -> Self {
        PolicyTarget::Class(class)
    }
}

impl From<&str> for PolicyTarget {
    fn from(name: &str) -> Self {
        PolicyTarget::Named(name.to_string())
    }
}

impl From<String> for PolicyTarget {
    fn from(name: String) -> Self {
        PolicyTarget::Named(name)
    }
}

/// Descriptor of a domain type
#[derive(Debug, Clone)]
pub struct ResourceType {
    name: Cow<'static, str>,
    model_name: Option<String>,
    policy: Option<PolicyTarget>,
}

impl ResourceType {
    /// Describe a type by its name
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            model_name: None,
            policy: None,
        }
    }

    /// Attach a semantic name that takes precedence over the type name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Attach an explicit policy override
    pub fn with_policy(mut self, target: impl Into<PolicyTarget>) -> Self {
        self.policy = Some(target.into());
        self
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic name, if any
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Explicit policy override, if any
    pub fn policy_target(&self) -> Option<&PolicyTarget> {
        self.policy.as_ref()
    }
}

impl PartialEq for ResourceType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.model_name == other.model_name
    }
}

impl Eq for ResourceType {}

/// Anything a caller may authorize against
#[derive(Debug, Clone)]
pub enum ResourceRef {
    /// A domain type
    Type(ResourceType),
    /// An instance of a domain type
    Instance(Arc<dyn Resource>),
    /// A symbolic name such as `"post"` or `"article_tags"`
    Symbol(String),
    /// An already-resolved policy class
    Policy(PolicyClass),
}

impl ResourceRef {
    /// Wrap a domain instance
    pub fn instance<R: Resource>(resource: R) -> Self {
        ResourceRef::Instance(Arc::new(resource))
    }

    /// Reference a resource by symbolic name
    pub fn symbol(name: impl Into<String>) -> Self {
        ResourceRef::Symbol(name.into())
    }

    /// Borrow the wrapped instance as `T`
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        match self {
            ResourceRef::Instance(resource) => resource.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// True when both references denote the same call target
    ///
    /// Instances and policy classes compare by identity, symbols by name.
    /// Types compare by name, semantic name and policy override.
    pub fn is_same(&self, other: &ResourceRef) -> bool {
        self.key() == other.key()
    }

    pub(crate) fn key(&self) -> ResourceKey {
        match self {
            ResourceRef::Type(resource_type) => ResourceKey::Type(resource_type.clone()),
            ResourceRef::Instance(resource) => ResourceKey::Instance(Arc::clone(resource)),
            ResourceRef::Symbol(name) => ResourceKey::Symbol(name.clone()),
            ResourceRef::Policy(class) => ResourceKey::Policy(class.clone()),
        }
    }
}

impl From<ResourceType> for ResourceRef {
    fn from(resource_type: ResourceType) -> Self {
        ResourceRef::Type(resource_type)
    }
}

impl From<Arc<dyn Resource>> for ResourceRef {
    fn from(resource: Arc<dyn Resource>) -> Self {
        ResourceRef::Instance(resource)
    }
}

impl From<PolicyClass> for ResourceRef {
    fn from(class: PolicyClass) -> Self {
        ResourceRef::Policy(class)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Type(resource_type) => f.write_str(resource_type.name()),
            ResourceRef::Instance(resource) => {
                write!(f, "{} instance", resource.resource_type().name())
            }
            ResourceRef::Symbol(name) => write!(f, ":{}", name),
            ResourceRef::Policy(class) => f.write_str(class.display_name()),
        }
    }
}

/// Cache key for one call target within a session
///
/// A type key covers every field that takes part in resolution. Holding the
/// instance `Arc` or override class keeps its address from being reused
/// while the key is alive.
#[derive(Clone)]
pub(crate) enum ResourceKey {
    Type(ResourceType),
    Symbol(String),
    Instance(Arc<dyn Resource>),
    Policy(PolicyClass),
}

fn instance_addr(resource: &Arc<dyn Resource>) -> usize {
    Arc::as_ptr(resource) as *const () as usize
}

fn same_target(a: Option<&PolicyTarget>, b: Option<&PolicyTarget>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(PolicyTarget::Named(a)), Some(PolicyTarget::Named(b))) => a == b,
        (Some(PolicyTarget::Class(a)), Some(PolicyTarget::Class(b))) => a.ptr_eq(b),
        _ => false,
    }
}

fn hash_target<H: Hasher>(target: Option<&PolicyTarget>, state: &mut H) {
    match target {
        None => 0u8.hash(state),
        Some(PolicyTarget::Named(name)) => {
            1u8.hash(state);
            name.hash(state);
        }
        Some(PolicyTarget::Class(class)) => {
            2u8.hash(state);
            class.identity().hash(state);
        }
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResourceKey::Type(a), ResourceKey::Type(b)) => {
                a == b && same_target(a.policy_target(), b.policy_target())
            }
            (ResourceKey::Symbol(a), ResourceKey::Symbol(b)) => a == b,
            (ResourceKey::Instance(a), ResourceKey::Instance(b)) => {
                instance_addr(a) == instance_addr(b)
            }
            (ResourceKey::Policy(a), ResourceKey::Policy(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for ResourceKey {}

impl Hash for ResourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ResourceKey::Type(resource_type) => {
                0u8.hash(state);
                resource_type.name().hash(state);
                resource_type.model_name().hash(state);
                hash_target(resource_type.policy_target(), state);
            }
            ResourceKey::Symbol(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            ResourceKey::Instance(resource) => {
                2u8.hash(state);
                instance_addr(resource).hash(state);
            }
            ResourceKey::Policy(class) => {
                3u8.hash(state);
                class.identity().hash(state);
            }
        }
    }
}
