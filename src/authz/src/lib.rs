//! # Warrant Authorization Layer
//!
//! Policy-object authorization for request-driven applications: every
//! resource is paired with a policy by naming convention, and a per-request
//! session checks questions such as "may this user update this post?".
//!
//! ## Features
//!
//! - **Convention-based resolution**: `Post` -> `PostPolicy`, late-bound
//!   through a [`PolicyRegistry`]
//! - **Explicit overrides** per resource type or instance, including
//!   anonymous policy classes
//! - **Scopes** narrowing collections to what a subject may see
//! - **Permitted attributes** and parameter filtering
//! - **Audit flags** so a request can fail closed when no check ran
//!
//! ## Example
//!
//! ```rust
//! use std::any::Any;
//! use std::sync::Arc;
//! use warrant_authz::{
//!     Policy, PolicyClass, PolicyRegistry, PolicyResolver, Principal, Resource, ResourceRef,
//!     ResourceType, Session,
//! };
//!
//! #[derive(Debug)]
//! struct Post {
//!     owner: String,
//! }
//!
//! impl Resource for Post {
//!     fn resource_type(&self) -> ResourceType {
//!         ResourceType::new("Post")
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct PostPolicy {
//!     user: Principal,
//!     owner: Option<String>,
//! }
//!
//! impl Policy for PostPolicy {
//!     fn query(&self, query: &str) -> Option<bool> {
//!         match query {
//!             "update?" => Some(self.owner.as_deref() == Some(self.user.id.as_str())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(PolicyRegistry::new());
//!     registry.register(PolicyClass::new("PostPolicy", |user: &Principal, post: &ResourceRef| {
//!         PostPolicy {
//!             user: user.clone(),
//!             owner: post.downcast_ref::<Post>().map(|post| post.owner.clone()),
//!         }
//!     }))?;
//!
//!     let mut session = Session::for_subject(PolicyResolver::new(registry), Principal::new("user:alice"))
//!         .with_action_name("update");
//!
//!     let post = ResourceRef::instance(Post { owner: "user:alice".to_string() });
//!     session.authorize(&post, None)?;
//!     session.verify_authorized()?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod finder;
pub mod params;
pub mod policy;
pub mod resolver;
pub mod resource;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::ResolverConfig;
pub use error::{AuthzError, Result};
pub use finder::PolicyFinder;
pub use params::{ParamsPermitter, RequireParams, SliceParams};
pub use policy::{
    permitted, AttributesClass, Permitted, Policy, PolicyAttributes, PolicyClass, PolicyRegistry,
    PolicyScope, ScopeClass, Scoped,
};
pub use resolver::PolicyResolver;
pub use resource::{PolicyTarget, Resource, ResourceRef, ResourceType};
pub use session::{Session, SessionHost};
pub use types::{Action, Principal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
