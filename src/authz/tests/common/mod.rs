//! Shared fixtures for integration tests
//!
//! - `Post` with `PostPolicy`, a Scope narrowing to published posts and
//!   Attributes `["title"]`
//! - `Comment` (type `CommentRecord`, semantic name `Comment`) whose Scope
//!   passes the collection through
//! - `Article` without any policy
//! - `Blog` / `ArtificialBlog`, the latter overriding its policy to `BlogPolicy`
//! - `ArticleTag` overriding its policy with an anonymous class
//! - `FeaturedPost`, a `Post` whose instance overrides its policy to
//!   `BlogPolicy`
//! - `ArtificialBlogPolicy` / `ArticleTagPolicy` registered under the
//!   conventional names the overrides must shadow

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;
use warrant_authz::{
    permitted, Permitted, Policy, PolicyAttributes, PolicyClass, PolicyRegistry, PolicyResolver,
    PolicyScope, PolicyTarget, Principal, Resource, ResourceRef, ResourceType, Result, Scoped,
    Session,
};

pub const PUBLISHED: &str = "published";

pub fn user() -> Principal {
    Principal::new("user:alice")
}

pub fn other_user() -> Principal {
    Principal::new("user:mallory")
}

// ============================================================================
// POST
// ============================================================================

#[derive(Debug)]
pub struct Post {
    pub user: Option<Principal>,
    pub title: String,
}

impl Post {
    pub fn model() -> ResourceType {
        ResourceType::new("Post")
    }

    pub fn owned_by(user: Principal) -> ResourceRef {
        ResourceRef::instance(Post {
            user: Some(user),
            title: "Hello".to_string(),
        })
    }

    pub fn orphan() -> ResourceRef {
        ResourceRef::instance(Post {
            user: None,
            title: "Nobody's".to_string(),
        })
    }
}

impl Resource for Post {
    fn resource_type(&self) -> ResourceType {
        Post::model()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct PostPolicy {
    pub user: Principal,
    pub post: ResourceRef,
}

impl Policy for PostPolicy {
    fn query(&self, query: &str) -> Option<bool> {
        match query {
            "update?" => {
                let owner = self
                    .post
                    .downcast_ref::<Post>()
                    .and_then(|post| post.user.as_ref());
                Some(owner == Some(&self.user))
            }
            "destroy?" => Some(false),
            "show?" => Some(true),
            _ => None,
        }
    }
}

pub struct PostScope {
    pub user: Principal,
    pub scope: ResourceRef,
}

impl PolicyScope for PostScope {
    fn resolve(&self) -> Result<Scoped> {
        Ok(Scoped::new(PUBLISHED))
    }
}

pub struct PostAttributes;

impl PolicyAttributes for PostAttributes {
    fn permitted_attributes(&self) -> Result<Permitted> {
        Ok(permitted(["title"]))
    }
}

pub fn post_policy() -> PolicyClass {
    PolicyClass::new("PostPolicy", |user: &Principal, post: &ResourceRef| PostPolicy {
        user: user.clone(),
        post: post.clone(),
    })
    .with_scope(|user: &Principal, scope: &ResourceRef| PostScope {
        user: user.clone(),
        scope: scope.clone(),
    })
    .with_attributes(|_: &Principal, _: &ResourceRef| PostAttributes)
}

// ============================================================================
// COMMENT
// ============================================================================

#[derive(Debug, Default)]
pub struct Comment {
    pub accessible_column: Option<String>,
    pub protected_column: Option<String>,
    pub virtual_column: Option<String>,
}

impl Comment {
    pub fn model() -> ResourceType {
        ResourceType::new("CommentRecord").with_model_name("Comment")
    }
}

impl Resource for Comment {
    fn resource_type(&self) -> ResourceType {
        Comment::model()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct CommentPolicy {
    pub user: Principal,
    pub comment: ResourceRef,
}

impl Policy for CommentPolicy {
    fn query(&self, _query: &str) -> Option<bool> {
        None
    }
}

pub struct CommentScope {
    pub scope: ResourceRef,
}

impl PolicyScope for CommentScope {
    fn resolve(&self) -> Result<Scoped> {
        Ok(Scoped::new(self.scope.clone()))
    }
}

pub struct CommentAttributes;

impl PolicyAttributes for CommentAttributes {
    fn permitted_attributes(&self) -> Result<Permitted> {
        Ok(permitted(["accessible_column", "virtual_column"]))
    }
}

pub fn comment_policy() -> PolicyClass {
    PolicyClass::new("CommentPolicy", |user: &Principal, comment: &ResourceRef| {
        CommentPolicy {
            user: user.clone(),
            comment: comment.clone(),
        }
    })
    .with_scope(|_: &Principal, scope: &ResourceRef| CommentScope {
        scope: scope.clone(),
    })
    .with_attributes(|_: &Principal, _: &ResourceRef| CommentAttributes)
}

// ============================================================================
// ARTICLE (no policy)
// ============================================================================

#[derive(Debug)]
pub struct Article;

impl Article {
    pub fn model() -> ResourceType {
        ResourceType::new("Article")
    }
}

impl Resource for Article {
    fn resource_type(&self) -> ResourceType {
        Article::model()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// BLOG / ARTIFICIAL BLOG (named override)
// ============================================================================

#[derive(Debug)]
pub struct BlogPolicy {
    pub user: Principal,
    pub blog: ResourceRef,
}

impl Policy for BlogPolicy {
    fn query(&self, _query: &str) -> Option<bool> {
        None
    }
}

pub fn blog_policy() -> PolicyClass {
    PolicyClass::new("BlogPolicy", |user: &Principal, blog: &ResourceRef| BlogPolicy {
        user: user.clone(),
        blog: blog.clone(),
    })
}

#[derive(Debug)]
pub struct ArtificialBlog;

impl ArtificialBlog {
    pub fn model() -> ResourceType {
        ResourceType::new("ArtificialBlog").with_policy("BlogPolicy")
    }
}

impl Resource for ArtificialBlog {
    fn resource_type(&self) -> ResourceType {
        ArtificialBlog::model()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// ARTICLE TAG (anonymous override)
// ============================================================================

#[derive(Debug)]
pub struct TagPolicy {
    pub user: Principal,
    pub tag: ResourceRef,
}

impl Policy for TagPolicy {
    fn query(&self, query: &str) -> Option<bool> {
        match query {
            "show?" => Some(true),
            "destroy?" => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ArticleTag;

impl ArticleTag {
    pub fn model() -> ResourceType {
        ResourceType::new("ArticleTag").with_policy(PolicyClass::anonymous(
            |user: &Principal, tag: &ResourceRef| TagPolicy {
                user: user.clone(),
                tag: tag.clone(),
            },
        ))
    }
}

impl Resource for ArticleTag {
    fn resource_type(&self) -> ResourceType {
        ArticleTag::model()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// FEATURED POST (instance override)
// ============================================================================

#[derive(Debug)]
pub struct FeaturedPost;

impl Resource for FeaturedPost {
    fn resource_type(&self) -> ResourceType {
        Post::model()
    }

    fn policy_target(&self) -> Option<PolicyTarget> {
        Some(PolicyTarget::from("BlogPolicy"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// SHADOWED CONVENTIONAL POLICIES
// ============================================================================

pub const SHADOWED: &str = "shadowed";

#[derive(Debug)]
pub struct ShadowedPolicy;

impl Policy for ShadowedPolicy {
    fn query(&self, _query: &str) -> Option<bool> {
        Some(false)
    }
}

pub struct ShadowedScope;

impl PolicyScope for ShadowedScope {
    fn resolve(&self) -> Result<Scoped> {
        Ok(Scoped::new(SHADOWED))
    }
}

pub struct ShadowedAttributes;

impl PolicyAttributes for ShadowedAttributes {
    fn permitted_attributes(&self) -> Result<Permitted> {
        Ok(permitted([SHADOWED]))
    }
}

/// Fully featured policy registered under `name`
pub fn shadowed_policy(name: &str) -> PolicyClass {
    PolicyClass::new(name, |_: &Principal, _: &ResourceRef| ShadowedPolicy)
        .with_scope(|_: &Principal, _: &ResourceRef| ShadowedScope)
        .with_attributes(|_: &Principal, _: &ResourceRef| ShadowedAttributes)
}

// ============================================================================
// WIRING
// ============================================================================

pub fn registry() -> Arc<PolicyRegistry> {
    let registry = Arc::new(PolicyRegistry::new());
    registry
        .register_all([
            post_policy(),
            comment_policy(),
            blog_policy(),
            shadowed_policy("ArtificialBlogPolicy"),
            shadowed_policy("ArticleTagPolicy"),
        ])
        .expect("fixture policies register");
    registry
}

pub fn resolver() -> PolicyResolver {
    PolicyResolver::new(registry())
}

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Session acting as `user()` during an `update` interaction
pub fn session() -> Session {
    init_tracing();
    Session::for_subject(resolver(), user()).with_action_name("update")
}
