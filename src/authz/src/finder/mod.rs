//! Resource reference to policy class resolution
//!
//! Resolution order, first match wins:
//!
//! 1. An already-resolved [`PolicyClass`] reference resolves to itself
//! 2. An explicit override on the instance, then on its runtime type
//! 3. Naming convention: canonical resource name + policy suffix
//!    (`"Post"` -> `"PostPolicy"`), looked up in the registry at call time
//!
//! The canonical resource name is, in order: the instance's semantic name,
//! the runtime type's semantic name, the classified symbol, the type name.
//!
//! Lenient accessors return `None` when nothing resolves; the `require_*`
//! accessors return the matching `*NotFound` error instead.

mod inflect;

pub use inflect::{classify, singularize};

use crate::config::ResolverConfig;
use crate::error::{AuthzError, Result};
use crate::policy::{AttributesClass, PolicyClass, PolicyRegistry, ScopeClass};
use crate::resource::{PolicyTarget, ResourceRef};
use tracing::debug;

/// Outcome of the naming step, before registry lookup
enum Lookup {
    Class(PolicyClass),
    Named(String),
}

/// Resolves one resource reference against a registry
///
/// Stateless: every call recomputes from the shape of the reference.
pub struct PolicyFinder<'a> {
    registry: &'a PolicyRegistry,
    config: &'a ResolverConfig,
    object: &'a ResourceRef,
}

impl<'a> PolicyFinder<'a> {
    pub fn new(
        registry: &'a PolicyRegistry,
        config: &'a ResolverConfig,
        object: &'a ResourceRef,
    ) -> Self {
        Self {
            registry,
            config,
            object,
        }
    }

    /// Reference being resolved
    pub fn object(&self) -> &ResourceRef {
        self.object
    }

    /// Policy class for the reference, if one resolves
    pub fn policy(&self) -> Option<PolicyClass> {
        match self.find() {
            Lookup::Class(class) => Some(class),
            Lookup::Named(name) => {
                let class = self.registry.lookup(&name);
                if class.is_none() {
                    debug!("No policy class registered as {} for {}", name, self.object);
                }
                class
            }
        }
    }

    /// Policy class for the reference
    ///
    /// # Errors
    ///
    /// `PolicyNotFound` naming the attempted policy.
    pub fn require_policy(&self) -> Result<PolicyClass> {
        self.policy().ok_or_else(|| AuthzError::PolicyNotFound {
            policy: self.policy_name(),
            resource: self.object.clone(),
        })
    }

    /// Nested Scope of the resolved policy
    ///
    /// `None` both when the policy is missing and when it has no Scope.
    pub fn scope(&self) -> Option<ScopeClass> {
        self.policy().and_then(|class| class.scope())
    }

    /// Nested Scope of the resolved policy
    ///
    /// # Errors
    ///
    /// `ScopeNotFound` naming `<Policy>::Scope`.
    pub fn require_scope(&self) -> Result<ScopeClass> {
        self.scope().ok_or_else(|| AuthzError::ScopeNotFound {
            policy: self.policy_name(),
            resource: self.object.clone(),
        })
    }

    /// Nested Attributes of the resolved policy
    pub fn attributes(&self) -> Option<AttributesClass> {
        self.policy().and_then(|class| class.attributes())
    }

    /// Nested Attributes of the resolved policy
    ///
    /// # Errors
    ///
    /// `AttributesNotFound` naming `<Policy>::Attributes`.
    pub fn require_attributes(&self) -> Result<AttributesClass> {
        self.attributes().ok_or_else(|| AuthzError::AttributesNotFound {
            policy: self.policy_name(),
            resource: self.object.clone(),
        })
    }

    /// Name of the policy this reference maps to
    ///
    /// Overrides report their own name; conventional lookups report the
    /// attempted name whether or not it is registered.
    pub fn policy_name(&self) -> String {
        match self.find() {
            Lookup::Class(class) => class.display_name().to_string(),
            Lookup::Named(name) => name,
        }
    }

    /// Canonical resource name (e.g. `Post`)
    pub fn canonical_name(&self) -> String {
        match self.object {
            ResourceRef::Instance(resource) => resource.model_name().unwrap_or_else(|| {
                let resource_type = resource.resource_type();
                resource_type
                    .model_name()
                    .unwrap_or(resource_type.name())
                    .to_string()
            }),
            ResourceRef::Type(resource_type) => resource_type
                .model_name()
                .unwrap_or(resource_type.name())
                .to_string(),
            ResourceRef::Symbol(symbol) => classify(symbol),
            ResourceRef::Policy(class) => class.display_name().to_string(),
        }
    }

    /// Key of the resource in a parameter bag: the lower-cased canonical name
    pub fn params_key(&self) -> String {
        self.canonical_name().to_lowercase()
    }

    fn find(&self) -> Lookup {
        if let ResourceRef::Policy(class) = self.object {
            return Lookup::Class(class.clone());
        }

        if let Some(target) = self.explicit_target() {
            debug!("Using explicit policy override for {}", self.object);
            return match target {
                PolicyTarget::Class(class) => Lookup::Class(class),
                PolicyTarget::Named(name) => Lookup::Named(name),
            };
        }

        Lookup::Named(format!("{}{}", self.canonical_name(), self.config.policy_suffix))
    }

    fn explicit_target(&self) -> Option<PolicyTarget> {
        match self.object {
            ResourceRef::Instance(resource) => resource
                .policy_target()
                .or_else(|| resource.resource_type().policy_target().cloned()),
            ResourceRef::Type(resource_type) => resource_type.policy_target().cloned(),
            ResourceRef::Symbol(_) | ResourceRef::Policy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{permitted, Permitted, Policy, PolicyAttributes, PolicyScope, Scoped};
    use crate::resource::{Resource, ResourceType};
    use crate::types::Principal;
    use std::any::Any;

    #[derive(Debug)]
    struct Open;

    impl Policy for Open {
        fn query(&self, _query: &str) -> Option<bool> {
            Some(true)
        }
    }

    struct All;

    impl PolicyScope for All {
        fn resolve(&self) -> Result<Scoped> {
            Ok(Scoped::new("all"))
        }
    }

    struct Titles;

    impl PolicyAttributes for Titles {
        fn permitted_attributes(&self) -> Result<Permitted> {
            Ok(permitted(["title"]))
        }
    }

    #[derive(Debug)]
    struct Note {
        label: Option<String>,
    }

    impl Resource for Note {
        fn resource_type(&self) -> ResourceType {
            ResourceType::new("NoteRecord").with_model_name("Note")
        }

        fn model_name(&self) -> Option<String> {
            self.label.clone()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry() -> PolicyRegistry {
        let registry = PolicyRegistry::new();
        registry
            .register(
                PolicyClass::new("NotePolicy", |_: &Principal, _: &ResourceRef| Open)
                    .with_scope(|_: &Principal, _: &ResourceRef| All)
                    .with_attributes(|_: &Principal, _: &ResourceRef| Titles),
            )
            .unwrap();
        registry
            .register(PolicyClass::new("BarePolicy", |_: &Principal, _: &ResourceRef| Open))
            .unwrap();
        registry
    }

    #[test]
    fn test_canonical_name_precedence() {
        let registry = registry();
        let config = ResolverConfig::default();

        let plain = ResourceRef::instance(Note { label: None });
        assert_eq!(PolicyFinder::new(&registry, &config, &plain).canonical_name(), "Note");

        let labelled = ResourceRef::instance(Note {
            label: Some("Memo".to_string()),
        });
        assert_eq!(PolicyFinder::new(&registry, &config, &labelled).canonical_name(), "Memo");

        let by_type = ResourceRef::Type(ResourceType::new("Note"));
        assert_eq!(PolicyFinder::new(&registry, &config, &by_type).canonical_name(), "Note");

        let symbol = ResourceRef::symbol("notes");
        assert_eq!(PolicyFinder::new(&registry, &config, &symbol).canonical_name(), "Note");
    }

    #[test]
    fn test_convention_lookup() {
        let registry = registry();
        let config = ResolverConfig::default();
        let note = ResourceRef::instance(Note { label: None });
        let finder = PolicyFinder::new(&registry, &config, &note);

        assert_eq!(finder.policy_name(), "NotePolicy");
        assert_eq!(finder.policy().unwrap().name(), Some("NotePolicy"));
        assert!(finder.scope().is_some());
        assert!(finder.attributes().is_some());
    }

    #[test]
    fn test_missing_policy() {
        let registry = registry();
        let config = ResolverConfig::default();
        let article = ResourceRef::Type(ResourceType::new("Article"));
        let finder = PolicyFinder::new(&registry, &config, &article);

        assert!(finder.policy().is_none());
        assert!(finder.scope().is_none());
        assert!(finder.attributes().is_none());

        match finder.require_policy() {
            Err(AuthzError::PolicyNotFound { policy, .. }) => assert_eq!(policy, "ArticlePolicy"),
            other => panic!("Expected PolicyNotFound, got {:?}", other),
        }
        assert!(matches!(finder.require_scope(), Err(AuthzError::ScopeNotFound { .. })));
        assert!(matches!(
            finder.require_attributes(),
            Err(AuthzError::AttributesNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_nested_types_only() {
        let registry = registry();
        let config = ResolverConfig::default();
        let bare = ResourceRef::symbol("bare");
        let finder = PolicyFinder::new(&registry, &config, &bare);

        assert!(finder.require_policy().is_ok());
        let err = finder.require_scope().unwrap_err();
        assert_eq!(err.to_string(), "unable to find scope BarePolicy::Scope for :bare");
        let err = finder.require_attributes().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to find attributes BarePolicy::Attributes for :bare"
        );
    }

    #[test]
    fn test_late_binding() {
        let registry = PolicyRegistry::new();
        let config = ResolverConfig::default();
        let note = ResourceRef::symbol("note");

        assert!(PolicyFinder::new(&registry, &config, &note).policy().is_none());

        registry
            .register(PolicyClass::new("NotePolicy", |_: &Principal, _: &ResourceRef| Open))
            .unwrap();
        assert!(PolicyFinder::new(&registry, &config, &note).policy().is_some());
    }

    #[test]
    fn test_custom_suffix() {
        let registry = PolicyRegistry::new();
        registry
            .register(PolicyClass::new("NoteRules", |_: &Principal, _: &ResourceRef| Open))
            .unwrap();
        let config = ResolverConfig {
            policy_suffix: "Rules".to_string(),
            ..ResolverConfig::default()
        };
        let note = ResourceRef::symbol("note");

        assert!(PolicyFinder::new(&registry, &config, &note).policy().is_some());
    }

    #[test]
    fn test_policy_reference_resolves_to_itself() {
        let registry = PolicyRegistry::new();
        let config = ResolverConfig::default();
        let class = PolicyClass::new("DraftPolicy", |_: &Principal, _: &ResourceRef| Open);
        let reference = ResourceRef::Policy(class.clone());
        let finder = PolicyFinder::new(&registry, &config, &reference);

        assert!(finder.policy().unwrap().ptr_eq(&class));
        assert_eq!(finder.params_key(), "draftpolicy");
    }

    #[test]
    fn test_params_key() {
        let registry = registry();
        let config = ResolverConfig::default();

        let tag = ResourceRef::Type(ResourceType::new("ArticleTag"));
        assert_eq!(PolicyFinder::new(&registry, &config, &tag).params_key(), "articletag");

        let note = ResourceRef::instance(Note { label: None });
        assert_eq!(PolicyFinder::new(&registry, &config, &note).params_key(), "note");
    }
}
