//! Name to policy class registry

use super::PolicyClass;
use crate::error::{AuthzError, Result};
use dashmap::DashMap;
use tracing::debug;

/// Late-binding lookup of policy classes by name
///
/// Resolvers read the registry at resolution time, so classes may be
/// registered after a resolver has been built.
///
/// # Thread Safety
///
/// Backed by `DashMap`; share it across threads behind an `Arc`.
#[derive(Default)]
pub struct PolicyRegistry {
    classes: DashMap<String, PolicyClass>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named class, replacing any class with the same name
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anonymous classes.
    pub fn register(&self, class: PolicyClass) -> Result<()> {
        let name = match class.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(AuthzError::InvalidInput(
                    "anonymous policy classes cannot be registered".to_string(),
                ))
            }
        };

        if self.classes.insert(name.clone(), class).is_some() {
            debug!("Replaced policy class: {}", name);
        } else {
            debug!("Registered policy class: {}", name);
        }

        Ok(())
    }

    /// Register several classes at once
    pub fn register_all(&self, classes: impl IntoIterator<Item = PolicyClass>) -> Result<()> {
        for class in classes {
            self.register(class)?;
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<PolicyClass> {
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn unregister(&self, name: &str) -> Option<PolicyClass> {
        self.classes.remove(name).map(|(_, class)| class)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
