//! Capability registry: the ordered, immutable-after-startup collection of
//! specialist capabilities exposed to the delegation loop.

use crate::capability::{CapabilityDescriptor, CapabilityHandle, CapabilityName};
use crate::error::RegistryError;
use std::collections::HashMap;

/// Ordered collection of capabilities, resolved by name.
///
/// Registration order is preserved and `describe_all` reports descriptors in
/// that order: insertion order is the only deterministic tie-break the
/// reasoning engine has when several capabilities look similarly
/// applicable. Built once at startup and then shared read-only across
/// concurrent requests (wrap in `Arc`).
///
/// # Example
///
/// ```rust,ignore
/// let registry = CapabilityRegistry::new()
///     .with_capability(Arc::new(search))
///     .with_capability(Arc::new(extract));
///
/// let handle = registry.resolve("web_search")?;
/// ```
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilityHandle>,
    index: HashMap<CapabilityName, usize>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability.
    ///
    /// Fails with [`RegistryError::DuplicateCapability`] if the name is
    /// already present, and with [`RegistryError::MissingDescription`] if
    /// the descriptor carries an empty description (selection quality
    /// depends entirely on it).
    pub fn register(&mut self, handle: CapabilityHandle) -> Result<(), RegistryError> {
        let descriptor = handle.descriptor();
        if descriptor.description.trim().is_empty() {
            return Err(RegistryError::MissingDescription(descriptor.name.clone()));
        }
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateCapability(descriptor.name.clone()));
        }
        self.index
            .insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(handle);
        Ok(())
    }

    /// Add a capability using the builder pattern.
    ///
    /// # Panics
    ///
    /// Panics on duplicate names or empty descriptions. Use
    /// [`Self::try_with_capability`] for error handling.
    pub fn with_capability(mut self, handle: CapabilityHandle) -> Self {
        self.register(handle).expect("valid capability registration");
        self
    }

    /// Try to add a capability using the builder pattern.
    pub fn try_with_capability(mut self, handle: CapabilityHandle) -> Result<Self, RegistryError> {
        self.register(handle)?;
        Ok(self)
    }

    /// Resolve a capability by name.
    ///
    /// The name arrives from the reasoning engine as free text, so lookup
    /// takes any string and unknown names fail with
    /// [`RegistryError::UnknownCapability`].
    pub fn resolve(&self, name: &str) -> Result<CapabilityHandle, RegistryError> {
        CapabilityName::parse(name)
            .ok()
            .and_then(|n| self.index.get(&n))
            .map(|&i| self.entries[i].clone())
            .ok_or_else(|| RegistryError::UnknownCapability(name.to_string()))
    }

    /// All descriptors in registration order, used verbatim to build the
    /// reasoning engine's available-actions context.
    pub fn describe_all(&self) -> Vec<&CapabilityDescriptor> {
        self.entries.iter().map(|e| e.descriptor()).collect()
    }

    /// Registered capability names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.descriptor().name.as_str())
            .collect()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        Capability, CapabilityArgs, CapabilityDescriptor, CapabilityName, InvocationResult,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticCapability {
        descriptor: CapabilityDescriptor,
        reply: String,
    }

    impl StaticCapability {
        fn handle(name: &str, description: &str, reply: &str) -> CapabilityHandle {
            Arc::new(Self {
                descriptor: CapabilityDescriptor::new(
                    CapabilityName::parse(name).expect("valid name"),
                    description,
                ),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl Capability for StaticCapability {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, _args: &CapabilityArgs) -> InvocationResult {
            InvocationResult::success(self.reply.clone())
        }
    }

    #[test]
    fn register_and_resolve() {
        let registry = CapabilityRegistry::new()
            .with_capability(StaticCapability::handle("alpha", "First.", "a"))
            .with_capability(StaticCapability::handle("beta", "Second.", "b"));

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("alpha").is_ok());
        assert!(registry.resolve("beta").is_ok());

        let missing = registry.resolve("gamma");
        assert!(matches!(
            missing,
            Err(RegistryError::UnknownCapability(name)) if name == "gamma"
        ));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(StaticCapability::handle("alpha", "First.", "a"))
            .expect("first registration");

        let err = registry
            .register(StaticCapability::handle("alpha", "Again.", "b"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCapability(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_description_is_rejected() {
        let mut registry = CapabilityRegistry::new();
        let err = registry
            .register(StaticCapability::handle("alpha", "   ", "a"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingDescription(_)));
    }

    #[test]
    fn describe_all_preserves_registration_order() {
        let registry = CapabilityRegistry::new()
            .with_capability(StaticCapability::handle("web_search", "Search.", ""))
            .with_capability(StaticCapability::handle("page_extract", "Extract.", ""))
            .with_capability(StaticCapability::handle("summarize", "Summarize.", ""));

        let names: Vec<&str> = registry
            .describe_all()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["web_search", "page_extract", "summarize"]);
        assert_eq!(registry.names(), names);
    }

    #[test]
    fn invalid_names_resolve_to_unknown() {
        let registry =
            CapabilityRegistry::new().with_capability(StaticCapability::handle("alpha", "A.", ""));

        // Names the reasoning engine invents may not even be parseable;
        // they still surface as unknown, not as a panic.
        assert!(matches!(
            registry.resolve("no such capability"),
            Err(RegistryError::UnknownCapability(_))
        ));
    }
}
