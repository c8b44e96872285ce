// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tag-keyed constructor registries for polymorphic families.

use indexmap::IndexMap;

/// Error raised when a registry is asked for an unknown tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    /// No constructor registered under this tag
    #[error("Unknown {family} type: {tag}")]
    UnknownType {
        /// Family the registry builds (e.g. "duration")
        family: &'static str,
        /// The tag that was requested
        tag: String,
    },
}

/// Registry mapping stable type tags to constructors.
///
/// Registration order is kept so hosts can list the choices in a
/// predictable order.
pub struct Factory<T> {
    family: &'static str,
    constructors: IndexMap<&'static str, fn() -> T>,
}

impl<T> Factory<T> {
    /// Create an empty registry for a family
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            constructors: IndexMap::new(),
        }
    }

    /// Register a constructor, replacing any previous one for the tag
    pub fn register(&mut self, tag: &'static str, constructor: fn() -> T) -> &mut Self {
        self.constructors.insert(tag, constructor);
        self
    }

    /// Builder form of [`Factory::register`]
    pub fn with(mut self, tag: &'static str, constructor: fn() -> T) -> Self {
        self.register(tag, constructor);
        self
    }

    /// Build a default instance for a tag
    pub fn create(&self, tag: &str) -> Result<T, FactoryError> {
        self.constructors
            .get(tag)
            .map(|constructor| constructor())
            .ok_or_else(|| FactoryError::UnknownType {
                family: self.family,
                tag: tag.to_string(),
            })
    }

    /// Whether a tag is registered
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered tags in registration order
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Family name used in error messages
    pub fn family(&self) -> &'static str {
        self.family
    }
}

impl<T> std::fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("family", &self.family)
            .field("tags", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> u32 {
        1
    }

    fn two() -> u32 {
        2
    }

    #[test]
    fn test_create_by_tag() {
        let factory = Factory::new("number").with("one", one).with("two", two);
        assert_eq!(factory.create("two"), Ok(2));
        assert!(factory.contains("one"));
        assert_eq!(factory.tags().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_unknown_tag() {
        let factory = Factory::new("number").with("one", one);
        let err = factory.create("three").unwrap_err();
        assert_eq!(err.to_string(), "Unknown number type: three");
    }
}
