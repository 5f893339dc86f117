//! Shared key/value memory for a tree.

use std::any::{type_name, Any};
use std::collections::HashMap;

use crate::error::BlackboardError;

/// String-keyed properties of arbitrary type.
///
/// Values must be `Send + Sync` so trees can live in ECS components.
#[derive(Default)]
pub struct Blackboard {
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a property.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.properties.insert(key.into(), Box::new(value));
    }

    /// Typed lookup that reports why it failed.
    pub fn get<T: Any>(&self, key: &str) -> Result<&T, BlackboardError> {
        let value = self
            .properties
            .get(key)
            .ok_or_else(|| BlackboardError::Missing(key.to_string()))?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| BlackboardError::WrongType {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, BlackboardError> {
        let value = self
            .properties
            .get_mut(key)
            .ok_or_else(|| BlackboardError::Missing(key.to_string()))?;
        value
            .downcast_mut::<T>()
            .ok_or_else(|| BlackboardError::WrongType {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Lookup that treats missing and mistyped the same.
    pub fn try_get<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).ok()
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.properties.keys()).finish()
    }
}
