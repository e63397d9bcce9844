//! Named value-transform pipeline applied to field elements before encoding.
//!
//! An algorithm is a pure function of (element value, element index, the
//! complete value mapping) so it may read sibling fields. Registered
//! algorithms run per element in registration order.

use crate::error::CodecError;
use crate::value::{Value, ValueMap};
use std::collections::HashMap;

/// Transform applied to one element; receives the element's index within its
/// field's array and the full (pre-transform) value mapping.
pub type AlgorithmFn = Box<dyn Fn(&Value, usize, &ValueMap) -> Value + Send + Sync>;

/// What to do when a field names an algorithm nobody registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownAlgorithmPolicy {
    /// Fail the encode with [`CodecError::UnknownAlgorithm`].
    #[default]
    Error,
    /// Pass the value through untouched.
    Skip,
}

/// Registry resolving algorithm names to transform functions.
#[derive(Default)]
pub struct AlgorithmRegistry {
    algorithms: HashMap<String, AlgorithmFn>,
    policy: UnknownAlgorithmPolicy,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UnknownAlgorithmPolicy) -> Self {
        AlgorithmRegistry {
            algorithms: HashMap::new(),
            policy,
        }
    }

    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value, usize, &ValueMap) -> Value + Send + Sync + 'static,
    {
        self.algorithms.insert(name.to_string(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    /// Apply one named algorithm to one element.
    pub fn apply(
        &self,
        name: &str,
        value: &Value,
        index: usize,
        vals: &ValueMap,
    ) -> Result<Value, CodecError> {
        match self.algorithms.get(name) {
            Some(f) => Ok(f(value, index, vals)),
            None => match self.policy {
                UnknownAlgorithmPolicy::Error => {
                    Err(CodecError::UnknownAlgorithm(name.to_string()))
                }
                UnknownAlgorithmPolicy::Skip => Ok(value.clone()),
            },
        }
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.algorithms.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &names)
            .field("policy", &self.policy)
            .finish()
    }
}
