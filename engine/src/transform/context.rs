//! Per-run execution state.
//!
//! A fresh [`ExecutionContext`] is created for every pipeline execution and
//! dropped when it returns. Directives never keep run state in their own
//! fields, which is what lets one parsed pipeline serve concurrent runs.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::error::TransientStoreError;
use crate::models::Value;

/// Variables shared by all directives of one run.
///
/// [`TransientStore::get`] returns `None` for a variable that was never set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransientStore {
    variables: BTreeMap<String, Value>,
}

impl TransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Add `delta` to a variable, starting from zero when it is unset.
    ///
    /// Integers stay integers; a float variable stays a float. Null counts
    /// as unset. Integer overflow and any non-numeric value are errors that
    /// leave the store unchanged.
    pub fn increment(&mut self, name: &str, delta: i64) -> Result<&Value, TransientStoreError> {
        let next = match self.variables.get(name) {
            None | Some(Value::Null) => Value::Int(delta),
            Some(Value::Int(n)) => Value::Int(n.checked_add(delta).ok_or_else(|| {
                TransientStoreError::Overflow {
                    name: name.to_string(),
                    delta,
                }
            })?),
            Some(Value::Float(f)) => Value::Float(f + delta as f64),
            Some(other) => {
                return Err(TransientStoreError::NotNumeric {
                    name: name.to_string(),
                    found: other.type_name(),
                })
            }
        };
        let slot = self.variables.entry(name.to_string()).or_insert(Value::Null);
        *slot = next;
        Ok(slot)
    }

    /// Names of the currently set variables, sorted.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Descriptive metadata about one run. Never affects directive output.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    /// Optional caller-supplied label, e.g. the source file name.
    pub name: Option<String>,
    pub properties: HashMap<String, String>,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            name: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// State threaded through every directive of one run.
#[derive(Debug)]
pub struct ExecutionContext {
    store: TransientStore,
    metadata: RunMetadata,
}

impl ExecutionContext {
    /// Context with an empty store.
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            store: TransientStore::new(),
            metadata,
        }
    }

    pub fn store(&self) -> &TransientStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TransientStore {
        &mut self.store
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (TransientStore, RunMetadata) {
        (self.store, self.metadata)
    }
}
