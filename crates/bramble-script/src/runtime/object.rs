//! Shared, mutable object and array storage.
//!
//! Both handles are reference types: cloning a handle yields another view of
//! the same storage, and identity (`ptr_eq`) is what `===` compares.

use super::value::Value;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle to a script object.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<BTreeMap<String, Value>>>);

impl ObjectRef {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object from key/value pairs.
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self(Arc::new(RwLock::new(map)))
    }

    /// Reads a property. Missing properties are `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Writes a property.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.write().insert(key.into(), value);
    }

    /// Returns true if the property exists.
    pub fn has(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Property names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of all properties.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({:p})", Arc::as_ptr(&self.0))
    }
}

/// Largest length an array may grow to. Elements are stored densely, so a
/// write far past the end allocates every slot in between.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Handle to a script array.
#[derive(Clone, Default)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

impl ArrayRef {
    /// Creates an array from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }

    /// Reads an element.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Writes an element, padding with `undefined` when writing past the end.
    ///
    /// Fails with a RangeError when `index` is not below [`MAX_ARRAY_LENGTH`].
    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        if index >= MAX_ARRAY_LENGTH {
            return Err(Error::range_error(format!(
                "Invalid array index {} (limit {})",
                index, MAX_ARRAY_LENGTH
            )));
        }
        let mut items = self.0.write();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
        Ok(())
    }

    /// Appends an element.
    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Copy of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Array({:p})", Arc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_storage() {
        let a = ObjectRef::new();
        let b = a.clone();
        b.set("x", Value::Number(1.0));
        assert_eq!(a.get("x"), Some(Value::Number(1.0)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&ObjectRef::new()));
    }

    #[test]
    fn test_array_set_pads() {
        let arr = ArrayRef::new(vec![]);
        arr.set(2, Value::Boolean(true)).unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(0), Some(Value::Undefined));
        assert_eq!(arr.get(2), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_array_set_rejects_huge_index() {
        let arr = ArrayRef::new(vec![]);
        assert!(matches!(
            arr.set(10_000_000_000, Value::Null),
            Err(Error::RangeError(_))
        ));
        assert!(arr.set(usize::MAX, Value::Null).is_err());
        assert!(arr.is_empty());
    }
}
