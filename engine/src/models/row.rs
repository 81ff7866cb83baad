use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Map;

use super::Value;

/// An ordered collection of named cells.
///
/// Column names are case-sensitive and need not be unique; lookups by name
/// resolve to the first matching column. Columns keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Row::add`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add(name, value);
        self
    }

    /// Append a column, even if one with the same name exists.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.cells.push((name.into(), value.into()));
    }

    /// Index of the first column called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.cells.iter().position(|(column, _)| column == name)
    }

    pub fn column(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(|(name, _)| name.as_str())
    }

    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.cells.get(idx).map(|(_, value)| value)
    }

    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.find(name).and_then(|idx| self.value(idx))
    }

    /// Replace the value at `idx`. Returns `false` when out of range.
    pub fn set_value(&mut self, idx: usize, value: impl Into<Value>) -> bool {
        match self.cells.get_mut(idx) {
            Some(cell) => {
                cell.1 = value.into();
                true
            }
            None => false,
        }
    }

    /// Rename the column at `idx`. Returns `false` when out of range.
    pub fn set_column(&mut self, idx: usize, name: impl Into<String>) -> bool {
        match self.cells.get_mut(idx) {
            Some(cell) => {
                cell.0 = name.into();
                true
            }
            None => false,
        }
    }

    /// Overwrite the first column called `name`, or append it.
    pub fn add_or_set(&mut self, name: &str, value: impl Into<Value>) {
        match self.find(name) {
            Some(idx) => {
                self.set_value(idx, value);
            }
            None => self.add(name, value),
        }
    }

    pub fn remove(&mut self, idx: usize) -> Option<(String, Value)> {
        (idx < self.cells.len()).then(|| self.cells.remove(idx))
    }

    /// Keep only the cells for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.cells.retain(|(name, value)| keep(name, value));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// JSON object view. With duplicate names the last column wins.
    pub fn to_json(&self) -> Map<String, serde_json::Value> {
        self.cells
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }

    pub fn from_json(map: &Map<String, serde_json::Value>) -> Self {
        map.iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_returns_first_match() {
        let row = Row::new().with("a", 1).with("b", 2).with("a", 3);
        assert_eq!(row.find("a"), Some(0));
        assert_eq!(row.find("b"), Some(1));
        assert_eq!(row.find("A"), None);
        assert_eq!(row.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_add_or_set() {
        let mut row = Row::new().with("name", "Alice");
        row.add_or_set("name", "Bob");
        row.add_or_set("age", 30);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&Value::from("Bob")));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn test_remove_and_rename() {
        let mut row = Row::new().with("a", 1).with("b", 2);
        assert!(row.set_column(1, "c"));
        assert_eq!(row.remove(0), Some(("a".to_string(), Value::Int(1))));
        assert_eq!(row.remove(5), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_serialize_keeps_column_order() {
        let row = Row::new().with("z", 1).with("a", "x");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":1,"a":"x"}"#);
    }
}
