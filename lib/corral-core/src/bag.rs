use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CorralError;

/// Ordered key/value container used for headers, query parameters, body
/// fields, and config options.
///
/// Keys are unique; inserting an existing key overwrites its value while the
/// entry keeps its original position (stable-merge semantics). Values are
/// arbitrary [`serde_json::Value`]s, so bags accept scalars as well as nested
/// structures for body data.
///
/// # Example
///
/// ```rust
/// use corral_core::PropertyBag;
///
/// let defaults = PropertyBag::new()
///     .with("Accept", "application/json")
///     .with("X-Tenant", "acme");
/// let overrides = PropertyBag::new().with("X-Tenant", "initech");
///
/// let merged = defaults.merge(&overrides);
/// assert_eq!(merged.get("X-Tenant"), Some(&"initech".into()));
/// // Sources are untouched
/// assert_eq!(defaults.get("X-Tenant"), Some(&"acme".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: IndexMap<String, Value>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, overwriting any existing entry with the same key.
    ///
    /// An overwritten entry keeps its original position.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add(key, value);
        self
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the value for `key` as a string slice, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Returns all entries in insertion order.
    pub fn all(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a new bag combining `self` with `other`.
    ///
    /// Entries from `other` win on key collision; neither source is mutated.
    /// Overridden entries keep the position they had in `self`, appended
    /// entries follow in `other`'s order.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            entries.insert(key.clone(), value.clone());
        }
        Self { entries }
    }

    /// Merges any number of bags, later bags winning on key collision.
    #[must_use]
    pub fn merged<'a>(bags: impl IntoIterator<Item = &'a Self>) -> Self {
        bags.into_iter()
            .fold(Self::new(), |acc, bag| acc.merge(bag))
    }

    /// Renders the bag as a JSON object, preserving no particular field
    /// order (JSON object member order carries no meaning).
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self { entries }
    }
}

/// Renders a property value as header/query text.
///
/// Scalars render naturally, arrays join with commas, objects are rejected.
pub(crate) fn render_value(value: &Value) -> Result<String, CorralError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::String(text) => Ok(text.clone()),
        Value::Array(items) => {
            let rendered = items
                .iter()
                .map(render_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rendered.join(","))
        }
        Value::Object(_) => Err(CorralError::UnsupportedPropertyValue {
            value: value.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_bag_is_empty() {
        let bag = PropertyBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.len(), 0);
    }

    #[test]
    fn test_add_get_remove() {
        let mut bag = PropertyBag::new();
        bag.add("page", 1).add("limit", 25);

        assert_eq!(bag.get("page"), Some(&json!(1)));
        assert_eq!(bag.remove("page"), Some(json!(1)));
        assert_eq!(bag.get("page"), None);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_merge_does_not_mutate_sources() {
        let left = PropertyBag::new().with("a", 1).with("b", 2);
        let right = PropertyBag::new().with("b", 3).with("c", 4);

        let merged = left.merge(&right);

        assert_eq!(left.get("b"), Some(&json!(2)));
        assert_eq!(right.get("b"), Some(&json!(3)));
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(3)));
        assert_eq!(merged.get("c"), Some(&json!(4)));
    }

    // Pins the stable-merge behavior: an overridden key keeps the position
    // it had in the earlier bag, appended keys follow in the later bag's
    // order.
    #[rstest]
    #[case::no_overlap(
        vec![("a", 1), ("b", 2)],
        vec![("c", 3)],
        vec!["a", "b", "c"]
    )]
    #[case::override_keeps_position(
        vec![("a", 1), ("b", 2), ("c", 3)],
        vec![("b", 9)],
        vec!["a", "b", "c"]
    )]
    #[case::override_and_append(
        vec![("a", 1), ("b", 2)],
        vec![("b", 9), ("d", 4), ("a", 8)],
        vec!["a", "b", "d"]
    )]
    fn test_merge_order(
        #[case] left: Vec<(&str, i32)>,
        #[case] right: Vec<(&str, i32)>,
        #[case] expected: Vec<&str>,
    ) {
        let left: PropertyBag = left.into_iter().collect();
        let right: PropertyBag = right.into_iter().collect();

        let merged = left.merge(&right);
        let keys: Vec<_> = merged.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_merge_later_bags_win() {
        let first = PropertyBag::new().with("key", "first");
        let second = PropertyBag::new().with("key", "second");
        let third = PropertyBag::new().with("key", "third");

        let merged = PropertyBag::merged([&first, &second, &third]);
        assert_eq!(merged.get_str("key"), Some("third"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_nested_values_allowed() {
        let bag = PropertyBag::new().with("filter", json!({"status": "open"}));
        assert_eq!(bag.get("filter"), Some(&json!({"status": "open"})));
    }

    #[rstest]
    #[case::null(json!(null), "")]
    #[case::boolean(json!(true), "true")]
    #[case::number(json!(42), "42")]
    #[case::string(json!("plain"), "plain")]
    #[case::array(json!(["a", 1, false]), "a,1,false")]
    fn test_render_value(#[case] value: Value, #[case] expected: &str) {
        let rendered = render_value(&value).expect("value should render");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_value_rejects_objects() {
        let result = render_value(&json!({"nested": "object"}));
        assert!(matches!(
            result,
            Err(CorralError::UnsupportedPropertyValue { .. })
        ));
    }
}
