use indexmap::IndexSet;

use crate::value::Value;

/// Insertion-ordered collection of distinct values.
///
/// This is the result type of path queries and set expressions. Duplicates
/// are detected by value equality and the first occurrence keeps its place.
/// Equality between two sets ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: IndexSet<Value>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning `false` if an equal value was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        self.items.insert(value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn union(&self, other: &ResultSet) -> ResultSet {
        self.items.union(&other.items).cloned().collect()
    }

    /// Elements of `self` also in `other`, in `self`'s order.
    pub fn intersection(&self, other: &ResultSet) -> ResultSet {
        self.items.intersection(&other.items).cloned().collect()
    }

    /// Elements of `self` not in `other`, in `self`'s order.
    pub fn difference(&self, other: &ResultSet) -> ResultSet {
        self.items.difference(&other.items).cloned().collect()
    }

    pub fn is_subset(&self, other: &ResultSet) -> bool {
        self.items.is_subset(&other.items)
    }

    pub fn is_superset(&self, other: &ResultSet) -> bool {
        self.items.is_superset(&other.items)
    }

    pub fn is_proper_subset(&self, other: &ResultSet) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn is_proper_superset(&self, other: &ResultSet) -> bool {
        self.len() > other.len() && self.is_superset(other)
    }
}

impl FromIterator<Value> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ResultSet {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = Value;
    type IntoIter = indexmap::set::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Value;
    type IntoIter = indexmap::set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[i64]) -> ResultSet {
        values.iter().map(|n| Value::Integer(*n)).collect()
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let s: ResultSet = [3, 1, 3, 2, 1]
            .into_iter()
            .map(Value::Integer)
            .collect();
        let order: Vec<_> = s.iter().cloned().collect();
        assert_eq!(
            order,
            vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]
        );
    }

    #[test]
    fn test_algebra_laws() {
        let a = set(&[1, 2, 3, 4]);
        let b = set(&[3, 4, 5]);

        let diff = a.difference(&b);
        assert!(b.iter().all(|v| !diff.contains(v)));

        let inter = a.intersection(&b);
        assert!(inter.is_subset(&a));
        assert!(inter.is_subset(&b));

        assert!(a.is_subset(&a.union(&b)));
        assert!(a.union(&b).is_proper_superset(&a));
        assert!(!a.is_proper_subset(&a));
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(set(&[1, 2, 3]), set(&[3, 2, 1]));
        assert_ne!(set(&[1, 2]), set(&[1, 2, 3]));
    }
}
