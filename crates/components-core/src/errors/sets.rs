use std::collections::hash_set;
use std::collections::{HashMap, HashSet};

/// A set of strings backed by a `HashSet`.
///
/// Mutators take `&mut self` and hand the set back so calls chain:
/// `set.insert(["a", "b"]).delete(["a"])`. Set algebra never touches the
/// receivers and always builds a fresh set.
#[derive(Debug, Clone, Default)]
pub struct StringSet {
    items: HashSet<String>,
}

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from the keys of a string-keyed map.
    pub fn from_keys<V>(map: &HashMap<String, V>) -> Self {
        map.keys().cloned().collect()
    }

    /// Add items to the set. Duplicates collapse.
    pub fn insert<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Remove items from the set. Absent items are ignored.
    pub fn delete<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            self.items.remove(item.as_ref());
        }
        self
    }

    pub fn has(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// True when every item is in the set (vacuously true for none).
    pub fn has_all<I, S>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items.into_iter().all(|item| self.has(item.as_ref()))
    }

    /// True when at least one item is in the set.
    pub fn has_any<I, S>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items.into_iter().any(|item| self.has(item.as_ref()))
    }

    /// Members of `self` that are not in `other`.
    ///
    /// ```text
    /// {a1, a2, a3}.difference({a1, a2, a4, a5}) = {a3}
    /// {a1, a2, a4, a5}.difference({a1, a2, a3}) = {a4, a5}
    /// ```
    pub fn difference(&self, other: &StringSet) -> StringSet {
        self.items
            .iter()
            .filter(|key| !other.has(key))
            .cloned()
            .collect()
    }

    pub fn union(&self, other: &StringSet) -> StringSet {
        self.items.iter().chain(other.items.iter()).cloned().collect()
    }

    /// Members present in both sets. Walks the smaller set and probes the larger.
    pub fn intersection(&self, other: &StringSet) -> StringSet {
        let (walk, probe) = if self.len() < other.len() {
            (self, other)
        } else {
            (other, self)
        };
        walk.items
            .iter()
            .filter(|key| probe.has(key))
            .cloned()
            .collect()
    }

    pub fn is_superset(&self, other: &StringSet) -> bool {
        other.items.iter().all(|item| self.has(item))
    }

    /// Same members, order irrelevant.
    pub fn equal(&self, other: &StringSet) -> bool {
        self.len() == other.len() && self.is_superset(other)
    }

    /// Members sorted ascending. Stable for an unmodified set.
    pub fn list(&self) -> Vec<String> {
        let mut res = self.unsorted_list();
        res.sort_unstable();
        res
    }

    /// Members in no particular order.
    pub fn unsorted_list(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    /// Remove and return an arbitrary member, `None` when the set is empty.
    pub fn pop_any(&mut self) -> Option<String> {
        let key = self.items.iter().next().cloned()?;
        self.items.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.items.iter()
    }
}

impl PartialEq for StringSet {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for StringSet {}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = StringSet::new();
        set.insert(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for StringSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.insert(iter);
    }
}

impl IntoIterator for StringSet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringSet {
    type Item = &'a String;
    type IntoIter = hash_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> StringSet {
        items.iter().copied().collect()
    }

    #[test]
    fn new_collapses_duplicates() {
        let s = set(&["a", "b", "a", "c", "b"]);
        assert_eq!(s.len(), 3);
        assert!(s.has_all(["a", "b", "c"]));
    }

    #[test]
    fn insert_and_delete_chain() {
        let mut s = StringSet::new();
        s.insert(["x", "y", "z"]).delete(["y", "missing"]);
        assert_eq!(s.list(), vec!["x", "z"]);
        let mut members: Vec<&str> = s.iter().map(String::as_str).collect();
        members.sort_unstable();
        assert_eq!(members, ["x", "z"]);
    }

    #[test]
    fn has_any_and_has_all() {
        let s = set(&["a1", "a2"]);
        assert!(s.has_any(["zz", "a2"]));
        assert!(!s.has_any(["zz"]));
        assert!(s.has_all(Vec::<&str>::new()));
        assert!(!s.has_all(["a1", "a3"]));
    }

    #[test]
    fn difference_is_directional() {
        let s = set(&["a1", "a2", "a3"]);
        let s2 = set(&["a1", "a2", "a4", "a5"]);
        assert_eq!(s.difference(&s2), set(&["a3"]));
        assert_eq!(s2.difference(&s), set(&["a4", "a5"]));
        // receivers untouched
        assert_eq!(s.len(), 3);
        assert_eq!(s2.len(), 4);
    }

    #[test]
    fn union_contains_both() {
        let s = set(&["a1", "a2"]);
        let s2 = set(&["a3", "a4"]);
        assert_eq!(s.union(&s2), set(&["a1", "a2", "a3", "a4"]));
        assert_eq!(s2.union(&s), s.union(&s2));
    }

    #[test]
    fn intersection_is_commutative() {
        let a = set(&["a1", "a2", "a3", "a4"]);
        let b = set(&["a2", "a4", "a9"]);
        assert!(a.intersection(&b).equal(&b.intersection(&a)));
        assert_eq!(a.intersection(&b), set(&["a2", "a4"]));
        assert!(a.intersection(&StringSet::new()).is_empty());
    }

    #[test]
    fn equal_ignores_order_but_not_cardinality() {
        assert!(set(&["b", "a"]).equal(&set(&["a", "b"])));
        assert!(!set(&["a", "b"]).equal(&set(&["a"])));
        assert!(set(&["a", "b"]).is_superset(&set(&["a"])));
        assert!(!set(&["a"]).is_superset(&set(&["a", "b"])));
    }

    #[test]
    fn list_is_sorted_and_reproducible() {
        let s = set(&["pear", "apple", "fig", "banana"]);
        let first = s.list();
        assert_eq!(first, vec!["apple", "banana", "fig", "pear"]);
        assert_eq!(s.list(), first);
        let mut unsorted = s.unsorted_list();
        unsorted.sort();
        assert_eq!(unsorted, first);
    }

    #[test]
    fn pop_any_drains_and_reports_empty() {
        let mut s = set(&["", "only"]);
        let mut popped = vec![s.pop_any().unwrap(), s.pop_any().unwrap()];
        popped.sort();
        assert_eq!(popped, vec!["", "only"]);
        assert_eq!(s.pop_any(), None);
    }

    #[test]
    fn from_keys_collects_map_keys() {
        let mut map = HashMap::new();
        map.insert("k1".to_string(), 1);
        map.insert("k2".to_string(), 2);
        assert_eq!(StringSet::from_keys(&map), set(&["k1", "k2"]));
    }
}
