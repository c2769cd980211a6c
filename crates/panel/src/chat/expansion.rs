use std::collections::BTreeSet;

use serde::Serialize;

/// Message indices whose assistant body is shown.
///
/// Values are never mutated in place; `toggled` hands back a new set so the
/// previous state stays comparable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpansionSet(BTreeSet<usize>);

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `index` removed if present, inserted otherwise.
    pub fn toggled(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        if !indices.remove(&index) {
            indices.insert(index);
        }
        Self(indices)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let empty = ExpansionSet::new();
        let expanded = empty.toggled(1);

        assert!(expanded.contains(1));
        assert!(empty.is_empty(), "source set must stay untouched");
        assert_eq!(expanded.toggled(1), empty);
    }

    #[test]
    fn toggle_twice_is_identity_for_any_set() {
        let sets = [
            ExpansionSet::new(),
            ExpansionSet::from_iter([1]),
            ExpansionSet::from_iter([0, 3, 7]),
        ];

        for set in &sets {
            for index in 0..9 {
                assert_eq!(set.toggled(index).toggled(index), *set, "index {index}");
            }
        }
    }
}
