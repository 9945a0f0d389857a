use std::collections::HashMap;

/// Maps atom labels to dense type indices.
///
/// Types are numbered in order of first registration, so a water layout
/// `O H H O H H` yields `O → 0` and `H → 1`. The type index selects the
/// descriptor parameter set and the neural network used for an atom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomTypeRegistry {
    labels: Vec<String>,
    indices: HashMap<String, usize>,
}

impl AtomTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from an atom sequence, registering each new label in order.
    pub fn from_sequence<S: AsRef<str>>(sequence: &[S]) -> Self {
        let mut registry = Self::new();
        for label in sequence {
            registry.register(label.as_ref());
        }
        registry
    }

    /// Registers `label` if unseen and returns its type index.
    pub fn register(&mut self, label: &str) -> usize {
        if let Some(&index) = self.indices.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.indices.insert(label.to_string(), index);
        index
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.indices.get(label).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(type_index, label)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(String::as_str).enumerate()
    }
}
