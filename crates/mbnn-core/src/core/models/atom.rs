/// One atom of a cluster's canonical layout.
///
/// Atoms are created once when a [`Topology`](super::topology::Topology) is built
/// and never change afterwards. Coordinates are not stored here; they live in
/// [`Configurations`](super::configuration::Configurations), one row per batch entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// The element label (e.g., "O", "H").
    pub label: String,
    /// Index of the atom type in the topology's
    /// [`AtomTypeRegistry`](crate::core::topology::registry::AtomTypeRegistry).
    pub type_index: usize,
    /// Index of the water molecule this atom belongs to.
    pub molecule: usize,
    /// Position of the atom inside its molecule's canonical ordering.
    pub slot: usize,
}

impl Atom {
    pub fn new(label: &str, type_index: usize, molecule: usize, slot: usize) -> Self {
        Self {
            label: label.to_string(),
            type_index,
            molecule,
            slot,
        }
    }

    /// Whether this atom anchors its molecule, i.e. is the first atom of the
    /// canonical ordering (the oxygen for water).
    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.slot == 0
    }
}
