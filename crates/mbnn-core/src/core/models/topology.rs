use super::atom::Atom;
use crate::core::topology::registry::AtomTypeRegistry;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical atom ordering inside one water molecule.
pub const WATER_SEQUENCE: [&str; 3] = ["O", "H", "H"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// Two water molecules (2-body term).
    Dimer,
    /// Three water molecules (3-body term).
    Trimer,
}

impl TopologyKind {
    pub fn molecule_count(self) -> usize {
        match self {
            Self::Dimer => 2,
            Self::Trimer => 3,
        }
    }

    pub fn atom_count(self) -> usize {
        self.molecule_count() * WATER_SEQUENCE.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Unknown topology '{0}'. Expected '2h2o' (dimer) or '3h2o' (trimer).")]
    UnknownKind(String),
    #[error("Expected {expected} atom labels for this layout, found {found}")]
    LabelCount { expected: usize, found: usize },
    #[error("Atom {index} is labelled '{found}', but the canonical layout expects '{expected}'")]
    LabelMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

impl FromStr for TopologyKind {
    type Err = TopologyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "2" | "2h2o" | "2h2o_default" | "dimer" => Ok(Self::Dimer),
            "3" | "3h2o" | "3h2o_default" | "trimer" => Ok(Self::Trimer),
            _ => Err(TopologyError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Dimer => "2h2o",
                Self::Trimer => "3h2o",
            }
        )
    }
}

/// The canonical layout of a water cluster.
///
/// Atoms are ordered molecule by molecule, each molecule following
/// [`WATER_SEQUENCE`]. Every configuration evaluated against this topology must
/// list its coordinates in exactly this order.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    kind: TopologyKind,
    atoms: Vec<Atom>,
    registry: AtomTypeRegistry,
}

impl Topology {
    pub fn new(kind: TopologyKind) -> Self {
        let sequence: Vec<&str> = (0..kind.molecule_count())
            .flat_map(|_| WATER_SEQUENCE)
            .collect();
        let registry = AtomTypeRegistry::from_sequence(&sequence);

        let atoms = sequence
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let type_index = registry.index_of(label).unwrap_or_default();
                Atom::new(
                    label,
                    type_index,
                    i / WATER_SEQUENCE.len(),
                    i % WATER_SEQUENCE.len(),
                )
            })
            .collect();

        Self {
            kind,
            atoms,
            registry,
        }
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn molecule_count(&self) -> usize {
        self.kind.molecule_count()
    }

    pub fn registry(&self) -> &AtomTypeRegistry {
        &self.registry
    }

    #[inline]
    pub fn type_of(&self, atom: usize) -> usize {
        self.atoms[atom].type_index
    }

    pub fn labels(&self) -> Vec<&str> {
        self.atoms.iter().map(|a| a.label.as_str()).collect()
    }

    /// Indices of the anchor atom (oxygen) of every molecule, in molecule order.
    pub fn anchor_atoms(&self) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom.is_anchor())
            .map(|(i, _)| i)
            .collect()
    }

    /// Every unordered pair of anchor atoms, i.e. the intermolecular O–O pairs
    /// that drive the switching function: `(0,3)` for a dimer and
    /// `(0,3), (0,6), (3,6)` for a trimer.
    pub fn anchor_pairs(&self) -> Vec<(usize, usize)> {
        self.anchor_atoms()
            .into_iter()
            .tuple_combinations()
            .collect()
    }

    /// Atom indices grouped by type index.
    pub fn atoms_by_type(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.registry.len()];
        for (i, atom) in self.atoms.iter().enumerate() {
            groups[atom.type_index].push(i);
        }
        groups
    }

    /// Checks user-supplied atom labels against the canonical layout.
    pub fn check_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<(), TopologyError> {
        if labels.len() != self.atoms.len() {
            return Err(TopologyError::LabelCount {
                expected: self.atoms.len(),
                found: labels.len(),
            });
        }
        for (index, (atom, label)) in self.atoms.iter().zip(labels).enumerate() {
            if !atom.label.eq_ignore_ascii_case(label.as_ref().trim()) {
                return Err(TopologyError::LabelMismatch {
                    index,
                    expected: atom.label.clone(),
                    found: label.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_accepts_named_topology_aliases() {
        assert_eq!("2h2o_default".parse(), Ok(TopologyKind::Dimer));
        assert_eq!("3H2O".parse(), Ok(TopologyKind::Trimer));
        assert_eq!("trimer".parse(), Ok(TopologyKind::Trimer));
        assert!(matches!(
            "4h2o".parse::<TopologyKind>(),
            Err(TopologyError::UnknownKind(_))
        ));
    }

    #[test]
    fn dimer_has_canonical_water_ordering() {
        let topology = Topology::new(TopologyKind::Dimer);
        assert_eq!(topology.labels(), vec!["O", "H", "H", "O", "H", "H"]);
        assert_eq!(topology.type_of(0), 0);
        assert_eq!(topology.type_of(4), 1);
        assert_eq!(topology.atoms()[4].molecule, 1);
        assert_eq!(topology.atoms()[4].slot, 1);
    }

    #[test]
    fn trimer_anchor_pairs_cover_all_oxygen_pairs() {
        let topology = Topology::new(TopologyKind::Trimer);
        assert_eq!(topology.atom_count(), 9);
        assert_eq!(topology.anchor_atoms(), vec![0, 3, 6]);
        assert_eq!(topology.anchor_pairs(), vec![(0, 3), (0, 6), (3, 6)]);
    }

    #[test]
    fn atoms_by_type_groups_oxygens_and_hydrogens() {
        let topology = Topology::new(TopologyKind::Dimer);
        let groups = topology.atoms_by_type();
        assert_eq!(groups[0], vec![0, 3]);
        assert_eq!(groups[1], vec![1, 2, 4, 5]);
    }

    #[test]
    fn check_labels_accepts_canonical_sequence() {
        let topology = Topology::new(TopologyKind::Dimer);
        assert!(topology.check_labels(&["O", "H", "H", "o", "h", "h"]).is_ok());
    }

    #[test]
    fn check_labels_rejects_wrong_count() {
        let topology = Topology::new(TopologyKind::Dimer);
        assert_eq!(
            topology.check_labels(&["O", "H", "H"]),
            Err(TopologyError::LabelCount {
                expected: 6,
                found: 3
            })
        );
    }

    #[test]
    fn check_labels_rejects_reordered_atoms() {
        let topology = Topology::new(TopologyKind::Dimer);
        let result = topology.check_labels(&["H", "O", "H", "O", "H", "H"]);
        assert!(matches!(
            result,
            Err(TopologyError::LabelMismatch { index: 0, .. })
        ));
    }
}
