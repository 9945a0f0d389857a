use crate::core::numeric::Real;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("A batch must contain at least one configuration")]
    EmptyBatch,
    #[error("A configuration must contain at least one atom")]
    NoAtoms,
    #[error("{len} values cannot be split evenly into groups of {group_size}")]
    NotDivisible { len: usize, group_size: usize },
    #[error("Expected {expected} atoms per configuration, found {found}")]
    AtomCount { expected: usize, found: usize },
    #[error("Configuration index {index} is out of range for a batch of {count}")]
    ClusterIndex { index: usize, count: usize },
}

/// A batch of `NCLUSTER` configurations that share one atom layout.
///
/// Positions are stored configuration-major: the `atom_count` positions of
/// configuration 0, then those of configuration 1, and so on. Column `c` of
/// every descriptor, energy and gradient buffer refers to configuration `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Configurations<T: Real> {
    atom_count: usize,
    positions: Vec<Point3<T>>,
}

impl<T: Real> Configurations<T> {
    pub fn new(atom_count: usize, positions: Vec<Point3<T>>) -> Result<Self, LayoutError> {
        if atom_count == 0 {
            return Err(LayoutError::NoAtoms);
        }
        if positions.is_empty() {
            return Err(LayoutError::EmptyBatch);
        }
        if positions.len() % atom_count != 0 {
            return Err(LayoutError::NotDivisible {
                len: positions.len(),
                group_size: atom_count,
            });
        }
        Ok(Self {
            atom_count,
            positions,
        })
    }

    /// Builds a batch from a flat `[x0, y0, z0, x1, ...]` buffer.
    pub fn from_flat(atom_count: usize, flat: &[T]) -> Result<Self, LayoutError> {
        if flat.len() % 3 != 0 {
            return Err(LayoutError::NotDivisible {
                len: flat.len(),
                group_size: 3,
            });
        }
        let positions = flat
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
            .collect();
        Self::new(atom_count, positions)
    }

    /// Interleaves two per-molecule coordinate buffers into one batch.
    ///
    /// `xyz_a` holds `cluster_count` consecutive blocks of molecule A's atoms and
    /// `xyz_b` the same for molecule B. Each configuration of the result lists
    /// molecule A's atoms followed by molecule B's. Returns the batch together
    /// with the per-configuration atom counts of A and B.
    pub fn from_molecule_pair(
        cluster_count: usize,
        xyz_a: &[T],
        xyz_b: &[T],
    ) -> Result<(Self, usize, usize), LayoutError> {
        if cluster_count == 0 {
            return Err(LayoutError::EmptyBatch);
        }
        let atoms_a = Self::atoms_per_cluster(cluster_count, xyz_a)?;
        let atoms_b = Self::atoms_per_cluster(cluster_count, xyz_b)?;

        let mut positions = Vec::with_capacity(cluster_count * (atoms_a + atoms_b));
        for (block_a, block_b) in xyz_a
            .chunks_exact(3 * atoms_a)
            .zip(xyz_b.chunks_exact(3 * atoms_b))
        {
            for xyz in block_a.chunks_exact(3).chain(block_b.chunks_exact(3)) {
                positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
            }
        }
        Ok((Self::new(atoms_a + atoms_b, positions)?, atoms_a, atoms_b))
    }

    fn atoms_per_cluster(cluster_count: usize, xyz: &[T]) -> Result<usize, LayoutError> {
        if xyz.is_empty() || xyz.len() % (3 * cluster_count) != 0 {
            return Err(LayoutError::NotDivisible {
                len: xyz.len(),
                group_size: 3 * cluster_count,
            });
        }
        Ok(xyz.len() / (3 * cluster_count))
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn cluster_count(&self) -> usize {
        self.positions.len() / self.atom_count
    }

    /// Positions of configuration `cluster`.
    #[inline]
    pub fn frame(&self, cluster: usize) -> &[Point3<T>] {
        let start = cluster * self.atom_count;
        &self.positions[start..start + self.atom_count]
    }

    pub fn frames(&self) -> impl Iterator<Item = &[Point3<T>]> {
        self.positions.chunks_exact(self.atom_count)
    }

    /// Checks the per-configuration atom count against a model layout.
    pub fn expect_atom_count(&self, expected: usize) -> Result<(), LayoutError> {
        if self.atom_count != expected {
            return Err(LayoutError::AtomCount {
                expected,
                found: self.atom_count,
            });
        }
        Ok(())
    }

    /// Returns a new batch made of the selected configurations, in the given order.
    pub fn select(&self, clusters: &[usize]) -> Result<Self, LayoutError> {
        let count = self.cluster_count();
        if let Some(&index) = clusters.iter().find(|&&c| c >= count) {
            return Err(LayoutError::ClusterIndex { index, count });
        }
        let positions = clusters
            .iter()
            .flat_map(|&c| self.frame(c).iter().copied())
            .collect();
        Self::new(self.atom_count, positions)
    }

    /// Applies `f` to every position of every configuration.
    pub fn map_positions<F>(&self, f: F) -> Self
    where
        F: Fn(&Point3<T>) -> Point3<T>,
    {
        Self {
            atom_count: self.atom_count,
            positions: self.positions.iter().map(f).collect(),
        }
    }
}

/// A batch together with the per-atom labels its configurations were read with.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledBatch<T: Real> {
    pub labels: Vec<String>,
    pub configurations: Configurations<T>,
}

impl<T: Real> LabelledBatch<T> {
    pub fn new(labels: Vec<String>, configurations: Configurations<T>) -> Result<Self, LayoutError> {
        if labels.len() != configurations.atom_count() {
            return Err(LayoutError::AtomCount {
                expected: configurations.atom_count(),
                found: labels.len(),
            });
        }
        Ok(Self {
            labels,
            configurations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_groups_coordinates_by_configuration() {
        let flat: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let frames = Configurations::from_flat(2, &flat).unwrap();
        assert_eq!(frames.cluster_count(), 2);
        assert_eq!(frames.frame(1)[0], Point3::new(6.0, 7.0, 8.0));
    }

    #[test]
    fn from_flat_rejects_partial_triples() {
        let result = Configurations::<f64>::from_flat(1, &[0.0, 1.0]);
        assert!(matches!(result, Err(LayoutError::NotDivisible { .. })));
    }

    #[test]
    fn new_rejects_positions_not_filling_whole_configurations() {
        let positions = vec![Point3::origin(); 5];
        let result = Configurations::<f64>::new(3, positions);
        assert!(matches!(result, Err(LayoutError::NotDivisible { .. })));
    }

    #[test]
    fn new_rejects_empty_batch() {
        let result = Configurations::<f64>::new(3, Vec::new());
        assert_eq!(result, Err(LayoutError::EmptyBatch));
    }

    #[test]
    fn from_molecule_pair_interleaves_molecules_per_configuration() {
        let xyz_a: Vec<f64> = vec![
            1.0, 1.0, 1.0, // cluster 0, atom A0
            2.0, 2.0, 2.0, // cluster 1, atom A0
        ];
        let xyz_b: Vec<f64> = vec![
            10.0, 10.0, 10.0, 11.0, 11.0, 11.0, // cluster 0
            20.0, 20.0, 20.0, 21.0, 21.0, 21.0, // cluster 1
        ];
        let (frames, a, b) = Configurations::from_molecule_pair(2, &xyz_a, &xyz_b).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(frames.atom_count(), 3);
        let xs: Vec<f64> = frames.frame(1).iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 20.0, 21.0]);
    }

    #[test]
    fn from_molecule_pair_rejects_buffer_not_matching_cluster_count() {
        let result = Configurations::<f64>::from_molecule_pair(2, &[0.0; 9], &[0.0; 18]);
        assert!(matches!(result, Err(LayoutError::NotDivisible { .. })));
    }

    #[test]
    fn expect_atom_count_reports_mismatch() {
        let frames = Configurations::from_flat(2, &[0.0f64; 6]).unwrap();
        assert_eq!(
            frames.expect_atom_count(6),
            Err(LayoutError::AtomCount {
                expected: 6,
                found: 2
            })
        );
    }

    #[test]
    fn labelled_batch_requires_one_label_per_atom() {
        let frames = Configurations::from_flat(2, &[0.0f64; 6]).unwrap();
        let result = LabelledBatch::new(vec!["O".to_string()], frames);
        assert!(matches!(result, Err(LayoutError::AtomCount { .. })));
    }

    #[test]
    fn select_reorders_configurations() {
        let flat: Vec<f64> = (0..9).map(|v| v as f64).collect();
        let frames = Configurations::from_flat(1, &flat).unwrap();
        let picked = frames.select(&[2, 0]).unwrap();
        assert_eq!(picked.cluster_count(), 2);
        assert_eq!(picked.frame(0)[0], Point3::new(6.0, 7.0, 8.0));
        assert_eq!(picked.frame(1)[0], Point3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn select_rejects_out_of_range_configuration() {
        let frames = Configurations::from_flat(1, &[0.0f64; 6]).unwrap();
        assert_eq!(
            frames.select(&[1, 2]),
            Err(LayoutError::ClusterIndex { index: 2, count: 2 })
        );
    }
}
