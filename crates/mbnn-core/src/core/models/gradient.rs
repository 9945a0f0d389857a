use crate::core::numeric::Real;
use nalgebra::{DMatrix, Vector3};

/// Cartesian energy gradient of a batch, shaped `[3·NATOM × NCLUSTER]`.
///
/// Row `3·i + k` holds `∂E/∂x_{i,k}` of atom `i` along axis `k`; column `c`
/// belongs to configuration `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientTensor<T: Real> {
    atom_count: usize,
    data: DMatrix<T>,
}

impl<T: Real> GradientTensor<T> {
    pub fn zeros(atom_count: usize, cluster_count: usize) -> Self {
        Self {
            atom_count,
            data: DMatrix::zeros(3 * atom_count, cluster_count),
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn cluster_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.data
    }

    #[inline]
    pub fn atom(&self, cluster: usize, atom: usize) -> Vector3<T> {
        let row = 3 * atom;
        Vector3::new(
            self.data[(row, cluster)],
            self.data[(row + 1, cluster)],
            self.data[(row + 2, cluster)],
        )
    }

    #[inline]
    pub fn add_to_atom(&mut self, cluster: usize, atom: usize, value: &Vector3<T>) {
        let row = 3 * atom;
        for k in 0..3 {
            self.data[(row + k, cluster)] += value[k];
        }
    }

    /// Adds a whole configuration's per-atom gradient into column `cluster`.
    pub fn add_cluster(&mut self, cluster: usize, per_atom: &[Vector3<T>]) {
        debug_assert_eq!(per_atom.len(), self.atom_count);
        for (atom, value) in per_atom.iter().enumerate() {
            self.add_to_atom(cluster, atom, value);
        }
    }

    pub fn scale_mut(&mut self, factor: T) {
        self.data *= factor;
    }

    /// Flattens to `[c0: x0 y0 z0 x1 ..., c1: ...]`, the layout coordinates come in.
    pub fn to_flat(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    /// Splits every configuration after its first `atoms_first` atoms and
    /// returns the two flattened halves.
    pub fn split_at_atom(&self, atoms_first: usize) -> (Vec<T>, Vec<T>) {
        let mut first = Vec::with_capacity(3 * atoms_first * self.cluster_count());
        let mut second =
            Vec::with_capacity(3 * (self.atom_count - atoms_first) * self.cluster_count());
        for column in self.data.as_slice().chunks_exact(3 * self.atom_count) {
            let (head, tail) = column.split_at(3 * atoms_first);
            first.extend_from_slice(head);
            second.extend_from_slice(tail);
        }
        (first, second)
    }
}
