use super::functions::{angular, radial};
use super::params::SpeciesDescriptor;
use crate::core::models::configuration::Configurations;
use crate::core::models::gradient::GradientTensor;
use crate::core::models::topology::Topology;
use crate::core::numeric::{Real, real};
use nalgebra::{DMatrix, Point3, Vector3, zero};
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Atoms closer than this (Å) are treated as a malformed configuration.
const MIN_DISTANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum DescriptorError {
    #[error("No descriptor parameters for atom type '{label}'")]
    MissingSpecies { label: String },
    #[error("Descriptor function refers to unknown neighbor type index {0}")]
    UnknownNeighborType(usize),
    #[error("Expected {expected} atoms per configuration, found {found}")]
    AtomCount { expected: usize, found: usize },
    #[error("Atoms {first} and {second} overlap in configuration {cluster}")]
    OverlappingAtoms {
        cluster: usize,
        first: usize,
        second: usize,
    },
    #[error("Descriptor gradient for atom {atom} has shape {found:?}, expected {expected:?}")]
    GradientShape {
        atom: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Neighbor lists of one centre atom, resolved once against the topology.
#[derive(Debug, Clone)]
struct AtomPlan {
    species: usize,
    /// For each radial function, the neighbor atoms it sums over.
    radial: Vec<Vec<usize>>,
    /// For each angular function, the unordered neighbor pairs it sums over.
    angular: Vec<Vec<(usize, usize)>>,
}

/// Generates G-function descriptors for every atom of every configuration and
/// contracts descriptor gradients back onto Cartesian coordinates.
///
/// The engine is bound to one topology: neighbor lists are resolved at
/// construction, so evaluation only touches coordinates. Descriptors are
/// sums over neighbors of a given type, which makes them invariant under
/// rigid motions and under exchange of chemically identical atoms.
#[derive(Debug, Clone)]
pub struct DescriptorEngine<T: Real> {
    species: Vec<SpeciesDescriptor<T>>,
    plans: Vec<AtomPlan>,
}

impl<T: Real> DescriptorEngine<T> {
    /// `species[t]` is the descriptor definition of atom type `t` of the topology's registry.
    pub fn new(
        topology: &Topology,
        species: Vec<SpeciesDescriptor<T>>,
    ) -> Result<Self, DescriptorError> {
        let registry = topology.registry();
        if let Some((_, label)) = registry.iter().find(|(t, _)| *t >= species.len()) {
            return Err(DescriptorError::MissingSpecies {
                label: label.to_string(),
            });
        }

        let by_type = topology.atoms_by_type();
        let neighbors_of = |center: usize, neighbor_type: usize| {
            by_type
                .get(neighbor_type)
                .map(|atoms| atoms.iter().copied().filter(|&j| j != center).collect::<Vec<_>>())
                .ok_or(DescriptorError::UnknownNeighborType(neighbor_type))
        };

        let mut plans = Vec::with_capacity(topology.atom_count());
        for (center, atom) in topology.atoms().iter().enumerate() {
            let descriptor = &species[atom.type_index];

            let radial = descriptor
                .radial
                .iter()
                .map(|f| neighbors_of(center, f.neighbor))
                .collect::<Result<Vec<_>, _>>()?;

            let angular = descriptor
                .angular
                .iter()
                .map(|f| -> Result<Vec<(usize, usize)>, DescriptorError> {
                    let (t1, t2) = f.neighbors;
                    let first = neighbors_of(center, t1)?;
                    let second = neighbors_of(center, t2)?;
                    let mut pairs = Vec::new();
                    for &j in &first {
                        for &k in &second {
                            if j == k || (t1 == t2 && k < j) {
                                continue;
                            }
                            pairs.push((j, k));
                        }
                    }
                    Ok(pairs)
                })
                .collect::<Result<Vec<_>, _>>()?;

            plans.push(AtomPlan {
                species: atom.type_index,
                radial,
                angular,
            });
        }

        debug!(
            "Descriptor engine ready: {} atoms, feature dimensions per type {:?}",
            plans.len(),
            species.iter().map(SpeciesDescriptor::dimension).collect::<Vec<_>>()
        );

        Ok(Self { species, plans })
    }

    pub fn atom_count(&self) -> usize {
        self.plans.len()
    }

    /// Feature count of atom type `type_index`.
    pub fn dimension(&self, type_index: usize) -> usize {
        self.species[type_index].dimension()
    }

    /// Feature count of every atom type, indexed by type.
    pub fn dimensions(&self) -> Vec<usize> {
        self.species.iter().map(SpeciesDescriptor::dimension).collect()
    }

    pub fn species(&self) -> &[SpeciesDescriptor<T>] {
        &self.species
    }

    /// Builds one `[dimension × NCLUSTER]` descriptor matrix per atom.
    ///
    /// Column `c` of every matrix describes configuration `c` of `frames`.
    pub fn compute(
        &self,
        frames: &Configurations<T>,
    ) -> Result<Vec<DMatrix<T>>, DescriptorError> {
        self.check_layout(frames)?;
        let n = frames.cluster_count();

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..n;

        #[cfg(feature = "parallel")]
        let iterator = (0..n).into_par_iter();

        let per_cluster: Vec<Vec<Vec<T>>> = iterator
            .map(|c| self.frame_features(c, frames.frame(c)))
            .collect::<Result<_, _>>()?;

        Ok(self
            .plans
            .iter()
            .enumerate()
            .map(|(atom, plan)| {
                let dim = self.species[plan.species].dimension();
                DMatrix::from_fn(dim, n, |f, c| per_cluster[c][atom][f])
            })
            .collect())
    }

    /// Contracts `∂E/∂G` (one `[dimension × NCLUSTER]` matrix per atom, in scaled
    /// descriptor space) with the descriptor Jacobian, yielding `∂E/∂x`.
    pub fn contract(
        &self,
        frames: &Configurations<T>,
        dfdg: &[DMatrix<T>],
    ) -> Result<GradientTensor<T>, DescriptorError> {
        self.check_layout(frames)?;
        let n = frames.cluster_count();
        if dfdg.len() != self.plans.len() {
            return Err(DescriptorError::AtomCount {
                expected: self.plans.len(),
                found: dfdg.len(),
            });
        }
        for (atom, (plan, matrix)) in self.plans.iter().zip(dfdg).enumerate() {
            let expected = (self.species[plan.species].dimension(), n);
            if matrix.shape() != expected {
                return Err(DescriptorError::GradientShape {
                    atom,
                    expected,
                    found: matrix.shape(),
                });
            }
        }

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..n;

        #[cfg(feature = "parallel")]
        let iterator = (0..n).into_par_iter();

        let per_cluster: Vec<Vec<Vector3<T>>> = iterator
            .map(|c| self.frame_gradient(c, frames.frame(c), dfdg))
            .collect::<Result<_, _>>()?;

        let mut gradient = GradientTensor::zeros(self.plans.len(), n);
        for (c, per_atom) in per_cluster.iter().enumerate() {
            gradient.add_cluster(c, per_atom);
        }
        Ok(gradient)
    }

    fn check_layout(&self, frames: &Configurations<T>) -> Result<(), DescriptorError> {
        if frames.atom_count() != self.plans.len() {
            return Err(DescriptorError::AtomCount {
                expected: self.plans.len(),
                found: frames.atom_count(),
            });
        }
        Ok(())
    }

    fn distance_matrix(
        &self,
        cluster: usize,
        frame: &[Point3<T>],
    ) -> Result<DMatrix<T>, DescriptorError> {
        let natom = frame.len();
        let min_distance: T = real(MIN_DISTANCE);
        let mut distances = DMatrix::zeros(natom, natom);
        for i in 0..natom {
            for j in (i + 1)..natom {
                let r = nalgebra::distance(&frame[i], &frame[j]);
                if r < min_distance {
                    return Err(DescriptorError::OverlappingAtoms {
                        cluster,
                        first: i,
                        second: j,
                    });
                }
                distances[(i, j)] = r;
                distances[(j, i)] = r;
            }
        }
        Ok(distances)
    }

    fn frame_features(
        &self,
        cluster: usize,
        frame: &[Point3<T>],
    ) -> Result<Vec<Vec<T>>, DescriptorError> {
        let d = self.distance_matrix(cluster, frame)?;

        Ok(self
            .plans
            .iter()
            .enumerate()
            .map(|(i, plan)| {
                let descriptor = &self.species[plan.species];
                let mut features = Vec::with_capacity(descriptor.dimension());

                for (f, neighbors) in descriptor.radial.iter().zip(&plan.radial) {
                    let g = neighbors
                        .iter()
                        .fold(zero::<T>(), |acc, &j| acc + radial(d[(i, j)], f).0);
                    features.push(g);
                }
                for (f, pairs) in descriptor.angular.iter().zip(&plan.angular) {
                    let g = pairs.iter().fold(zero::<T>(), |acc, &(j, k)| {
                        acc + angular(d[(i, j)], d[(i, k)], d[(j, k)], f).0
                    });
                    features.push(g);
                }

                features
                    .iter()
                    .zip(&descriptor.scaling)
                    .map(|(&g, scale)| scale.apply(g))
                    .collect()
            })
            .collect())
    }

    fn frame_gradient(
        &self,
        cluster: usize,
        frame: &[Point3<T>],
        dfdg: &[DMatrix<T>],
    ) -> Result<Vec<Vector3<T>>, DescriptorError> {
        let d = self.distance_matrix(cluster, frame)?;
        let unit = |a: usize, b: usize| (frame[a] - frame[b]) / d[(a, b)];
        let mut grad = vec![Vector3::zeros(); frame.len()];

        for (i, plan) in self.plans.iter().enumerate() {
            let descriptor = &self.species[plan.species];
            let seeds = dfdg[i].column(cluster);
            let radial_count = descriptor.radial.len();

            for (f, (func, neighbors)) in descriptor.radial.iter().zip(&plan.radial).enumerate() {
                let weight = seeds[f] * descriptor.scaling[f].derivative();
                if weight == zero() {
                    continue;
                }
                for &j in neighbors {
                    let (_, dr) = radial(d[(i, j)], func);
                    let contribution = unit(i, j) * (weight * dr);
                    grad[i] += contribution;
                    grad[j] -= contribution;
                }
            }

            for (a, (func, pairs)) in descriptor.angular.iter().zip(&plan.angular).enumerate() {
                let f = radial_count + a;
                let weight = seeds[f] * descriptor.scaling[f].derivative();
                if weight == zero() {
                    continue;
                }
                for &(j, k) in pairs {
                    let (_, [d_ij, d_ik, d_jk]) = angular(d[(i, j)], d[(i, k)], d[(j, k)], func);
                    let u_ij = unit(i, j) * (weight * d_ij);
                    let u_ik = unit(i, k) * (weight * d_ik);
                    let u_jk = unit(j, k) * (weight * d_jk);
                    grad[i] += u_ij + u_ik;
                    grad[j] += u_jk - u_ij;
                    grad[k] -= u_ik + u_jk;
                }
            }
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptors::params::{AngularFunction, FeatureScale, RadialFunction};
    use crate::core::models::topology::TopologyKind;
    use crate::test_utils;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Translation3};

    fn engine() -> DescriptorEngine<f64> {
        let topology = Topology::new(TopologyKind::Dimer);
        DescriptorEngine::new(&topology, test_utils::species_descriptors()).unwrap()
    }

    fn dimer_frames() -> Configurations<f64> {
        Configurations::from_flat(6, &test_utils::dimer_coordinates(5.2)).unwrap()
    }

    #[test]
    fn new_fails_when_a_type_has_no_descriptor() {
        let topology = Topology::new(TopologyKind::Dimer);
        let mut species = test_utils::species_descriptors();
        species.truncate(1);
        let result = DescriptorEngine::new(&topology, species);
        assert_eq!(
            result.err(),
            Some(DescriptorError::MissingSpecies {
                label: "H".to_string()
            })
        );
    }

    #[test]
    fn new_fails_for_unknown_neighbor_type() {
        let topology = Topology::new(TopologyKind::Dimer);
        let mut species = test_utils::species_descriptors();
        species[0].radial[0].neighbor = 7;
        let result = DescriptorEngine::new(&topology, species);
        assert_eq!(result.err(), Some(DescriptorError::UnknownNeighborType(7)));
    }

    #[test]
    fn compute_returns_one_matrix_per_atom_with_type_dimension() {
        let engine = engine();
        let frames = dimer_frames();
        let g = engine.compute(&frames).unwrap();
        assert_eq!(g.len(), 6);
        assert_eq!(g[0].shape(), (engine.dimension(0), 1));
        assert_eq!(g[1].shape(), (engine.dimension(1), 1));
    }

    #[test]
    fn compute_rejects_wrong_atom_count() {
        let engine = engine();
        let flat = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let frames = Configurations::from_flat(3, &flat).unwrap();
        assert_eq!(
            engine.compute(&frames).err(),
            Some(DescriptorError::AtomCount {
                expected: 6,
                found: 3
            })
        );
    }

    #[test]
    fn compute_rejects_overlapping_atoms() {
        let engine = engine();
        let mut flat = test_utils::dimer_coordinates(5.2);
        let oxygen = [flat[0], flat[1], flat[2]];
        flat[3..6].copy_from_slice(&oxygen);
        let frames = Configurations::from_flat(6, &flat).unwrap();
        assert!(matches!(
            engine.compute(&frames),
            Err(DescriptorError::OverlappingAtoms {
                cluster: 0,
                first: 0,
                second: 1
            })
        ));
    }

    #[test]
    fn descriptors_are_invariant_under_rigid_motion() {
        let engine = engine();
        let frames = dimer_frames();
        let rotation = Rotation3::from_euler_angles(0.3, -1.1, 2.0);
        let translation = Translation3::new(1.5, -3.0, 0.25);
        let moved = frames.map_positions(|p| translation * (rotation * p));

        let g = engine.compute(&frames).unwrap();
        let g_moved = engine.compute(&moved).unwrap();
        for (a, b) in g.iter().zip(&g_moved) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-10, max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn descriptors_are_invariant_under_hydrogen_exchange() {
        let engine = engine();
        let flat = test_utils::dimer_coordinates(5.2);
        let mut swapped = flat.clone();
        swapped[3..6].copy_from_slice(&flat[6..9]);
        swapped[6..9].copy_from_slice(&flat[3..6]);

        let g = engine.compute(&dimer_frames()).unwrap();
        let g_swapped = engine
            .compute(&Configurations::from_flat(6, &swapped).unwrap())
            .unwrap();
        for (a, b) in [(0, 0), (3, 3), (1, 2), (2, 1), (4, 4)] {
            for (x, y) in g[a].iter().zip(g_swapped[b].iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn features_of_far_neighbors_saturate_without_error() {
        let engine = engine();
        let frames = Configurations::from_flat(6, &test_utils::dimer_coordinates(40.0)).unwrap();
        let g = engine.compute(&frames).unwrap();
        assert!(g.iter().all(|m| m.iter().all(|x| x.is_finite())));
    }

    #[test]
    fn scaling_is_applied_per_feature() {
        let topology = Topology::new(TopologyKind::Dimer);
        let unscaled = DescriptorEngine::new(&topology, test_utils::species_descriptors()).unwrap();
        let mut species = test_utils::species_descriptors();
        species[0].scaling[0] = FeatureScale::new(0.5, 2.5).unwrap();
        let scaled = DescriptorEngine::new(&topology, species).unwrap();

        let frames = dimer_frames();
        let raw = unscaled.compute(&frames).unwrap()[0][(0, 0)];
        let normalized = scaled.compute(&frames).unwrap()[0][(0, 0)];
        assert_relative_eq!(normalized, (raw - 0.5) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn contract_matches_finite_difference_of_weighted_descriptor_sum() {
        let engine = engine();
        let flat = test_utils::dimer_coordinates(4.1);
        let frames = Configurations::from_flat(6, &flat).unwrap();

        // Arbitrary fixed weights w: the scalar S = Σ w · G has ∂S/∂G = w.
        let weights: Vec<DMatrix<f64>> = (0..6)
            .map(|atom| {
                let dim = engine.dimension(frames_type(atom));
                DMatrix::from_fn(dim, 1, |f, _| ((atom * 7 + f * 3) as f64 * 0.37).sin())
            })
            .collect();
        let weighted_sum = |flat: &[f64]| -> f64 {
            let g = engine
                .compute(&Configurations::from_flat(6, flat).unwrap())
                .unwrap();
            g.iter().zip(&weights).map(|(g, w)| g.dot(w)).sum()
        };

        let gradient = engine.contract(&frames, &weights).unwrap();
        let analytic = gradient.to_flat();
        let step = 1e-5;
        for x in 0..flat.len() {
            let mut plus = flat.clone();
            let mut minus = flat.clone();
            plus[x] += step;
            minus[x] -= step;
            let numeric = (weighted_sum(&plus) - weighted_sum(&minus)) / (2.0 * step);
            assert!(
                (numeric - analytic[x]).abs() < 1e-6 * analytic[x].abs().max(1.0),
                "coordinate {}: numeric {} vs analytic {}",
                x,
                numeric,
                analytic[x]
            );
        }
    }

    #[test]
    fn contract_rejects_wrongly_shaped_gradient() {
        let engine = engine();
        let frames = dimer_frames();
        let bad: Vec<DMatrix<f64>> = (0..6).map(|_| DMatrix::zeros(1, 1)).collect();
        assert!(matches!(
            engine.contract(&frames, &bad),
            Err(DescriptorError::GradientShape { atom: 0, .. })
        ));
    }

    #[test]
    fn angular_pairs_of_same_type_are_unordered() {
        let topology = Topology::new(TopologyKind::Dimer);
        let species = vec![
            SpeciesDescriptor::unscaled(
                vec![],
                vec![AngularFunction {
                    neighbors: (1, 1),
                    cutoff: 8.0,
                    eta: 0.01,
                    zeta: 1.0,
                    lambda: 1.0,
                }],
            ),
            SpeciesDescriptor::unscaled(
                vec![RadialFunction {
                    neighbor: 0,
                    cutoff: 8.0,
                    eta: 0.1,
                    shift: 0.0,
                }],
                vec![],
            ),
        ];
        let engine = DescriptorEngine::new(&topology, species).unwrap();
        // Oxygen 0 sees hydrogens 1, 2, 4, 5: C(4, 2) = 6 pairs.
        assert_eq!(engine.plans[0].angular[0].len(), 6);
        assert_eq!(engine.plans[1].radial[0], vec![0, 3]);
    }

    fn frames_type(atom: usize) -> usize {
        if atom % 3 == 0 { 0 } else { 1 }
    }
}
