use crate::core::numeric::Real;
use nalgebra::one;

/// A radial G-function `Σ_j exp(-η (r_ij - r_s)²) · f_c(r_ij)` over neighbors of one type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialFunction<T: Real> {
    /// Type index of the neighbors summed over.
    pub neighbor: usize,
    pub cutoff: T,
    pub eta: T,
    pub shift: T,
}

/// An angular G-function over neighbor pairs of the given types:
///
/// `2^(1-ζ) Σ_{j,k} (1 + λ cos θ_ijk)^ζ · exp(-η (r_ij² + r_ik² + r_jk²)) · f_c(r_ij) f_c(r_ik) f_c(r_jk)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularFunction<T: Real> {
    /// Type indices of the two neighbors. Order does not matter.
    pub neighbors: (usize, usize),
    pub cutoff: T,
    pub eta: T,
    pub zeta: T,
    pub lambda: T,
}

/// Min/max normalization of one descriptor dimension: `(g - min) / (max - min)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScale<T: Real> {
    pub min: T,
    inv_range: T,
}

impl<T: Real> FeatureScale<T> {
    /// Returns `None` unless `max > min`.
    pub fn new(min: T, max: T) -> Option<Self> {
        if max > min {
            Some(Self {
                min,
                inv_range: one::<T>() / (max - min),
            })
        } else {
            None
        }
    }

    pub fn identity() -> Self {
        Self {
            min: nalgebra::zero(),
            inv_range: one(),
        }
    }

    #[inline]
    pub fn apply(&self, raw: T) -> T {
        (raw - self.min) * self.inv_range
    }

    /// `d(scaled)/d(raw)`.
    #[inline]
    pub fn derivative(&self) -> T {
        self.inv_range
    }
}

/// The full descriptor definition for one atom type.
///
/// Feature order is every radial function in list order, then every angular
/// function in list order. `scaling` has one entry per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDescriptor<T: Real> {
    pub radial: Vec<RadialFunction<T>>,
    pub angular: Vec<AngularFunction<T>>,
    pub scaling: Vec<FeatureScale<T>>,
}

impl<T: Real> SpeciesDescriptor<T> {
    /// Creates a descriptor with identity scaling on every feature.
    pub fn unscaled(radial: Vec<RadialFunction<T>>, angular: Vec<AngularFunction<T>>) -> Self {
        let scaling = vec![FeatureScale::identity(); radial.len() + angular.len()];
        Self {
            radial,
            angular,
            scaling,
        }
    }

    /// Number of features produced per atom of this type.
    pub fn dimension(&self) -> usize {
        self.radial.len() + self.angular.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_scale_maps_bounds_to_unit_interval() {
        let scale = FeatureScale::new(2.0, 6.0).unwrap();
        assert_eq!(scale.apply(2.0), 0.0);
        assert_eq!(scale.apply(6.0), 1.0);
        assert_eq!(scale.derivative(), 0.25);
    }

    #[test]
    fn feature_scale_rejects_empty_range() {
        assert!(FeatureScale::new(1.0, 1.0).is_none());
        assert!(FeatureScale::new(2.0, 1.0).is_none());
    }

    #[test]
    fn dimension_counts_radial_and_angular_functions() {
        let radial = vec![
            RadialFunction {
                neighbor: 0,
                cutoff: 6.0,
                eta: 0.1,
                shift: 0.0,
            };
            3
        ];
        let angular = vec![AngularFunction {
            neighbors: (1, 1),
            cutoff: 7.5,
            eta: 0.01,
            zeta: 1.0,
            lambda: -1.0,
        }];
        let descriptor = SpeciesDescriptor::unscaled(radial, angular);
        assert_eq!(descriptor.dimension(), 4);
        assert_eq!(descriptor.scaling.len(), 4);
    }
}
