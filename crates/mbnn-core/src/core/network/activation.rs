use crate::core::numeric::Real;
use nalgebra::{one, zero};
use serde::Deserialize;
use std::fmt;

/// Element-wise transfer function applied after a layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activation {
    #[default]
    Tanh,
    Sigmoid,
    Softplus,
    Linear,
}

impl Activation {
    #[inline]
    pub fn apply<T: Real>(self, z: T) -> T {
        match self {
            Self::Tanh => z.tanh(),
            Self::Sigmoid => sigmoid(z),
            // ln(1 + e^z) without overflow for large z.
            Self::Softplus => z.max(zero()) + (one::<T>() + (-z.abs()).exp()).ln(),
            Self::Linear => z,
        }
    }

    /// Slope at pre-activation `z`, given the already computed output `a = apply(z)`.
    #[inline]
    pub fn derivative<T: Real>(self, z: T, a: T) -> T {
        match self {
            Self::Tanh => one::<T>() - a * a,
            Self::Sigmoid => a * (one::<T>() - a),
            Self::Softplus => sigmoid(z),
            Self::Linear => one(),
        }
    }
}

#[inline]
fn sigmoid<T: Real>(z: T) -> T {
    one::<T>() / (one::<T>() + (-z).exp())
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::Softplus => "softplus",
            Self::Linear => "linear",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Activation; 4] = [
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::Softplus,
        Activation::Linear,
    ];

    #[test]
    fn derivatives_match_central_difference() {
        let step = 1e-6f64;
        for activation in ALL {
            for &z in &[-3.0f64, -0.4, 0.0, 0.7, 2.5] {
                let numeric =
                    (activation.apply(z + step) - activation.apply(z - step)) / (2.0 * step);
                let analytic = activation.derivative(z, activation.apply(z));
                assert!(
                    (numeric - analytic).abs() < 1e-8,
                    "{} at {}: {} vs {}",
                    activation,
                    z,
                    numeric,
                    analytic
                );
            }
        }
    }

    #[test]
    fn softplus_stays_finite_for_large_inputs() {
        let value: f64 = Activation::Softplus.apply(800.0);
        assert!((value - 800.0).abs() < 1e-12);
        assert!(Activation::Softplus.apply(-800.0f64) >= 0.0);
    }

    #[test]
    fn activations_deserialize_from_kebab_case_names() {
        #[derive(Deserialize)]
        struct Holder {
            activation: Activation,
        }
        let holder: Holder = toml::from_str(r#"activation = "softplus""#).unwrap();
        assert_eq!(holder.activation, Activation::Softplus);
    }
}
