//! A small deterministic model for tests. No trained weights ship with the
//! crate, so every property is checked against these synthetic parameters.

use crate::core::descriptors::params::{
    AngularFunction, FeatureScale, RadialFunction, SpeciesDescriptor,
};
use crate::core::models::topology::TopologyKind;
use crate::core::network::activation::Activation;
use crate::core::network::network::{Layer, Network};
use crate::core::numeric::{Real, real};
use crate::core::params::{ModelParameters, SpeciesParameters};
use crate::core::switching::SwitchParams;
use nalgebra::{DMatrix, DVector};

pub const ENERGY_UNIT: f64 = 2.5;

const OXYGEN: usize = 0;
const HYDROGEN: usize = 1;

fn radial<T: Real>(neighbor: usize, eta: f64, shift: f64) -> RadialFunction<T> {
    RadialFunction {
        neighbor,
        cutoff: real(7.0),
        eta: real(eta),
        shift: real(shift),
    }
}

fn angular<T: Real>(neighbors: (usize, usize), zeta: f64, lambda: f64) -> AngularFunction<T> {
    AngularFunction {
        neighbors,
        cutoff: real(7.0),
        eta: real(0.02),
        zeta: real(zeta),
        lambda: real(lambda),
    }
}

/// Unscaled descriptors: five features for oxygen, four for hydrogen.
pub fn species_descriptors() -> Vec<SpeciesDescriptor<f64>> {
    species_descriptors_as()
}

pub fn species_descriptors_as<T: Real>() -> Vec<SpeciesDescriptor<T>> {
    vec![
        SpeciesDescriptor::unscaled(
            vec![
                radial(OXYGEN, 0.1, 2.8),
                radial(HYDROGEN, 0.5, 0.9),
                radial(HYDROGEN, 0.3, 2.0),
            ],
            vec![
                angular((HYDROGEN, HYDROGEN), 1.0, 1.0),
                angular((OXYGEN, HYDROGEN), 2.0, -1.0),
            ],
        ),
        SpeciesDescriptor::unscaled(
            vec![radial(OXYGEN, 0.4, 1.0), radial(HYDROGEN, 0.2, 1.5)],
            vec![
                angular((OXYGEN, HYDROGEN), 1.0, -1.0),
                angular((OXYGEN, OXYGEN), 4.0, 1.0),
            ],
        ),
    ]
}

/// A `input_dim → 4 (tanh) → 1 (linear)` network with weights from a fixed formula.
pub fn network<T: Real>(input_dim: usize, salt: f64) -> Network<T> {
    let hidden = Layer::new(
        DMatrix::from_fn(4, input_dim, |r, c| {
            real(0.6 * (1.3 * r as f64 + 0.7 * c as f64 + salt).sin())
        }),
        DVector::from_fn(4, |r, _| real(0.1 * (r as f64 + salt).cos())),
        Activation::Tanh,
    );
    let output = Layer::new(
        DMatrix::from_fn(1, 4, |_, c| real(0.8 * (2.1 * c as f64 - salt).cos())),
        DVector::from_element(1, real(0.05)),
        Activation::Linear,
    );
    Network::new(vec![hidden, output]).unwrap()
}

pub fn model_parameters(kind: TopologyKind) -> ModelParameters<f64> {
    model_parameters_as(kind)
}

/// The synthetic model in working precision `T`.
pub fn model_parameters_as<T: Real>(kind: TopologyKind) -> ModelParameters<T> {
    let labels = ["O", "H"];
    let species = species_descriptors_as::<T>()
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(t, (mut descriptor, label))| {
            descriptor.scaling[0] = FeatureScale::new(real(0.0), real(3.0)).unwrap();
            descriptor.scaling[1] = FeatureScale::new(real(-0.5), real(1.5)).unwrap();
            let network = network(descriptor.dimension(), 0.37 + t as f64);
            SpeciesParameters {
                label: label.to_string(),
                descriptor,
                network,
            }
        })
        .collect();
    ModelParameters {
        topology: kind,
        energy_unit: ENERGY_UNIT,
        switch: SwitchParams::default_for(kind),
        species,
    }
}

fn push(flat: &mut Vec<f64>, origin: [f64; 3], offsets: [[f64; 3]; 2]) {
    flat.extend_from_slice(&origin);
    for offset in offsets {
        flat.extend((0..3).map(|k| origin[k] + offset[k]));
    }
}

/// One dimer configuration (`O H H O H H`) whose O–O distance is `oo`.
pub fn dimer_coordinates(oo: f64) -> Vec<f64> {
    let mut flat = Vec::with_capacity(18);
    push(&mut flat, [0.0, 0.0, 0.0], [[0.757, 0.586, 0.0], [-0.757, 0.586, 0.0]]);
    push(&mut flat, [oo, 0.0, 0.0], [[0.3, -0.2, 0.9], [0.25, -0.85, -0.38]]);
    flat
}

/// One trimer configuration with O–O distances of roughly `oo`.
pub fn trimer_coordinates(oo: f64) -> Vec<f64> {
    let mut flat = dimer_coordinates(oo);
    push(
        &mut flat,
        [0.5 * oo, 0.866 * oo, 0.4],
        [[-0.2, 0.7, 0.6], [0.9, 0.3, -0.1]],
    );
    flat
}
