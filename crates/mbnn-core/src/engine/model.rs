use super::error::EvalError;
use crate::core::descriptors::engine::DescriptorEngine;
use crate::core::models::topology::Topology;
use crate::core::network::network::Network;
use crate::core::numeric::{Real, real};
use crate::core::params::ModelParameters;
use crate::core::switching::SwitchingFunction;
use tracing::info;

/// The immutable, fully resolved potential of one topology.
#[derive(Debug, Clone)]
pub struct Model<T: Real> {
    topology: Topology,
    descriptors: DescriptorEngine<T>,
    /// Indexed by atom type.
    networks: Vec<Network<T>>,
    switching: SwitchingFunction<T>,
    energy_unit: f64,
}

impl<T: Real> Model<T> {
    pub fn new(params: ModelParameters<T>, energy_unit: Option<f64>) -> Result<Self, EvalError> {
        let topology = Topology::new(params.topology);
        let type_count = topology.registry().len();
        if params.species.len() != type_count {
            return Err(EvalError::Configuration(format!(
                "{} topology has {} atom types, but the model defines {} species",
                params.topology,
                type_count,
                params.species.len()
            )));
        }
        for (type_index, species) in params.species.iter().enumerate() {
            let expected = topology.registry().label(type_index).unwrap_or_default();
            if species.label != expected {
                return Err(EvalError::Configuration(format!(
                    "species {} is '{}' but the topology registers '{}' at that index",
                    type_index, species.label, expected
                )));
            }
            if species.network.input_dim() != species.descriptor.dimension() {
                return Err(EvalError::Configuration(format!(
                    "species '{}': network takes {} inputs, descriptor has {} features",
                    species.label,
                    species.network.input_dim(),
                    species.descriptor.dimension()
                )));
            }
        }

        let (descriptors, networks): (Vec<_>, Vec<_>) = params
            .species
            .into_iter()
            .map(|s| (s.descriptor, s.network))
            .unzip();
        let descriptors = DescriptorEngine::new(&topology, descriptors)?;
        let switching = SwitchingFunction::new(&topology, params.switch)
            .map_err(|e| EvalError::Configuration(e.to_string()))?;

        let model = Self {
            topology,
            descriptors,
            networks,
            switching,
            energy_unit: energy_unit.unwrap_or(params.energy_unit),
        };
        info!(
            "Model ready: topology {}, {} atoms, feature dimensions {:?}, energy unit {}",
            model.topology.kind(),
            model.topology.atom_count(),
            model.descriptors.dimensions(),
            model.energy_unit
        );
        Ok(model)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn descriptors(&self) -> &DescriptorEngine<T> {
        &self.descriptors
    }

    pub fn networks(&self) -> &[Network<T>] {
        &self.networks
    }

    /// The network evaluated for atom `atom` of the topology.
    #[inline]
    pub fn network_for_atom(&self, atom: usize) -> &Network<T> {
        &self.networks[self.topology.type_of(atom)]
    }

    pub fn switching(&self) -> &SwitchingFunction<T> {
        &self.switching
    }

    pub fn energy_unit(&self) -> f64 {
        self.energy_unit
    }

    pub(crate) fn energy_unit_real(&self) -> T {
        real(self.energy_unit)
    }
}
