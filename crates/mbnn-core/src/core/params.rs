use crate::core::descriptors::params::{
    AngularFunction, FeatureScale, RadialFunction, SpeciesDescriptor,
};
use crate::core::models::topology::{Topology, TopologyError, TopologyKind};
use crate::core::network::activation::Activation;
use crate::core::network::network::{Layer, Network, NetworkError};
use crate::core::numeric::{Real, real};
use crate::core::switching::{SwitchCombination, SwitchError, SwitchParams, SwitchShape};
use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const DEFAULT_ENERGY_UNIT: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("Invalid switch parameters: {0}")]
    Switch(#[from] SwitchError),
    #[error("Network for species '{species}' in '{path}' is invalid: {source}")]
    Network {
        species: String,
        path: String,
        source: NetworkError,
    },
    #[error("Layer {layer} in '{path}' has rows of unequal length")]
    RaggedWeights { path: String, layer: usize },
    #[error("Model defines no parameters for species '{0}'")]
    MissingSpecies(String),
    #[error("Species '{0}' does not occur in the model topology")]
    UnknownSpecies(String),
    #[error("Species '{species}': descriptor refers to unknown neighbor species '{neighbor}'")]
    UnknownNeighbor { species: String, neighbor: String },
    #[error("Species '{species}': {message}")]
    InvalidParameter { species: String, message: String },
    #[error("Species '{species}': scaling file has {found} rows but the descriptor has {expected} features")]
    ScalingLength {
        species: String,
        expected: usize,
        found: usize,
    },
    #[error("Species '{species}': scaling bounds of feature {feature} are empty (max <= min)")]
    EmptyRange { species: String, feature: usize },
    #[error("Species '{species}': network takes {network} inputs but the descriptor has {descriptor} features")]
    InputDimension {
        species: String,
        descriptor: usize,
        network: usize,
    },
    #[error("Energy unit must be a finite positive number, got {0}")]
    EnergyUnit(f64),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModelManifest {
    pub topology: String,
    #[serde(default = "default_energy_unit")]
    pub energy_unit: f64,
    #[serde(default)]
    pub switch: SwitchSection,
    pub species: HashMap<String, SpeciesSection>,
}

fn default_energy_unit() -> f64 {
    DEFAULT_ENERGY_UNIT
}

/// Overrides of the topology's default switch; unset keys keep the default.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SwitchSection {
    pub function: Option<SwitchShape>,
    pub inner: Option<f64>,
    pub outer: Option<f64>,
    pub combination: Option<SwitchCombination>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpeciesSection {
    pub network: PathBuf,
    pub scaling: Option<PathBuf>,
    #[serde(default)]
    pub radial: Vec<RadialEntry>,
    #[serde(default)]
    pub angular: Vec<AngularEntry>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RadialEntry {
    pub neighbor: String,
    pub cutoff: f64,
    pub eta: f64,
    #[serde(default)]
    pub shift: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AngularEntry {
    pub neighbors: [String; 2],
    pub cutoff: f64,
    pub eta: f64,
    pub zeta: f64,
    pub lambda: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct NetworkFile {
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct LayerEntry {
    #[serde(default)]
    activation: Activation,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
struct ScalingRecord {
    min: f64,
    max: f64,
}

/// Descriptor definition and network of one atom type.
#[derive(Debug, Clone)]
pub struct SpeciesParameters<T: Real> {
    pub label: String,
    pub descriptor: SpeciesDescriptor<T>,
    pub network: Network<T>,
}

/// Everything needed to build an evaluator, in the working precision `T`.
///
/// `species` is indexed by the type index of [`Topology::new`]`(topology)`.
#[derive(Debug, Clone)]
pub struct ModelParameters<T: Real> {
    pub topology: TopologyKind,
    pub energy_unit: f64,
    pub switch: SwitchParams,
    pub species: Vec<SpeciesParameters<T>>,
}

impl<T: Real> ModelParameters<T> {
    /// Loads a model manifest and the network and scaling files it names.
    ///
    /// Relative paths inside the manifest are resolved against its directory.
    pub fn load(manifest_path: &Path) -> Result<Self, ModelLoadError> {
        let manifest = Self::load_manifest(manifest_path)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
        let params = Self::from_manifest(&manifest, base)?;

        info!(
            "Loaded {} model from '{}' ({} species)",
            params.topology,
            manifest_path.display(),
            params.species.len()
        );
        Ok(params)
    }

    fn load_manifest(path: &Path) -> Result<ModelManifest, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ModelLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_manifest(manifest: &ModelManifest, base: &Path) -> Result<Self, ModelLoadError> {
        let kind: TopologyKind = manifest.topology.parse()?;
        let topology = Topology::new(kind);
        let registry = topology.registry();

        if !manifest.energy_unit.is_finite() || manifest.energy_unit <= 0.0 {
            return Err(ModelLoadError::EnergyUnit(manifest.energy_unit));
        }

        if let Some(unknown) = manifest
            .species
            .keys()
            .find(|label| registry.index_of(label).is_none())
        {
            return Err(ModelLoadError::UnknownSpecies(unknown.clone()));
        }

        let defaults = SwitchParams::default_for(kind);
        let switch = SwitchParams {
            shape: manifest.switch.function.unwrap_or(defaults.shape),
            inner: manifest.switch.inner.unwrap_or(defaults.inner),
            outer: manifest.switch.outer.unwrap_or(defaults.outer),
            combination: manifest.switch.combination.unwrap_or(defaults.combination),
        };
        switch.validate()?;

        let species = registry
            .iter()
            .map(|(_, label)| {
                let section = manifest
                    .species
                    .get(label)
                    .ok_or_else(|| ModelLoadError::MissingSpecies(label.to_string()))?;
                Self::load_species(label, section, &topology, base)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            topology: kind,
            energy_unit: manifest.energy_unit,
            switch,
            species,
        })
    }

    fn load_species(
        label: &str,
        section: &SpeciesSection,
        topology: &Topology,
        base: &Path,
    ) -> Result<SpeciesParameters<T>, ModelLoadError> {
        let invalid = |message: String| ModelLoadError::InvalidParameter {
            species: label.to_string(),
            message,
        };
        let type_of = |neighbor: &str| {
            topology
                .registry()
                .index_of(neighbor)
                .ok_or_else(|| ModelLoadError::UnknownNeighbor {
                    species: label.to_string(),
                    neighbor: neighbor.to_string(),
                })
        };

        let mut radial = Vec::with_capacity(section.radial.len());
        for entry in &section.radial {
            if entry.cutoff <= 0.0 || entry.eta < 0.0 {
                return Err(invalid(format!(
                    "radial function needs cutoff > 0 and eta >= 0 (cutoff = {}, eta = {})",
                    entry.cutoff, entry.eta
                )));
            }
            radial.push(RadialFunction {
                neighbor: type_of(&entry.neighbor)?,
                cutoff: real(entry.cutoff),
                eta: real(entry.eta),
                shift: real(entry.shift),
            });
        }

        let mut angular = Vec::with_capacity(section.angular.len());
        for entry in &section.angular {
            if entry.cutoff <= 0.0 || entry.eta < 0.0 || entry.zeta < 1.0 {
                return Err(invalid(format!(
                    "angular function needs cutoff > 0, eta >= 0 and zeta >= 1 (cutoff = {}, eta = {}, zeta = {})",
                    entry.cutoff, entry.eta, entry.zeta
                )));
            }
            if entry.lambda.abs() != 1.0 {
                return Err(invalid(format!(
                    "angular lambda must be +1 or -1, got {}",
                    entry.lambda
                )));
            }
            angular.push(AngularFunction {
                neighbors: (type_of(&entry.neighbors[0])?, type_of(&entry.neighbors[1])?),
                cutoff: real(entry.cutoff),
                eta: real(entry.eta),
                zeta: real(entry.zeta),
                lambda: real(entry.lambda),
            });
        }

        let mut descriptor = SpeciesDescriptor::unscaled(radial, angular);
        if let Some(scaling) = &section.scaling {
            let path = base.join(scaling);
            descriptor.scaling = Self::load_scaling(label, &path, descriptor.dimension())?;
        }

        let network_path = base.join(&section.network);
        let network = Self::load_network(label, &network_path)?;
        if network.input_dim() != descriptor.dimension() {
            return Err(ModelLoadError::InputDimension {
                species: label.to_string(),
                descriptor: descriptor.dimension(),
                network: network.input_dim(),
            });
        }

        Ok(SpeciesParameters {
            label: label.to_string(),
            descriptor,
            network,
        })
    }

    fn load_network(label: &str, path: &Path) -> Result<Network<T>, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: NetworkFile = toml::from_str(&content).map_err(|e| ModelLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut layers = Vec::with_capacity(file.layers.len());
        for (index, entry) in file.layers.iter().enumerate() {
            let rows = entry.weights.len();
            let cols = entry.weights.first().map_or(0, Vec::len);
            if entry.weights.iter().any(|row| row.len() != cols) {
                return Err(ModelLoadError::RaggedWeights {
                    path: path.to_string_lossy().to_string(),
                    layer: index,
                });
            }
            let weights = DMatrix::from_fn(rows, cols, |r, c| real::<T>(entry.weights[r][c]));
            let bias = DVector::from_iterator(
                entry.bias.len(),
                entry.bias.iter().map(|&b| real::<T>(b)),
            );
            layers.push(Layer::new(weights, bias, entry.activation));
        }

        Network::new(layers).map_err(|source| ModelLoadError::Network {
            species: label.to_string(),
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    fn load_scaling(
        label: &str,
        path: &Path,
        dimension: usize,
    ) -> Result<Vec<FeatureScale<T>>, ModelLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ModelLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut scaling = Vec::with_capacity(dimension);
        for (feature, result) in reader.deserialize::<ScalingRecord>().enumerate() {
            let record = result.map_err(|e| ModelLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            let scale = FeatureScale::new(real(record.min), real(record.max)).ok_or_else(|| {
                ModelLoadError::EmptyRange {
                    species: label.to_string(),
                    feature,
                }
            })?;
            scaling.push(scale);
        }

        if scaling.len() != dimension {
            return Err(ModelLoadError::ScalingLength {
                species: label.to_string(),
                expected: dimension,
                found: scaling.len(),
            });
        }
        Ok(scaling)
    }

    /// Feature count of every species, in type order.
    pub fn dimensions(&self) -> Vec<usize> {
        self.species.iter().map(|s| s.descriptor.dimension()).collect()
    }
}
