use thiserror::Error;

use super::state::Stage;
use crate::core::descriptors::engine::DescriptorError;
use crate::core::io::xyz::XyzError;
use crate::core::models::configuration::LayoutError;
use crate::core::models::topology::TopologyError;
use crate::core::network::network::NetworkError;
use crate::core::params::ModelLoadError;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Malformed coordinate layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("Atom labels do not match the model topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Descriptor evaluation failed: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Network evaluation failed: {0}")]
    Network(NetworkError),

    #[error("Backward pass requested without a matching forward pass")]
    StaleGradientState,

    #[error("'{operation}' requires stage {expected}, but the session is at {found}")]
    PreconditionViolation {
        operation: &'static str,
        expected: Stage,
        found: Stage,
    },

    #[error("Failed to load model: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Failed to read coordinate file '{path}': {source}")]
    CoordinateFile {
        path: String,
        #[source]
        source: XyzError,
    },
}

impl From<NetworkError> for EvalError {
    fn from(error: NetworkError) -> Self {
        match error {
            NetworkError::StaleForwardPass => Self::StaleGradientState,
            other => Self::Network(other),
        }
    }
}

impl EvalError {
    /// True for errors caused by malformed or inconsistent input geometry or labels.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Layout(_)
                | Self::Topology(_)
                | Self::Descriptor(_)
                | Self::CoordinateFile { .. }
        )
    }
}
