use crate::core::models::gradient::GradientTensor;
use crate::core::numeric::Real;
use std::fmt;

/// Progress of one evaluation session.
///
/// Stages advance strictly in declaration order. The two gradient stages are
/// skipped when only the energy is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Idle,
    DescriptorsBuilt,
    ForwardDone,
    SwitchComputed,
    BackwardDone,
    GradientAssembled,
    EnergyReady,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::DescriptorsBuilt => "DescriptorsBuilt",
            Self::ForwardDone => "ForwardDone",
            Self::SwitchComputed => "SwitchComputed",
            Self::BackwardDone => "BackwardDone",
            Self::GradientAssembled => "GradientAssembled",
            Self::EnergyReady => "EnergyReady",
        };
        write!(f, "{}", name)
    }
}

/// Result of evaluating one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<T: Real> {
    /// Sum of the switched cluster energies, in output units.
    pub energy: T,
    /// Switched energy of every configuration, in output units.
    pub cluster_energies: Vec<T>,
    /// Unswitched network energy of every configuration, in network units.
    pub raw_energies: Vec<T>,
    pub switch_factors: Vec<T>,
    /// `∂energy/∂x`, present only when requested.
    pub gradient: Option<GradientTensor<T>>,
}

impl<T: Real> Evaluation<T> {
    pub fn cluster_count(&self) -> usize {
        self.cluster_energies.len()
    }
}
