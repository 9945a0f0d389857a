use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// What to do when caller-supplied atom labels disagree with the model topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPolicy {
    /// Reject the call with a configuration error.
    #[default]
    Strict,
    /// Log a warning and evaluate with the topology's canonical labels.
    Lenient,
}

impl FromStr for LabelPolicy {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::InvalidValue {
                name: "label_policy",
                reason: format!("'{}' is neither 'strict' nor 'lenient'", s),
            }),
        }
    }
}

impl fmt::Display for LabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationConfig {
    pub label_policy: LabelPolicy,
    /// Replaces the model's energy unit conversion factor when set.
    pub energy_unit: Option<f64>,
}

#[derive(Default)]
pub struct EvaluationConfigBuilder {
    label_policy: Option<LabelPolicy>,
    energy_unit: Option<f64>,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = Some(policy);
        self
    }
    pub fn energy_unit(mut self, factor: f64) -> Self {
        self.energy_unit = Some(factor);
        self
    }

    pub fn build(self) -> Result<EvaluationConfig, ConfigError> {
        if let Some(factor) = self.energy_unit {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    name: "energy_unit",
                    reason: format!("must be a finite positive number, got {}", factor),
                });
            }
        }
        Ok(EvaluationConfig {
            label_policy: self.label_policy.unwrap_or_default(),
            energy_unit: self.energy_unit,
        })
    }
}
