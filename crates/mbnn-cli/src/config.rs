use crate::cli::EnergyArgs;
use crate::error::{CliError, Result};
use mbnn::engine::config::{EvaluationConfig, EvaluationConfigBuilder, LabelPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// The `energy` configuration file. Every key is optional; command-line
/// flags take precedence over the file.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialEnergyConfig {
    model: Option<PathBuf>,
    precision: Option<Precision>,
    label_policy: Option<LabelPolicy>,
    energy_unit: Option<f64>,
    threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergySettings {
    pub model: PathBuf,
    pub precision: Precision,
    pub evaluation: EvaluationConfig,
    pub threads: Option<usize>,
}

impl PartialEnergyConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let (Some(model), Some(dir)) = (config.model.as_mut(), path.parent()) {
            if model.is_relative() {
                *model = dir.join(&*model);
            }
        }
        Ok(config)
    }

    /// Loads the file named by `--config`, or starts empty when none is given.
    pub fn from_args(args: &EnergyArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(
        self,
        args: &EnergyArgs,
        threads: Option<usize>,
    ) -> Result<EnergySettings> {
        let model = args.model.clone().or(self.model).ok_or_else(|| {
            CliError::Config(
                "A model manifest is required either in the config file ('model') or via --model."
                    .to_string(),
            )
        })?;

        let precision = if args.single_precision {
            Precision::Single
        } else {
            self.precision.unwrap_or_default()
        };

        let label_policy = if args.lenient_labels {
            LabelPolicy::Lenient
        } else {
            self.label_policy.unwrap_or_default()
        };

        let mut builder = EvaluationConfigBuilder::new().label_policy(label_policy);
        if let Some(factor) = args.energy_unit.or(self.energy_unit) {
            builder = builder.energy_unit(factor);
        }
        let evaluation = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let threads = threads.or(self.threads);
        if threads == Some(0) {
            return Err(CliError::Config(
                "The number of threads must be at least 1.".to_string(),
            ));
        }

        Ok(EnergySettings {
            model,
            precision,
            evaluation,
            threads,
        })
    }
}
