use crate::cli::EnergyArgs;
use crate::commands::configure_thread_pool;
use crate::config::{EnergySettings, PartialEnergyConfig, Precision};
use crate::error::{CliError, Result};
use mbnn::core::io::traits::CoordinateFile;
use mbnn::core::io::xyz::{XyzFile, XyzMetadata};
use mbnn::core::models::configuration::{Configurations, LabelledBatch};
use mbnn::core::numeric::Real;
use mbnn::engine::error::EvalError;
use mbnn::engine::state::Evaluation;
use mbnn::workflows::evaluate::Evaluator;
use std::io::Write;
use tracing::info;

pub fn run(args: EnergyArgs, threads: Option<usize>) -> Result<()> {
    let partial_config = PartialEnergyConfig::from_args(&args)?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args, threads)?;

    if let Some(num_threads) = settings.threads {
        configure_thread_pool(num_threads)?;
    }

    let mut stdout = std::io::stdout().lock();
    match settings.precision {
        Precision::Single => evaluate::<f32>(&args, &settings, &mut stdout),
        Precision::Double => evaluate::<f64>(&args, &settings, &mut stdout),
    }
}

fn evaluate<T: Real>(
    args: &EnergyArgs,
    settings: &EnergySettings,
    out: &mut impl Write,
) -> Result<()> {
    info!("Loading model from {:?}", &settings.model);
    let evaluator = Evaluator::<T>::from_path(&settings.model, settings.evaluation)?;

    let with_gradient = args.gradient || args.gradient_output.is_some();
    info!(
        "Evaluating {:?} ({}, gradient: {})",
        &args.input,
        match settings.precision {
            Precision::Single => "single precision",
            Precision::Double => "double precision",
        },
        with_gradient
    );
    let (batch, evaluation) = evaluator.evaluate_file(&args.input, with_gradient)?;

    writeln!(out, "Configurations: {}", evaluation.cluster_count())?;
    writeln!(out, "Total energy: {:.10}", evaluation.energy)?;

    if args.per_cluster {
        writeln!(out, "{:>8} {:>20} {:>14}", "cluster", "energy", "switch")?;
        for (index, (energy, switch)) in evaluation
            .cluster_energies
            .iter()
            .zip(&evaluation.switch_factors)
            .enumerate()
        {
            writeln!(out, "{:>8} {:>20.10} {:>14.8}", index, energy, switch)?;
        }
    }

    if let Some(gradient) = gradient_batch(&batch, &evaluation)? {
        let metadata = XyzMetadata {
            comments: evaluation
                .cluster_energies
                .iter()
                .enumerate()
                .map(|(index, energy)| {
                    format!("gradient of configuration {}, energy {:.10}", index, energy)
                })
                .collect(),
        };
        match &args.gradient_output {
            Some(path) => {
                XyzFile::write_to_path(&gradient, &metadata, path).map_err(|source| {
                    CliError::Output {
                        path: path.clone(),
                        source,
                    }
                })?;
                info!("Gradient written to {:?}", path);
                writeln!(out, "Gradient written to: {}", path.display())?;
            }
            None => XyzFile::write_to(&gradient, &metadata, out)
                .map_err(|e| CliError::Other(e.into()))?,
        }
    }

    Ok(())
}

/// The gradient laid out like the input: same labels, one frame per configuration.
fn gradient_batch<T: Real>(
    batch: &LabelledBatch<T>,
    evaluation: &Evaluation<T>,
) -> Result<Option<LabelledBatch<T>>> {
    let Some(gradient) = &evaluation.gradient else {
        return Ok(None);
    };
    let configurations = Configurations::from_flat(gradient.atom_count(), &gradient.to_flat())
        .map_err(EvalError::from)?;
    let labelled =
        LabelledBatch::new(batch.labels.clone(), configurations).map_err(EvalError::from)?;
    Ok(Some(labelled))
}
