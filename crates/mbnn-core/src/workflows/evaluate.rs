use crate::core::io::traits::CoordinateFile;
use crate::core::io::xyz::XyzFile;
use crate::core::models::configuration::{Configurations, LabelledBatch};
use crate::core::models::topology::Topology;
use crate::core::numeric::Real;
use crate::core::params::ModelParameters;
use crate::engine::config::{EvaluationConfig, LabelPolicy};
use crate::engine::error::EvalError;
use crate::engine::model::Model;
use crate::engine::session::Session;
use crate::engine::state::{Evaluation, Stage};
use std::path::Path;
use tracing::{debug, instrument, warn};

/// A reusable energy and gradient evaluator for one water cluster topology.
///
/// Construction loads and validates the model once. Evaluation only borrows
/// the evaluator, so one instance can serve any number of threads; all
/// per-call buffers live in a fresh [`Session`].
#[derive(Debug, Clone)]
pub struct Evaluator<T: Real> {
    model: Model<T>,
    config: EvaluationConfig,
}

impl<T: Real> Evaluator<T> {
    pub fn new(params: ModelParameters<T>, config: EvaluationConfig) -> Result<Self, EvalError> {
        let model = Model::new(params, config.energy_unit)?;
        Ok(Self { model, config })
    }

    /// Loads the model manifest at `path` and builds an evaluator from it.
    pub fn from_path(path: &Path, config: EvaluationConfig) -> Result<Self, EvalError> {
        Self::new(ModelParameters::load(path)?, config)
    }

    pub fn model(&self) -> &Model<T> {
        &self.model
    }

    pub fn topology(&self) -> &Topology {
        self.model.topology()
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluates a batch whose configurations follow the topology's atom order.
    ///
    /// `labels`, when given, are checked against the topology according to
    /// the configured [`LabelPolicy`].
    #[instrument(skip_all, name = "evaluate", fields(clusters = frames.cluster_count()))]
    pub fn evaluate<S: AsRef<str>>(
        &self,
        frames: &Configurations<T>,
        labels: Option<&[S]>,
        with_gradient: bool,
    ) -> Result<Evaluation<T>, EvalError> {
        if let Some(labels) = labels {
            self.check_labels(labels)?;
        }
        debug!(
            "Evaluating {} {} configurations (gradient: {})",
            frames.cluster_count(),
            self.topology().kind(),
            with_gradient
        );
        Session::new(&self.model, frames)?.run(with_gradient)
    }

    fn check_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<(), EvalError> {
        match self.topology().check_labels(labels) {
            Ok(()) => Ok(()),
            Err(e) => match self.config.label_policy {
                LabelPolicy::Strict => Err(e.into()),
                LabelPolicy::Lenient => {
                    warn!("{}; continuing with the canonical atom order", e);
                    Ok(())
                }
            },
        }
    }

    fn pair_batch(
        &self,
        cluster_count: usize,
        xyz_a: &[T],
        xyz_b: &[T],
        labels: Option<(&[&str], &[&str])>,
    ) -> Result<(Configurations<T>, Option<Vec<String>>, usize), EvalError> {
        let (frames, atoms_a, atoms_b) =
            Configurations::from_molecule_pair(cluster_count, xyz_a, xyz_b)?;
        let labels = match labels {
            Some((a, b)) => {
                if a.len() != atoms_a || b.len() != atoms_b {
                    let message = format!(
                        "{} + {} labels supplied for molecules of {} + {} atoms",
                        a.len(),
                        b.len(),
                        atoms_a,
                        atoms_b
                    );
                    if self.config.label_policy == LabelPolicy::Strict {
                        return Err(EvalError::Configuration(message));
                    }
                    warn!("{}; ignoring the labels", message);
                    None
                } else {
                    Some(a.iter().chain(b).map(|s| s.to_string()).collect())
                }
            }
            None => None,
        };
        Ok((frames, labels, atoms_a))
    }

    /// Total switched energy of `cluster_count` configurations given as two
    /// per-molecule coordinate buffers (`xyz_a` then `xyz_b` atoms per configuration).
    pub fn energy(
        &self,
        cluster_count: usize,
        xyz_a: &[T],
        xyz_b: &[T],
        labels: Option<(&[&str], &[&str])>,
    ) -> Result<T, EvalError> {
        let (frames, labels, _) = self.pair_batch(cluster_count, xyz_a, xyz_b, labels)?;
        Ok(self.evaluate(&frames, labels.as_deref(), false)?.energy)
    }

    /// Like [`Self::energy`], also returning the gradient split back into the
    /// layouts of `xyz_a` and `xyz_b`.
    pub fn energy_and_gradient(
        &self,
        cluster_count: usize,
        xyz_a: &[T],
        xyz_b: &[T],
        labels: Option<(&[&str], &[&str])>,
    ) -> Result<(T, Vec<T>, Vec<T>), EvalError> {
        let (frames, labels, atoms_a) = self.pair_batch(cluster_count, xyz_a, xyz_b, labels)?;
        let evaluation = self.evaluate(&frames, labels.as_deref(), true)?;
        let gradient = evaluation.gradient.ok_or(EvalError::PreconditionViolation {
            operation: "energy_and_gradient",
            expected: Stage::GradientAssembled,
            found: Stage::EnergyReady,
        })?;
        let (grad_a, grad_b) = gradient.split_at_atom(atoms_a);
        Ok((evaluation.energy, grad_a, grad_b))
    }

    /// Reads every frame of an XYZ file and evaluates them as one batch.
    pub fn evaluate_file(
        &self,
        path: &Path,
        with_gradient: bool,
    ) -> Result<(LabelledBatch<T>, Evaluation<T>), EvalError> {
        let (batch, _) =
            XyzFile::read_from_path::<T, _>(path).map_err(|source| EvalError::CoordinateFile {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
        let evaluation =
            self.evaluate(&batch.configurations, Some(batch.labels.as_slice()), with_gradient)?;
        Ok((batch, evaluation))
    }

    /// Total energy of every frame in an XYZ file.
    pub fn energy_from_file(&self, path: &Path, with_gradient: bool) -> Result<T, EvalError> {
        Ok(self.evaluate_file(path, with_gradient)?.1.energy)
    }
}
