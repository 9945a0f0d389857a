use super::error::EvalError;
use super::model::Model;
use super::state::{Evaluation, Stage};
use crate::core::models::configuration::Configurations;
use crate::core::models::gradient::GradientTensor;
use crate::core::network::network::ForwardPass;
use crate::core::numeric::Real;
use nalgebra::{DMatrix, zero};
use tracing::debug;

/// One evaluation of one batch against a [`Model`].
///
/// Steps must run in order:
///
/// `build_descriptors → forward → compute_switch → [backward → assemble_gradient] → finish`
///
/// Calling a step out of order fails with [`EvalError::PreconditionViolation`]
/// and leaves the session unchanged. Every buffer is owned by the session and
/// dropped with it, on success and on error alike.
pub struct Session<'a, T: Real> {
    model: &'a Model<T>,
    frames: &'a Configurations<T>,
    stage: Stage,
    descriptors: Vec<DMatrix<T>>,
    passes: Vec<ForwardPass<T>>,
    raw_energies: Vec<T>,
    switch_factors: Vec<T>,
    descriptor_gradients: Vec<DMatrix<T>>,
    gradient: Option<GradientTensor<T>>,
}

impl<'a, T: Real> Session<'a, T> {
    pub fn new(model: &'a Model<T>, frames: &'a Configurations<T>) -> Result<Self, EvalError> {
        frames.expect_atom_count(model.topology().atom_count())?;
        Ok(Self {
            model,
            frames,
            stage: Stage::Idle,
            descriptors: Vec::new(),
            passes: Vec::new(),
            raw_energies: Vec::new(),
            switch_factors: Vec::new(),
            descriptor_gradients: Vec::new(),
            gradient: None,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn require(&self, operation: &'static str, expected: Stage) -> Result<(), EvalError> {
        if self.stage != expected {
            return Err(EvalError::PreconditionViolation {
                operation,
                expected,
                found: self.stage,
            });
        }
        Ok(())
    }

    pub fn build_descriptors(&mut self) -> Result<(), EvalError> {
        self.require("build_descriptors", Stage::Idle)?;
        self.descriptors = self.model.descriptors().compute(self.frames)?;
        self.stage = Stage::DescriptorsBuilt;
        Ok(())
    }

    /// Runs every atom's network and sums atomic energies per configuration.
    pub fn forward(&mut self) -> Result<(), EvalError> {
        self.require("forward", Stage::DescriptorsBuilt)?;
        let mut raw_energies = vec![zero::<T>(); self.frames.cluster_count()];
        let mut passes = Vec::with_capacity(self.descriptors.len());
        for (atom, g) in self.descriptors.iter().enumerate() {
            let (energies, pass) = self.model.network_for_atom(atom).forward(g)?;
            for (total, e) in raw_energies.iter_mut().zip(energies) {
                *total += e;
            }
            passes.push(pass);
        }
        self.raw_energies = raw_energies;
        self.passes = passes;
        self.stage = Stage::ForwardDone;
        Ok(())
    }

    pub fn compute_switch(&mut self) -> Result<(), EvalError> {
        self.require("compute_switch", Stage::ForwardDone)?;
        self.switch_factors = self.model.switching().compute_switch(self.frames);
        self.stage = Stage::SwitchComputed;
        Ok(())
    }

    /// Back-propagates the switch factors through every atom's network,
    /// yielding `∂(S·E)/∂G` per atom.
    pub fn backward(&mut self) -> Result<(), EvalError> {
        self.require("backward", Stage::SwitchComputed)?;
        let descriptor_gradients = self
            .passes
            .iter()
            .enumerate()
            .map(|(atom, pass)| {
                self.model
                    .network_for_atom(atom)
                    .backward(pass, &self.switch_factors)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.descriptor_gradients = descriptor_gradients;
        self.stage = Stage::BackwardDone;
        Ok(())
    }

    /// Maps descriptor gradients to Cartesian coordinates, adds the switch
    /// term and applies the energy unit.
    pub fn assemble_gradient(&mut self) -> Result<(), EvalError> {
        self.require("assemble_gradient", Stage::BackwardDone)?;
        let mut gradient = self
            .model
            .descriptors()
            .contract(self.frames, &self.descriptor_gradients)?;
        self.model
            .switching()
            .add_switch_gradient(self.frames, &self.raw_energies, &mut gradient);
        gradient.scale_mut(self.model.energy_unit_real());
        self.gradient = Some(gradient);
        self.stage = Stage::GradientAssembled;
        Ok(())
    }

    /// Combines raw energies and switch factors into the final result.
    ///
    /// Valid after `compute_switch` (energy only) or after `assemble_gradient`.
    pub fn finish(mut self) -> Result<Evaluation<T>, EvalError> {
        if self.stage != Stage::SwitchComputed && self.stage != Stage::GradientAssembled {
            return Err(EvalError::PreconditionViolation {
                operation: "finish",
                expected: Stage::SwitchComputed,
                found: self.stage,
            });
        }
        let unit = self.model.energy_unit_real();
        let cluster_energies: Vec<T> = self
            .raw_energies
            .iter()
            .zip(&self.switch_factors)
            .map(|(&e, &s)| e * s * unit)
            .collect();
        let energy = cluster_energies.iter().fold(zero::<T>(), |acc, &e| acc + e);
        self.stage = Stage::EnergyReady;
        debug!(
            "Evaluated {} configurations, total energy {}",
            cluster_energies.len(),
            energy
        );

        Ok(Evaluation {
            energy,
            cluster_energies,
            raw_energies: std::mem::take(&mut self.raw_energies),
            switch_factors: std::mem::take(&mut self.switch_factors),
            gradient: self.gradient.take(),
        })
    }

    /// Runs the whole pipeline in order.
    pub fn run(mut self, with_gradient: bool) -> Result<Evaluation<T>, EvalError> {
        self.build_descriptors()?;
        self.forward()?;
        self.compute_switch()?;
        if with_gradient {
            self.backward()?;
            self.assemble_gradient()?;
        }
        self.finish()
    }
}
