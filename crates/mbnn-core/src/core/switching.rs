//! Distance-based switching of cluster energies.
//!
//! Each configuration gets a weight computed from its intermolecular anchor
//! (O–O) distances. A single pair switch is 1 up to `inner`, decays smoothly
//! across `[inner, outer]` and is exactly zero beyond `outer`, so a dimer
//! weighs 1 at contact and nothing once separated.
//!
//! Trimers combine their three pair switches. The default is the sum of
//! pairwise products `s₁₂s₁₃ + s₁₂s₂₃ + s₁₃s₂₃` over smoothstep pairs on
//! `[0, 4.5]` Å. That weight lies in `[0, 3]`, falls below 1 at
//! hydrogen-bonded distances and vanishes as soon as two of the three pairs
//! are beyond `outer`.

use crate::core::models::configuration::Configurations;
use crate::core::models::gradient::GradientTensor;
use crate::core::models::topology::{Topology, TopologyKind};
use crate::core::numeric::{Real, real};
use nalgebra::{one, zero};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchShape {
    /// `½ (1 + cos πx)`.
    Cosine,
    /// `1 - 3x² + 2x³`.
    Smoothstep,
}

/// How per-pair switch values combine when a cluster has several anchor pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchCombination {
    /// `Π s_p`, which stays within `[0, 1]`.
    Product,
    /// `Σ_{p<q} s_p s_q`.
    PairProductSum,
}

impl fmt::Display for SwitchShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Smoothstep => write!(f, "smoothstep"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SwitchError {
    #[error("Switch outer radius ({outer}) must be greater than the inner radius ({inner})")]
    InvalidRange { inner: f64, outer: f64 },
    #[error("Switch radii must be non-negative, got inner = {0}")]
    NegativeRadius(f64),
}

/// Switch parameters on the anchor–anchor distance, in Å.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchParams {
    pub shape: SwitchShape,
    pub inner: f64,
    pub outer: f64,
    pub combination: SwitchCombination,
}

impl SwitchParams {
    /// Cosine over 4.5–6.5 Å for dimers; smoothstep over 0–4.5 Å summed over
    /// pair products for trimers.
    pub fn default_for(kind: TopologyKind) -> Self {
        match kind {
            TopologyKind::Dimer => Self {
                shape: SwitchShape::Cosine,
                inner: 4.5,
                outer: 6.5,
                combination: SwitchCombination::Product,
            },
            TopologyKind::Trimer => Self {
                shape: SwitchShape::Smoothstep,
                inner: 0.0,
                outer: 4.5,
                combination: SwitchCombination::PairProductSum,
            },
        }
    }

    pub fn validate(&self) -> Result<(), SwitchError> {
        if self.inner < 0.0 {
            return Err(SwitchError::NegativeRadius(self.inner));
        }
        if self.outer <= self.inner {
            return Err(SwitchError::InvalidRange {
                inner: self.inner,
                outer: self.outer,
            });
        }
        Ok(())
    }
}

/// The switching function of one topology.
#[derive(Debug, Clone)]
pub struct SwitchingFunction<T: Real> {
    params: SwitchParams,
    inner: T,
    outer: T,
    pairs: Vec<(usize, usize)>,
}

impl<T: Real> SwitchingFunction<T> {
    pub fn new(topology: &Topology, params: SwitchParams) -> Result<Self, SwitchError> {
        params.validate()?;
        Ok(Self {
            params,
            inner: real(params.inner),
            outer: real(params.outer),
            pairs: topology.anchor_pairs(),
        })
    }

    pub fn params(&self) -> &SwitchParams {
        &self.params
    }

    /// Value and slope of the single-pair switch at distance `r`.
    #[inline]
    pub fn pair_switch(&self, r: T) -> (T, T) {
        if r <= self.inner {
            return (one(), zero());
        }
        if r >= self.outer {
            return (zero(), zero());
        }
        let width = self.outer - self.inner;
        let x = (r - self.inner) / width;
        match self.params.shape {
            SwitchShape::Cosine => {
                let half: T = real(0.5);
                let arg = T::pi() * x;
                (half * (one::<T>() + arg.cos()), -half * T::pi() * arg.sin() / width)
            }
            SwitchShape::Smoothstep => {
                let (two, three, six): (T, T, T) = (real(2.0), real(3.0), real(6.0));
                (
                    one::<T>() - three * x * x + two * x * x * x,
                    six * x * (x - one()) / width,
                )
            }
        }
    }

    /// One weight per configuration of `frames`.
    pub fn compute_switch(&self, frames: &Configurations<T>) -> Vec<T> {
        frames
            .frames()
            .map(|frame| {
                let values: Vec<T> = self
                    .pairs
                    .iter()
                    .map(|&(a, b)| self.pair_switch(nalgebra::distance(&frame[a], &frame[b])).0)
                    .collect();
                self.combine(&values)
            })
            .collect()
    }

    /// Adds `energies[c] · ∂S_c/∂x` for every configuration `c` into `gradient`.
    ///
    /// `energies` are the unswitched cluster energies, so together with the
    /// `S · ∂E/∂x` term from the networks this completes the product rule.
    pub fn add_switch_gradient(
        &self,
        frames: &Configurations<T>,
        energies: &[T],
        gradient: &mut GradientTensor<T>,
    ) {
        for (cluster, (frame, &energy)) in frames.frames().zip(energies).enumerate() {
            if energy == zero() {
                continue;
            }
            let mut values = Vec::with_capacity(self.pairs.len());
            let mut slopes = Vec::with_capacity(self.pairs.len());
            let mut units = Vec::with_capacity(self.pairs.len());
            for &(a, b) in &self.pairs {
                let delta = frame[a] - frame[b];
                let r = delta.norm();
                let (s, ds) = self.pair_switch(r);
                values.push(s);
                slopes.push(ds);
                units.push(delta / r);
            }

            for (p, &(a, b)) in self.pairs.iter().enumerate() {
                if slopes[p] == zero() {
                    continue;
                }
                let d_switch = slopes[p] * self.partial(&values, p);
                let contribution = units[p] * (energy * d_switch);
                gradient.add_to_atom(cluster, a, &contribution);
                gradient.add_to_atom(cluster, b, &-contribution);
            }
        }
    }

    fn combine(&self, values: &[T]) -> T {
        if values.len() == 1 {
            return values[0];
        }
        match self.params.combination {
            SwitchCombination::Product => values.iter().fold(one(), |acc: T, &s| acc * s),
            SwitchCombination::PairProductSum => {
                let mut total: T = zero();
                for p in 0..values.len() {
                    for q in (p + 1)..values.len() {
                        total += values[p] * values[q];
                    }
                }
                total
            }
        }
    }

    /// `∂S/∂s_p` for the configured combination.
    fn partial(&self, values: &[T], p: usize) -> T {
        if values.len() == 1 {
            return one();
        }
        let others = values.iter().enumerate().filter(|&(q, _)| q != p).map(|(_, &s)| s);
        match self.params.combination {
            SwitchCombination::Product => others.fold(one(), |acc: T, s| acc * s),
            SwitchCombination::PairProductSum => others.fold(zero(), |acc: T, s| acc + s),
        }
    }
}
