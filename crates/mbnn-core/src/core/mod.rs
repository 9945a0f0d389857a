//! # Core Module
//!
//! Stateless building blocks of the potential: data models for atoms,
//! configurations and gradients, the water cluster topologies, descriptor
//! mathematics, per-type neural networks, the switching function, and
//! parameter and coordinate file I/O.
//!
//! - **Data models** ([`models`]) - Atoms, configuration batches, gradient tensors and topologies
//! - **Atom types** ([`topology`]) - Label to type-index registry
//! - **Descriptors** ([`descriptors`]) - Radial and angular G-functions and their Jacobians
//! - **Networks** ([`network`]) - Feed-forward inference and reverse-mode gradients
//! - **Switching** ([`switching`]) - Distance-based cluster weights and their derivatives
//! - **Parameters** ([`params`]) - Model manifest, network and scaling file loading
//! - **File I/O** ([`io`]) - Coordinate file formats
//!
//! Everything here is generic over the working precision through
//! [`numeric::Real`], so the same code runs in `f32` and `f64`.

pub mod descriptors;
pub mod io;
pub mod models;
pub mod network;
pub mod numeric;
pub mod params;
pub mod switching;
pub mod topology;
