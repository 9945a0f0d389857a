//! # MBNN Core Library
//!
//! A Behler–Parrinello neural-network potential for 2-body and 3-body water
//! clusters. Given batches of cluster geometries it evaluates the switched
//! interaction energy and, on request, its Cartesian gradient.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Configurations`, `Topology`),
//!   the descriptor, network and switching mathematics, and parameter and coordinate I/O.
//!
//! - **[`engine`]: The Logic Core.** The per-call evaluation `Session`, an explicit state
//!   machine that orders descriptor construction, forward inference, switching, the
//!   backward pass and gradient assembly, plus the error taxonomy and evaluation settings.
//!
//! - **[`workflows`]: The Public API.** The reusable `Evaluator`, constructed once from a
//!   model and shared freely between threads, with entry points for in-memory molecule
//!   pairs and coordinate files.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_utils;
