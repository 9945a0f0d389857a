//! # Workflows Module
//!
//! The public entry points of the library. An [`evaluate::Evaluator`] is
//! built once per topology from a model manifest or from in-memory
//! parameters and then evaluates batches of cluster configurations given as
//! flat per-molecule coordinate buffers, as [`Configurations`] or as XYZ files.
//!
//! [`Configurations`]: crate::core::models::configuration::Configurations

pub mod evaluate;
