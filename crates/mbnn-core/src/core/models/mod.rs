//! # Core Models Module
//!
//! Data structures describing what is evaluated: the canonical atom layout of a
//! water cluster, the batch of configurations being evaluated together, and the
//! Cartesian gradient produced for that batch.
//!
//! ## Key Components
//!
//! - [`atom`] - One atom of the canonical layout (label, type index, molecule slot)
//! - [`topology`] - The 2-body and 3-body water cluster layouts
//! - [`configuration`] - A batch of `NCLUSTER` configurations sharing one layout
//! - [`gradient`] - The `[3·NATOM × NCLUSTER]` gradient tensor
//!
//! ## Usage
//!
//! ```ignore
//! use mbnn::core::models::topology::{Topology, TopologyKind};
//! use mbnn::core::models::configuration::Configurations;
//!
//! let topology = Topology::new(TopologyKind::Dimer);
//! let frames = Configurations::from_flat(topology.atom_count(), &coordinates)?;
//! ```

pub mod atom;
pub mod configuration;
pub mod gradient;
pub mod topology;
