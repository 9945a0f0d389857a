//! # Topology Module
//!
//! Atom-type bookkeeping shared by every component of the model.
//!
//! ## Key Components
//!
//! - [`registry`] - The label → type-index registry (`O → 0`, `H → 1` for water)
//!
//! ## Usage
//!
//! The registry is built from the canonical atom sequence of a
//! [`Topology`](crate::core::models::topology::Topology) and then used to pick the
//! descriptor parameters and network for each atom.
//!
//! ```ignore
//! use mbnn::core::topology::registry::AtomTypeRegistry;
//!
//! let registry = AtomTypeRegistry::from_sequence(&["O", "H", "H"]);
//! assert_eq!(registry.index_of("H"), Some(1));
//! ```

pub mod registry;
