//! Atom-centred symmetry functions.
//!
//! Every atom is described by a fixed-length vector of G-functions: radial
//! terms summed over neighbors of one type and angular terms summed over
//! neighbor pairs of two types. The vector length depends only on the atom's
//! type, which lets one network per type consume it.
//!
//! - [`params`] holds the function definitions and per-feature scaling.
//! - [`functions`] evaluates single terms with their analytic derivatives.
//! - [`engine`] sums terms over a configuration batch and contracts
//!   descriptor gradients back to Cartesian coordinates.

pub mod engine;
pub mod functions;
pub mod params;
