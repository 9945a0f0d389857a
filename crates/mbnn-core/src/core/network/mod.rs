//! Per-type feed-forward networks.
//!
//! One [`network::Network`] exists per atom type. It maps a batch of scaled
//! descriptor columns to one raw energy per column, and can propagate an
//! energy seed back to the descriptor inputs.

pub mod activation;
pub mod network;
