//! # Engine Module
//!
//! The stateful part of an evaluation. A [`model::Model`] is the resolved,
//! read-only potential of one topology; a [`session::Session`] is one call
//! against it, owning every per-call buffer and enforcing the order of the
//! pipeline stages.
//!
//! - **Configuration** ([`config`]) - Label policy and energy unit override
//! - **State Tracking** ([`state`]) - Pipeline stages and the evaluation result
//! - **Error Handling** ([`error`]) - The evaluation error taxonomy

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod state;
