//! Coordinate file input and output.
//!
//! [`traits::CoordinateFile`] is the format-independent interface and
//! [`xyz::XyzFile`] the multi-frame XYZ implementation used by the command
//! line driver.

pub mod traits;
pub mod xyz;
