//! Data models for periodic atomic structures.
//!
//! - [`element`] - Chemical species keyed by atomic number.
//! - [`structure`] - Lattice plus ordered sites in fractional coordinates.

pub mod element;
pub mod structure;
