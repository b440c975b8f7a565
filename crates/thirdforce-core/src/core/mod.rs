//! # Core Module
//!
//! Stateless building blocks for turning displaced structures into force reports.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Elements, lattices and fractional sites
//! - **File I/O** ([`io`]) - POSCAR reading/writing and the reduced `vasprun.xml` report
//! - **Force Evaluation** ([`forcefield`]) - The evaluator seam, an external-process
//!   evaluator for machine-learned potentials, and a built-in Lennard-Jones reference
//!
//! Each of the three capabilities (parsing, force evaluation, report writing) sits behind
//! its own trait so the pipeline in [`crate::workflows`] can run against stubs.

pub mod forcefield;
pub mod io;
pub mod models;
