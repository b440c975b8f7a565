//! # Workflows Module
//!
//! End-to-end procedures built on [`crate::core`] and [`crate::engine`].
//!
//! - **Displacement Workflow** ([`displace`]) - Evaluate forces for every displacement
//!   file and write one `disp-<n>/vasprun.xml` per file.

pub mod displace;
