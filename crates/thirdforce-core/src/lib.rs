//! # thirdforce
//!
//! Turns a set of displaced supercells (`<prefix>.POSCAR.<n>`, as written by
//! `thirdorder.py sow`) into per-displacement force reports (`disp-<n>/vasprun.xml`)
//! that `thirdorder.py reap` can read, using an interatomic force model instead of
//! first-principles calculations.
//!
//! ## Layers
//!
//! - **[`core`]** - Structure model, POSCAR and report I/O, force evaluators.
//! - **[`engine`]** - Configuration, file discovery, progress reporting and errors.
//! - **[`workflows`]** - The displacement pipeline tying them together.

pub mod core;
pub mod engine;
pub mod workflows;
