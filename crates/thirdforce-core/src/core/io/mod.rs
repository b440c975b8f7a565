//! Input/output for displacement structures and force reports.
//!
//! Structure formats implement [`traits::StructureFile`]; report formats implement
//! [`vasprun::ReportWriter`].

pub mod poscar;
pub mod traits;
pub mod vasprun;
