//! Force evaluation for displaced structures.
//!
//! Every evaluator implements [`traits::ForceEvaluator`]. Two are provided:
//!
//! - [`external::ExternalEvaluator`] runs a machine-learned potential as a child process,
//!   feeding it the structure as POSCAR text and reading forces back from stdout.
//! - [`lennard_jones::LennardJonesEvaluator`] is a periodic 12-6 pair potential with
//!   per-species parameters loaded from TOML ([`params`]).
//!
//! [`setup::EvaluatorSpec`] is the configuration-side description that builds either one.

pub mod external;
pub mod lennard_jones;
pub mod params;
pub mod potentials;
pub mod setup;
pub mod traits;
