use crate::core::forcefield::traits::ForceEvaluator;
use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::io::vasprun::{ReportWriter, VasprunReport};
use crate::engine::config::RunConfig;
use crate::engine::discovery::{Displacement, DisplacementSet};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Outcome of one processed displacement.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementRecord {
    pub ordinal: usize,
    pub num_atoms: usize,
    pub report_path: PathBuf,
    /// Largest force norm in eV/Angstrom.
    pub max_force: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: Vec<DisplacementRecord>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.records.len()
    }

    pub fn max_force(&self) -> Option<f64> {
        self.records.iter().map(|r| r.max_force).reduce(f64::max)
    }
}

/// Processes a single displacement: create its directory, copy the input in,
/// parse it, evaluate forces and write the report.
pub fn process_one<F>(
    displacement: &Displacement,
    evaluator: &mut dyn ForceEvaluator,
    writer: &dyn ReportWriter,
) -> Result<DisplacementRecord, EngineError>
where
    F: StructureFile,
    F::Error: Send + Sync + 'static,
{
    let ordinal = displacement.ordinal;
    let io_error = |action: &'static str, path: PathBuf| {
        move |source: std::io::Error| EngineError::Io {
            ordinal,
            action,
            path,
            source,
        }
    };

    fs::create_dir_all(&displacement.output_dir).map_err(io_error(
        "create directory",
        displacement.output_dir.clone(),
    ))?;

    let copy_path = displacement.poscar_copy_path();
    fs::copy(&displacement.input_path, &copy_path)
        .map_err(io_error("copy", displacement.input_path.clone()))?;

    let (structure, _) =
        F::read_from_path(&displacement.input_path).map_err(|e| EngineError::Structure {
            ordinal,
            path: displacement.input_path.clone(),
            source: Box::new(e),
        })?;
    debug!(
        ordinal,
        atoms = structure.num_atoms(),
        "Parsed {:?}",
        displacement.input_path
    );

    let forces = evaluator
        .compute_forces(&structure)
        .map_err(|source| EngineError::ForceField { ordinal, source })?;
    if forces.len() != structure.num_atoms() {
        return Err(EngineError::ForceCountMismatch {
            ordinal,
            expected: structure.num_atoms(),
            found: forces.len(),
        });
    }
    if let Some(atom) = forces.iter().position(|f| f.iter().any(|c| !c.is_finite())) {
        return Err(EngineError::NonFiniteForce { ordinal, atom });
    }

    let report_path = displacement.report_path();
    writer
        .write_report_to_path(&structure, &forces, &report_path)
        .map_err(|source| EngineError::Report {
            ordinal,
            path: report_path.clone(),
            source,
        })?;

    let max_force = forces.iter().map(|f| f.norm()).fold(0.0, f64::max);
    debug!(ordinal, max_force, "Wrote {:?}", report_path);

    Ok(DisplacementRecord {
        ordinal,
        num_atoms: structure.num_atoms(),
        report_path,
        max_force,
    })
}

/// Processes every displacement of `set` in ordinal order with one evaluator.
///
/// The first failure stops the run; directories of earlier displacements are left
/// as written and later ordinals are never touched.
#[instrument(skip_all, name = "displacement_workflow", fields(prefix = %set.prefix, count = set.len()))]
pub fn run<F>(
    set: &DisplacementSet,
    evaluator: &mut dyn ForceEvaluator,
    writer: &dyn ReportWriter,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError>
where
    F: StructureFile,
    F::Error: Send + Sync + 'static,
{
    info!(
        "Evaluating {} displacement(s) with '{}'.",
        set.len(),
        evaluator.name()
    );
    reporter.report(Progress::PhaseStart {
        name: "Evaluating forces",
    });
    reporter.report(Progress::TaskStart {
        total_steps: set.len() as u64,
    });

    let mut summary = RunSummary::default();
    for displacement in set {
        reporter.report(Progress::DisplacementStart {
            ordinal: displacement.ordinal,
        });
        let record = process_one::<F>(displacement, evaluator, writer)?;
        reporter.report(Progress::DisplacementFinish {
            ordinal: displacement.ordinal,
        });
        summary.records.push(record);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!("Processed {} displacement(s).", summary.processed());
    Ok(summary)
}

/// Builds the evaluator described by `config` and runs the POSCAR to
/// `vasprun.xml` pipeline over `set`.
///
/// The evaluator is only built when `set` holds at least one displacement.
pub fn run_with_config(
    config: &RunConfig,
    set: &DisplacementSet,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    if set.is_empty() {
        info!("No displacement files found for prefix '{}'.", set.prefix);
        return Ok(RunSummary::default());
    }
    let mut evaluator = config
        .evaluator
        .build(&config.model, &config.device)
        .map_err(EngineError::EvaluatorSetup)?;
    run::<PoscarFile>(set, evaluator.as_mut(), &VasprunReport, reporter)
}
