use crate::cli::RunArgs;
use crate::config::{self, AppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use thirdforce::engine::{discovery, error::EngineError, progress::ProgressReporter};
use thirdforce::workflows;
use tracing::{debug, info};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let AppConfig {
        core_config,
        show_progress,
    } = config::build_config(&args)?;
    debug!("Final run configuration: {:?}", core_config);

    let set = discovery::discover(&core_config.working_dir, &core_config.prefix)
        .map_err(EngineError::from)?;
    println!("Found {} displacement files:", set.len());

    let reporter = if show_progress && !set.is_empty() {
        ProgressReporter::with_callback(CliProgressHandler::new().get_callback())
    } else {
        ProgressReporter::new()
    };

    info!("Invoking the displacement workflow...");
    let summary = workflows::displace::run_with_config(&core_config, &set, &reporter)?;
    if let Some(max_force) = summary.max_force() {
        info!(
            "Largest atomic force across {} displacement(s): {:.6} eV/A",
            summary.processed(),
            max_force
        );
    }

    println!("All calculations completed");
    Ok(())
}
