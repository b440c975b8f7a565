use crate::cli::ListArgs;
use crate::config;
use crate::error::Result;
use thirdforce::engine::{discovery, error::EngineError};
use tracing::info;

pub fn run(args: ListArgs) -> Result<()> {
    let (working_dir, prefix) = config::resolve_selection(&args.selection)?;
    info!(
        "Listing displacement files for prefix '{}' in {:?}",
        prefix, working_dir
    );

    let set = discovery::discover(&working_dir, &prefix).map_err(EngineError::from)?;
    println!("Found {} displacement files:", set.len());
    for displacement in &set {
        let status = if displacement.input_path.is_file() {
            ""
        } else {
            "  (missing)"
        };
        println!(
            "{:>width$}  {} -> {}{}",
            displacement.ordinal,
            displacement.input_path.display(),
            displacement.output_dir.display(),
            status,
            width = set.width
        );
    }
    Ok(())
}
