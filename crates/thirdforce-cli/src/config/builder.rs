use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileEvaluatorConfig};
use super::models::AppConfig;
use crate::cli::{EvaluatorKind, RunArgs, SelectionArgs};
use crate::error::{CliError, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use thirdforce::core::forcefield::setup::EvaluatorSpec;
use thirdforce::engine::config::RunConfigBuilder;

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(&args.selection)?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let (working_dir, prefix) = merge_selection(&args.selection, &file_config, &defaults);
    let model = args
        .model
        .clone()
        .or(file_config.model.take())
        .unwrap_or(defaults.model.clone());
    let device = args
        .device
        .clone()
        .or(file_config.device.take())
        .unwrap_or(defaults.device.clone());

    let evaluator_file = file_config.evaluator.take().unwrap_or_default();
    let evaluator = merge_evaluator(args, evaluator_file, &defaults)?;

    let core_config = RunConfigBuilder::new()
        .working_dir(working_dir)
        .prefix(prefix)
        .model(model)
        .device(device)
        .evaluator(evaluator)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        core_config,
        show_progress: !args.no_progress,
    })
}

/// Resolves the directory and prefix for commands that only look at files.
pub fn resolve_selection(selection: &SelectionArgs) -> Result<(PathBuf, String)> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(selection)?;
    Ok(merge_selection(selection, &file_config, &defaults))
}

fn load_file_config(selection: &SelectionArgs) -> Result<FileConfig> {
    match &selection.config {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

fn merge_selection(
    selection: &SelectionArgs,
    file_config: &FileConfig,
    defaults: &DefaultsConfig,
) -> (PathBuf, String) {
    let working_dir = selection
        .dir
        .clone()
        .or_else(|| file_config.working_dir.clone())
        .unwrap_or_else(|| PathBuf::from(&defaults.working_dir));
    let prefix = selection
        .prefix
        .clone()
        .or_else(|| file_config.prefix.clone())
        .unwrap_or_else(|| defaults.prefix.clone());
    (working_dir, prefix)
}

fn merge_evaluator(
    args: &RunArgs,
    file_val: FileEvaluatorConfig,
    defaults: &DefaultsConfig,
) -> Result<EvaluatorSpec> {
    let kind = match args.evaluator {
        Some(kind) => kind,
        None => {
            let name = file_val
                .kind
                .as_deref()
                .unwrap_or(&defaults.evaluator_kind);
            EvaluatorKind::from_str(name, true).map_err(|_| {
                CliError::Config(format!(
                    "Unknown evaluator kind '{}'. Expected 'external' or 'lennard-jones'.",
                    name
                ))
            })?
        }
    };

    match kind {
        EvaluatorKind::External => {
            let program = args.command.clone().or(file_val.command).ok_or_else(|| {
                CliError::Config(
                    "The external evaluator requires a program to run (--command or `evaluator.command`)".to_string(),
                )
            })?;
            let program_args = if args.args.is_empty() {
                file_val.args.unwrap_or_else(|| defaults.args.clone())
            } else {
                args.args.clone()
            };
            Ok(EvaluatorSpec::External {
                program,
                args: program_args,
            })
        }
        EvaluatorKind::LennardJones => {
            let params_path = args.lj_params.clone().or(file_val.lj_params).ok_or_else(|| {
                CliError::Config(
                    "The lennard-jones evaluator requires a parameter file (--lj-params or `evaluator.lj-params`)".to_string(),
                )
            })?;
            Ok(EvaluatorSpec::LennardJones { params_path })
        }
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "prefix" => config.prefix = Some(value.to_string()),
            "model" => config.model = Some(value.to_string()),
            "device" => config.device = Some(value.to_string()),
            "working-dir" => config.working_dir = Some(PathBuf::from(value)),
            "evaluator.kind" => {
                config.evaluator.get_or_insert_with(Default::default).kind = Some(value.to_string())
            }
            "evaluator.command" => {
                config.evaluator.get_or_insert_with(Default::default).command =
                    Some(value.to_string())
            }
            "evaluator.lj-params" => {
                config.evaluator.get_or_insert_with(Default::default).lj_params =
                    Some(PathBuf::from(value))
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
