use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

const RUN_AFTER_HELP: &str = "\
External evaluator protocol:
  The command receives the displaced structure as POSCAR text on stdin and must print
  one line per atom with three force components (eV/Angstrom) on stdout. Arguments may
  use the placeholders {model}, {device} and {natoms}.";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "thirdforce - evaluate forces for thirdorder.py displacement files and write minimal vasprun.xml reports.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate forces for every displacement file and write disp-<n>/vasprun.xml.
    Run(RunArgs),
    /// List the displacement files that `run` would process.
    List(ListArgs),
}

/// Options selecting which displacement files to look at.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Directory containing the <prefix>.POSCAR.<n> files. Outputs are written here too.
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// File name prefix of the displacement files.
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvaluatorKind {
    /// Run an external program (e.g. a MACE wrapper) per displacement.
    External,
    /// Use the built-in Lennard-Jones pair potential.
    LennardJones,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
#[command(after_help = RUN_AFTER_HELP)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Model identifier passed to the evaluator.
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Compute device passed to the evaluator (e.g. cpu, cuda).
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Which force evaluator to use.
    #[arg(short, long, value_enum, value_name = "KIND")]
    pub evaluator: Option<EvaluatorKind>,

    /// Program to run for the external evaluator. Required unless set in the config file.
    #[arg(long = "command", value_name = "PROGRAM")]
    pub command: Option<String>,

    /// Argument for the external evaluator program. Repeat for several arguments;
    /// replaces the configured argument list.
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Parameter file for the Lennard-Jones evaluator.
    #[arg(long, value_name = "PATH")]
    pub lj_params: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S device=cuda
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the `list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_names_this_tool_without_inherited_authors() {
        let command = Cli::command();
        assert_eq!(command.get_author(), None);
        let about = command.get_about().map(|a| a.to_string()).unwrap_or_default();
        assert!(about.starts_with("thirdforce"));
    }

    #[test]
    fn run_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "thirdforce",
            "-vv",
            "run",
            "--prefix",
            "3RD",
            "--device",
            "cuda",
            "--evaluator",
            "external",
            "--command",
            "python3",
            "--arg",
            "mace_forces.py",
            "--arg",
            "--model={model}",
            "-S",
            "model=small.model",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.selection.prefix.as_deref(), Some("3RD"));
        assert_eq!(args.device.as_deref(), Some("cuda"));
        assert_eq!(args.evaluator, Some(EvaluatorKind::External));
        assert_eq!(args.args, vec!["mace_forces.py", "--model={model}"]);
        assert_eq!(args.set_values, vec!["model=small.model"]);
    }

    #[test]
    fn evaluator_kind_uses_kebab_case() {
        let cli = Cli::try_parse_from(["thirdforce", "run", "-e", "lennard-jones"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.evaluator, Some(EvaluatorKind::LennardJones));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["thirdforce", "-q", "-v", "list"]).is_err());
    }
}
