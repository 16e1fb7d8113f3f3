mod commands;
mod dispatch;
mod helpers;

use acwf_core::domain::AcwfError;
use clap::Parser;
use dispatch::{PROGRAM_NAME, command_alias_from_program_name};

pub fn run_from_env() -> i32 {
    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| PROGRAM_NAME.to_string());
    let remaining: Vec<String> = args.collect();

    match run_with_program_name(&program_name, remaining) {
        Ok(code) => code,
        Err(error) => {
            let acwf_error = error.as_acwf_error();
            eprintln!("{}", acwf_error.diagnostic_line());
            eprintln!("{}", acwf_error.fatal_exit_line());
            acwf_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args)
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn run_with_program_name(program_name: &str, args: Vec<String>) -> Result<i32, CliError> {
    let alias_command = command_alias_from_program_name(program_name);
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(alias_command.map(str::to_string))
        .chain(args)
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    // A bare invocation is a plot run without its set.
    if args.len() == 1 {
        return Ok(commands::print_set_usage());
    }

    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "acwf",
    version,
    about = "ACWF verification analysis and EOS submission tools"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Plot first-neighbor distances and compare lattice parameters
    Plot(commands::PlotArgs),
    /// Submit the Fe BCC equation-of-state workflow
    SubmitEos(commands::SubmitEosArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Plot(args) => commands::run_plot_command(args),
        CliCommand::SubmitEos(args) => commands::run_submit_eos_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(AcwfError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_acwf_error(&self) -> AcwfError {
        match self {
            Self::Usage(message) => AcwfError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => AcwfError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};

    #[test]
    fn missing_set_prints_usage_and_exits_two() {
        let code = run(["plot"]).expect("usage path is not an error");
        assert_eq!(code, 2);
        let code = run(["plot", "ternaries"]).expect("usage path is not an error");
        assert_eq!(code, 2);
    }

    #[test]
    fn bare_invocation_prints_set_usage() {
        let code = run(Vec::<String>::new()).expect("bare invocation is not an error");
        assert_eq!(code, 2);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["frobnicate"]).expect_err("unknown subcommand must fail");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_acwf_error().exit_code(), 2);
    }

    #[test]
    fn missing_labels_index_maps_to_io_exit_code() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let data_folder = temp.path().to_string_lossy().into_owned();
        let error = run(["plot", "unaries", "--data-folder", data_folder.as_str()])
            .expect_err("missing labels.json must fail");
        assert!(matches!(error, CliError::Internal(_)));
        let acwf_error = error.as_acwf_error();
        assert_eq!(acwf_error.exit_code(), 3);
        assert!(acwf_error.message().contains("labels.json"));
    }
}
