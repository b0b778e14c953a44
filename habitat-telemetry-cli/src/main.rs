use std::io::stdout;

use anyhow::Result;
use clap::{crate_version, value_parser, Arg, Command};
use clap_complete::{generate, Shell};

mod subcommands;

pub mod telemetry;

pub mod traits;
use traits::TelemetryApp;

fn main() -> Result<()> {
    // Known subapplications.
    let apps = vec![
        subcommands::ScalarsApp::app(),
        subcommands::VideoApp::app(),
    ];

    env_logger::init();

    let cli = Command::new("habitat-telemetry")
        .about("Log training telemetry to TensorBoard")
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(apps)
        .subcommand(
            Command::new("completions")
                .about("Generate completion scripts for your shell")
                .arg_required_else_help(true)
                .arg(
                    Arg::new("shell")
                        .value_parser(value_parser!(Shell))
                        .required(true),
                ),
        );
    let matches = cli.clone().get_matches();

    match matches.subcommand() {
        Some(("completions", matches)) => {
            let shell = *matches.get_one::<Shell>("shell").unwrap();
            write_completion_script(cli, shell);
            Ok(())
        }
        Some(("scalars", matches)) => subcommands::ScalarsApp::parse(matches)?.run(),
        Some(("video", matches)) => subcommands::VideoApp::parse(matches)?.run(),
        _unknown => unreachable!(),
    }
}

fn write_completion_script(mut cli: Command, shell: Shell) {
    generate(shell, &mut cli, "habitat-telemetry", &mut stdout());
}
