//! Command line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn config_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration document to build"),
        )
        .arg(
            Arg::new("with")
                .long("with")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Additional configuration that linked subsystems may resolve to"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with [link] and [upload] sections"),
        )
}

/// The `dtc` command tree
#[must_use]
pub fn command() -> Command {
    Command::new("dtc")
        .version(dtc_core::VERSION)
        .about("Compile cockpit configurations into command scripts and upload them")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand_required(true)
        .subcommand(
            config_args(Command::new("build").about("Build and print the upload script")).arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print wire envelopes as JSON"),
            ),
        )
        .subcommand(
            config_args(Command::new("upload").about("Pre-fetch state, build and execute"))
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Execute against a simulated, powered cockpit"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the execution report as JSON"),
                ),
        )
        .subcommand(
            Command::new("tables")
                .about("List devices and controls of a target")
                .arg(Arg::new("target").required(true).help("Target name, e.g. f16c")),
        )
        .subcommand(
            Command::new("upgrade")
                .about("Rewrite a configuration document in the current format")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}
