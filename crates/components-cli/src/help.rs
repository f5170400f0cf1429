use clap::{Arg, ArgAction};
use colored::Colorize;

pub(crate) const HELP_ID: &str = "help";
pub(crate) const CONFIG_ID: &str = "config";
pub(crate) const ARGS_ID: &str = "args";

const GLOBAL_HEADING: &str = "Global flags";

/// `-H/--help` for the root command.
pub(crate) fn app_help_flag(name: &str) -> Arg {
    Arg::new(HELP_ID)
        .short('H')
        .long("help")
        .action(ArgAction::Help)
        .help(format!("Help for {name}."))
        .help_heading(GLOBAL_HEADING)
}

/// `-H/--help` for a subcommand.
pub(crate) fn command_help_flag(name: &str) -> Arg {
    Arg::new(HELP_ID)
        .short('H')
        .long("help")
        .action(ArgAction::Help)
        .help(format!("Help for the {} command.", name.green()))
}

/// `-c/--config FILE`, also read from `<BASENAME>_CONFIG`.
pub(crate) fn config_flag(basename: &str) -> Arg {
    Arg::new(CONFIG_ID)
        .short('c')
        .long("config")
        .value_name("FILE")
        .env(config_env(basename))
        .help("Read configuration from the specified FILE (YAML).")
        .help_heading(GLOBAL_HEADING)
}

pub(crate) fn config_env(basename: &str) -> String {
    format!("{}_CONFIG", basename.replace('-', "_").to_uppercase())
}

/// Positional arguments collected for the run function.
pub(crate) fn positional_args() -> Arg {
    Arg::new(ARGS_ID)
        .num_args(0..)
        .trailing_var_arg(true)
        .hide(true)
}
