//! Command-line overrides. Every config option is also a `--long` flag, and
//! flags are applied in the order they were given, after the config file.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};

use super::{apply_option, Settings, BOOL_OPTIONS, OPTION_NAMES};
use crate::error::ConfigError;

const CONFIG_ARG: &str = "config";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    /// `(option, value)` pairs in command-line order.
    pub options: Vec<(String, String)>,
}

pub fn command() -> Command {
    let mut cmd = Command::new("tofi")
        .version(crate_version!())
        .about("Keyboard-driven picker: reads candidates from stdin, prints the selection to stdout")
        .arg(
            Arg::new(CONFIG_ARG)
                .short('c')
                .long(CONFIG_ARG)
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read options from FILE instead of the default config"),
        );
    for &name in OPTION_NAMES {
        let arg = Arg::new(name).long(name).value_name("VALUE").action(ArgAction::Append);
        // A bare boolean flag must not take the next `--option` as its value.
        let arg = if BOOL_OPTIONS.contains(&name) {
            arg.num_args(0..=1).default_missing_value("true")
        } else {
            arg.allow_hyphen_values(true)
        };
        cmd = cmd.arg(arg);
    }
    cmd
}

pub fn parse_args<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Ok(collect(&matches))
}

fn collect(matches: &ArgMatches) -> CliArgs {
    let mut ordered: Vec<(usize, String, String)> = Vec::new();
    for &name in OPTION_NAMES {
        let (Some(values), Some(indices)) = (matches.get_many::<String>(name), matches.indices_of(name)) else {
            continue;
        };
        for (index, value) in indices.zip(values) {
            ordered.push((index, name.to_string(), value.clone()));
        }
    }
    ordered.sort_by_key(|(index, _, _)| *index);
    CliArgs {
        config: matches.get_one::<PathBuf>(CONFIG_ARG).cloned(),
        options: ordered.into_iter().map(|(_, name, value)| (name, value)).collect(),
    }
}

/// Applies the overrides in order; the first invalid one is returned.
pub fn apply_cli(settings: &mut Settings, args: &CliArgs) -> Result<(), ConfigError> {
    for (option, value) in &args.options {
        apply_option(settings, option, value)?;
    }
    Ok(())
}
