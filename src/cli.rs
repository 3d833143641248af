//! Clap adapter for structfig.
//!
//! This module is the **optional integration layer** between structfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`CliParser`] registers every [`FlagSpec`] from
//! [`build_flags`](crate::flags::build_flags) as a `clap::Arg`, takes every
//! value as a string, and passes only the flags the user actually typed to
//! [`apply_supplied`](crate::flags::apply_supplied). Type checking happens in
//! the merge engine, so clap never needs to know a field's type.
//!
//! If you use a different CLI parser, skip this module and feed
//! `(name, RawArg)` pairs to `apply_supplied` yourself.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Config;
use crate::error::ConfigError;
use crate::flags::{Arity, CONFIG_FLAG, CliOutcome, FlagSpec, RawArg, apply_supplied, build_flags};
use crate::schema::Schema;

/// A clap command generated from a schema.
///
/// ```ignore
/// let mut config = schema.instantiate();
/// CliParser::new(&schema)?.parse(&mut config)?;
/// ```
#[derive(Debug, Clone)]
pub struct CliParser {
    flags: Vec<FlagSpec>,
    command: Command,
}

impl CliParser {
    /// Build the command, named after the schema. Use
    /// [`name`](Self::name) to match your binary.
    pub fn new(schema: &Schema) -> Result<Self, ConfigError> {
        let flags = build_flags(schema)?;
        let mut command = Command::new(schema.name().to_string());
        if let Some(about) = schema.description() {
            command = command.about(about.to_string());
        }
        for flag in &flags {
            command = command.arg(to_arg(flag));
        }
        Ok(Self { flags, command })
    }

    pub fn name(mut self, name: &str) -> Self {
        self.command = self.command.name(name.to_string());
        self
    }

    pub fn flags(&self) -> &[FlagSpec] {
        &self.flags
    }

    /// The underlying clap command, e.g. to render help.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Parse `args` (including the binary name) and apply them to `config`.
    ///
    /// Parse failures, including `--help`, come back as
    /// [`ConfigError::Cli`].
    pub fn parse_from<I, T>(&self, config: &mut Config, args: I) -> Result<CliOutcome, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;
        apply_supplied(config, self.supplied(&matches))
    }

    /// Parse the process arguments, apply them, and print the configuration
    /// if `--print_config` was given. Exits on parse errors and `--help`.
    pub fn parse(&self, config: &mut Config) -> Result<CliOutcome, ConfigError> {
        let matches = self.command.clone().get_matches();
        let outcome = apply_supplied(config, self.supplied(&matches))?;
        if outcome.print_config {
            println!("Configuration:\n{config}");
        }
        Ok(outcome)
    }

    /// Only flags that were actually passed; the backend never fills defaults.
    fn supplied(&self, matches: &ArgMatches) -> Vec<(String, RawArg)> {
        let mut out = Vec::new();
        for flag in &self.flags {
            let id = flag.name.as_str();
            let raw = match flag.arity {
                Arity::Switch => matches.get_flag(id).then_some(RawArg::Present),
                Arity::One => matches
                    .get_one::<String>(id)
                    .map(|v| RawArg::Value(v.clone())),
                Arity::OneOrMore => matches
                    .get_many::<String>(id)
                    .map(|vs| RawArg::Values(vs.cloned().collect())),
            };
            if let Some(raw) = raw {
                out.push((flag.name.clone(), raw));
            }
        }
        out
    }
}

fn to_arg(flag: &FlagSpec) -> Arg {
    let arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .help(flag.help.clone());
    match flag.arity {
        Arity::Switch => arg.action(ArgAction::SetTrue),
        Arity::One => arg
            .action(ArgAction::Set)
            .num_args(1)
            .value_name(value_name(flag))
            .value_parser(clap::value_parser!(String)),
        Arity::OneOrMore => arg
            .action(ArgAction::Set)
            .num_args(1..)
            .value_name(value_name(flag))
            .value_parser(clap::value_parser!(String)),
    }
}

fn value_name(flag: &FlagSpec) -> String {
    if flag.name == CONFIG_FLAG {
        "PATH".to_string()
    } else {
        flag.ty.name().to_uppercase()
    }
}
