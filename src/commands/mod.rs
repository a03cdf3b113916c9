use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects};
use clap::builder::Styles;
use clap::{ColorChoice, Parser, Subcommand};

use crate::commands::config::ConfigCommand;
use crate::commands::dir::DirCommand;
use crate::commands::file::FileCommand;
use crate::commands::whatis::WhatisCommand;

pub mod config;
pub mod dir;
pub mod file;
pub mod whatis;

pub const CLAP_STYLING: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
    .valid(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .invalid(AnsiColor::Yellow.on_default().effects(Effects::BOLD));

#[derive(Subcommand, Debug)]
pub enum ObfuscateCommand {
    /// Obfuscate a single PHP file, printing to standard output unless `-o` is given.
    File(FileCommand),
    /// Mirror a source directory into a target directory, obfuscating every PHP file
    /// found and byte-copying everything else.
    Dir(DirCommand),
}

#[derive(Parser, Debug)]
pub enum PhpmixCommand {
    /// Run the obfuscation pipeline.
    #[command(subcommand)]
    Obfuscate(ObfuscateCommand),
    /// Look up the original identifier behind a scrambled name.
    Whatis(WhatisCommand),
    /// Display the fully-resolved configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
#[command(
    name = "phpmix",
    version,
    author,
    styles = CLAP_STYLING,
    about = "phpmix: a source-to-source obfuscator for PHP.",
    long_about = "phpmix rewrites PHP source into an equivalent but harder-to-read form: \
                  identifier scrambling, string encoding, control-flow wrapping, array-access \
                  indirection, arithmetic rewriting, dead-code injection, and statement shuffling."
)]
pub struct CliArguments {
    /// The workspace root to resolve a relative configuration file path against.
    /// Defaults to the current working directory.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Path to a configuration file, overriding the default `phpmix.yaml` lookup.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress all non-error log output.
    #[arg(long, global = true, default_value_t = false)]
    pub silent: bool,

    /// Abort the whole run on the first error instead of accumulating and reporting.
    #[arg(long, global = true, default_value_t = false)]
    pub abort_on_error: bool,

    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub colors: ColorChoice,

    #[command(subcommand)]
    pub command: PhpmixCommand,
}
