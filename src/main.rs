//! phpmix — a source-to-source obfuscator for PHP.
//!
//! # Architecture
//!
//! - **Command layer** ([`commands`]): CLI surface and argument parsing.
//! - **Configuration layer** ([`config`]): loading the YAML configuration file.
//! - **Library crates** (`phpmix-syntax`, `phpmix-scrambler`, `phpmix-rewrite`,
//!   `phpmix-obfuscator`, `phpmix-walker`): the parser, the Name Scrambler, the
//!   structural-edit side table, the transformation pipeline, and the directory
//!   walker, respectively.

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::commands::{CliArguments, ObfuscateCommand, PhpmixCommand};
use crate::config::Configuration;
use crate::consts::LOG_ENV_VAR;
use crate::error::Error;
use crate::utils::logger::initialize_logger;

mod commands;
mod config;
mod consts;
mod error;
mod utils;

pub fn main() -> ExitCode {
    let result = run();

    result.unwrap_or_else(|error| {
        tracing::error!("{}", error);
        ExitCode::FAILURE
    })
}

pub fn run() -> Result<ExitCode, Error> {
    let arguments = CliArguments::parse();

    let default_level = if arguments.silent {
        LevelFilter::ERROR
    } else if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    initialize_logger(default_level, LOG_ENV_VAR, arguments.colors);

    let workspace = arguments.workspace.clone().unwrap_or(std::env::current_dir().map_err(|source| Error::Io {
        path: ".".into(),
        source,
    })?);
    let configuration = Configuration::load(&workspace, arguments.config.as_deref())?;

    match arguments.command {
        PhpmixCommand::Obfuscate(ObfuscateCommand::File(cmd)) => cmd.execute(configuration),
        PhpmixCommand::Obfuscate(ObfuscateCommand::Dir(cmd)) => cmd.execute(configuration, arguments.abort_on_error),
        PhpmixCommand::Whatis(cmd) => cmd.execute(),
        PhpmixCommand::Config(cmd) => cmd.execute(configuration),
    }
}
