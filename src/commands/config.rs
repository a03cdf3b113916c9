use std::process::ExitCode;

use clap::Parser;

use crate::config::Configuration;
use crate::error::Error;

/// Prints the fully-resolved configuration as YAML.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Show the built-in defaults instead of the loaded configuration.
    #[arg(long, default_value_t = false)]
    pub default: bool,
}

impl ConfigCommand {
    pub fn execute(self, configuration: Configuration) -> Result<ExitCode, Error> {
        let resolved = if self.default { Configuration::default() } else { configuration };
        println!("{}", resolved.to_yaml()?);
        Ok(ExitCode::SUCCESS)
    }
}
