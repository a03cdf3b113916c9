use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use phpmix_obfuscator::ObfuscationContext;

use crate::config::Configuration;
use crate::error::Error;

/// `obfuscate dir <src> -o <dst> [--clean] [--dry-run]`.
#[derive(Parser, Debug)]
pub struct DirCommand {
    /// The source directory to mirror.
    pub source: PathBuf,

    /// The target directory. `<target>/obfuscated/` receives the obfuscated tree,
    /// `<target>/context/` receives the persisted scrambler state.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Remove the target directory before walking.
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Report what would be written without touching the target directory.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl DirCommand {
    pub fn execute(self, configuration: Configuration, abort_on_error: bool) -> Result<ExitCode, Error> {
        let mut walker_config = configuration.walker;
        walker_config.clean |= self.clean;
        walker_config.dry_run |= self.dry_run;
        walker_config.abort_on_error |= abort_on_error;

        let mut ctx = ObfuscationContext::new(configuration.obfuscator);
        let report = phpmix_walker::run(&self.source, &self.output, &walker_config, &mut ctx)?;

        tracing::info!(
            "processed {} file(s), copied {}, skipped {}",
            report.processed,
            report.copied,
            report.skipped
        );

        if !report.errors.is_empty() {
            for error in &report.errors {
                tracing::error!("{error}");
            }
            return Ok(ExitCode::FAILURE);
        }

        Ok(ExitCode::SUCCESS)
    }
}
