use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use phpmix_obfuscator::ObfuscationContext;

use crate::config::Configuration;
use crate::error::Error;

/// `obfuscate file <path> [-o <out>]`: single-file mode, no scrambler
/// persistence.
#[derive(Parser, Debug)]
pub struct FileCommand {
    /// The PHP file to obfuscate.
    pub path: PathBuf,

    /// Write the result here instead of standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FileCommand {
    pub fn execute(self, configuration: Configuration) -> Result<ExitCode, Error> {
        let source = std::fs::read_to_string(&self.path).map_err(|source| Error::Io { path: self.path.clone(), source })?;

        let mut ctx = ObfuscationContext::new(configuration.obfuscator);
        let result = phpmix_obfuscator::obfuscate_file(&source, &mut ctx)?;

        for diagnostic in &result.diagnostics {
            tracing::warn!("{}: {}", self.path.display(), diagnostic.message);
        }

        match self.output {
            Some(output) => {
                std::fs::write(&output, &result.output).map_err(|source| Error::Io { path: output, source })?;
            }
            None => println!("{}", result.output),
        }

        Ok(ExitCode::SUCCESS)
    }
}
