use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use phpmix_obfuscator::ObfuscationContext;
use phpmix_scrambler::Category;

use crate::error::Error;

/// `whatis <name> -t <target-dir> [--type <kind>]`: loads the persisted
/// scrambler set and prints the original identifier whose mapping equals `name`,
/// additionally reporting every category the name resolves under when `--type` is
/// omitted and more than one category matches, since each category's map is
/// independent and a scrambled string can legitimately collide across them.
#[derive(Parser, Debug)]
pub struct WhatisCommand {
    /// The scrambled name to look up.
    pub name: String,

    /// The directory a prior `obfuscate dir` run wrote to (its `context/`
    /// subdirectory holds the persisted scrambler files).
    #[arg(short = 't', long = "target-dir")]
    pub target_dir: PathBuf,

    /// Restrict the search to this identifier category instead of trying all seven.
    #[arg(long = "type")]
    pub category: Option<String>,
}

impl WhatisCommand {
    pub fn execute(self) -> Result<ExitCode, Error> {
        let context_dir = self.target_dir.join("context");
        let scramblers = ObfuscationContext::load_from(&context_dir)?;

        let categories = match &self.category {
            Some(name) => vec![Category::parse(name).ok_or_else(|| Error::UnknownCategory(name.clone()))?],
            None => Category::ALL.to_vec(),
        };

        let mut matches = Vec::new();
        for category in categories {
            if let Some(scrambler) = scramblers.get(&category) {
                if let Some(original) = scrambler.unscramble(&self.name) {
                    matches.push((category, original.to_string()));
                }
            }
        }

        if matches.is_empty() {
            return Err(Error::NotFound(format!("no identifier found for `{}`", self.name)));
        }

        for (category, original) in &matches {
            if matches.len() > 1 {
                println!("{original} ({category})");
            } else {
                println!("{original}");
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
