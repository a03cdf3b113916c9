//! Pipeline crate tying together `phpmix-syntax`, `phpmix-scrambler`, and
//! `phpmix-rewrite` into the obfuscator itself: a configuration model, per-file
//! obfuscation context (scrambler state plus helper-prelude bookkeeping), the
//! identifier renamer, the seven-pass transformation pipeline, and the orchestrator
//! that runs them in order and prints the result.

pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod ids;
pub mod orchestrator;
pub mod passes;
pub mod php_escape;
pub mod rename;

pub use config::ObfuscatorConfig;
pub use context::ObfuscationContext;
pub use error::ObfuscatorError;
pub use orchestrator::{run_file, PipelineResult};

/// Runs the identifier renamer followed by the fixed seven-pass pipeline. The entry
/// point callers outside this crate (the CLI, the directory walker) should use
/// rather than calling [`orchestrator::run_file`] directly, since renaming must
/// happen before the structural passes see the tree.
pub fn obfuscate_file(source: &str, ctx: &mut ObfuscationContext) -> Result<PipelineResult, ObfuscatorError> {
    let mut parsed = phpmix_syntax::parser::parse(source);
    let fatal: Vec<_> = parsed.diagnostics.iter().filter(|d| d.fatal).cloned().collect();
    if !fatal.is_empty() {
        return Err(ObfuscatorError::ParseFatal(fatal));
    }

    let identifier_cfg = ctx.config.identifiers.clone();
    rename::run(&mut parsed.program, &identifier_cfg, ctx);

    let output = orchestrator::run_program(parsed.program, ctx, &parsed.comments);
    Ok(PipelineResult { output, diagnostics: parsed.diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obfuscate_file_renames_then_runs_pipeline() {
        let mut config = ObfuscatorConfig::default();
        config.strings.enabled = false;
        config.control_flow.enabled = false;
        config.array_access.enabled = false;
        config.arithmetic.enabled = false;
        config.dead_code.enabled = false;
        config.shuffle.enabled = false;
        let mut ctx = ObfuscationContext::new(config);

        let result = obfuscate_file("<?php function greet(){ echo 1; } greet();", &mut ctx).expect("pipeline succeeds");
        assert!(!result.output.contains("greet("), "{}", result.output);
    }
}
