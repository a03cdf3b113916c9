//! Pipeline Orchestrator: parse → ordered passes → print, with helper
//! prelude injection.

use crate::context::ObfuscationContext;
use crate::error::ObfuscatorError;
use crate::helpers;
use crate::ids::NodeIdGen;
use crate::passes;
use phpmix_syntax::ast::Program;
use phpmix_syntax::parser::{parse, ParseError};
use phpmix_syntax::printer::print_program;

pub struct PipelineResult {
    pub output: String,
    /// Recoverable diagnostics from the parse step.
    pub diagnostics: Vec<ParseError>,
}

/// Runs the full pipeline over a single file's source. `abort_on_error` only affects
/// whether a fatal parse diagnostic is escalated here; recoverable diagnostics are
/// always tolerated and returned alongside the output for the caller to report.
pub fn run_file(source: &str, ctx: &mut ObfuscationContext) -> Result<PipelineResult, ObfuscatorError> {
    let parsed = parse(source);
    let fatal: Vec<ParseError> = parsed.diagnostics.iter().filter(|d| d.fatal).cloned().collect();
    if !fatal.is_empty() {
        return Err(ObfuscatorError::ParseFatal(fatal));
    }

    let output = run_program(parsed.program, ctx, &parsed.comments);
    Ok(PipelineResult { output, diagnostics: parsed.diagnostics })
}

/// Runs the fixed seven-pass pipeline over an already-parsed tree (the renamer, which
/// runs before this, needs the parsed `Program` too, so callers going through
/// [`crate::obfuscate_file`] parse once and hand the tree to both steps). `comments`
/// is the flat list the parser recorded while skipping trivia; it only matters when
/// `ctx.config.comments.enabled` is false.
pub fn run_program(mut program: Program, ctx: &mut ObfuscationContext, comments: &[String]) -> String {
    let mut ids = NodeIdGen::for_program(&program);

    // Fixed pass order. Comment stripping runs last, after printing, since comments
    // never make it into the tree these passes operate on; every other pass either
    // mutates the tree directly or (array-access) rebuilds its own Parent Tracker and
    // applies a fresh Replacer queue.
    passes::string_rewriter::run(&mut program, ctx, &mut ids);

    let control_flow_cfg = ctx.config.control_flow.clone();
    passes::control_flow::run(&mut program, &control_flow_cfg, &mut ids);

    let array_access_cfg = ctx.config.array_access.clone();
    passes::array_access::run(&mut program, &array_access_cfg, ctx, &mut ids);

    let arithmetic_cfg = ctx.config.arithmetic.clone();
    passes::arithmetic::run(&mut program, &arithmetic_cfg, &mut ids);

    let dead_code_cfg = ctx.config.dead_code.clone();
    passes::junk::run(&mut program, &dead_code_cfg, &mut ids);

    let shuffle_cfg = ctx.config.shuffle.clone();
    passes::shuffle::run(&mut program, &shuffle_cfg);

    let printed = print_program(&program);
    let printed = normalize_echo_juxtaposition(&printed);
    let printed = passes::comment_stripper::run(printed, comments, ctx.config.comments.enabled);
    prepend_helpers(printed, ctx)
}

/// Splices the XOR-decoder and/or array-access helper preludes in right after the
/// single `<?php` tag the printer always emits, each guarded by `function_exists` so
/// including several obfuscated files together is safe.
fn prepend_helpers(printed: String, ctx: &ObfuscationContext) -> String {
    let mut prelude = String::new();
    if ctx.needs_xor_helper() {
        prelude.push_str(helpers::XOR_DECODE_HELPER);
    }
    if ctx.needs_array_access_helper() {
        prelude.push_str(helpers::ARRAY_GET_HELPER);
    }
    if prelude.is_empty() {
        return printed;
    }

    match printed.strip_prefix("<?php\n") {
        Some(rest) => format!("<?php\n{prelude}{rest}"),
        None => format!("<?php\n{prelude}{printed}"),
    }
}

/// Textual safety net for `echo` directly abutting a variable with no whitespace
/// between them. The printer here never actually produces this shape (it always
/// writes `echo ` with a trailing space), so this is a no-op on our own output, but
/// stays as a normalization step in case a future pass ever prints one.
fn normalize_echo_juxtaposition(source: &str) -> String {
    source.replace("echo$", "echo $")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObfuscatorConfig;

    #[test]
    fn array_access_run_prepends_helper_guard() {
        let mut config = ObfuscatorConfig::default();
        config.strings.enabled = false;
        config.array_access.enabled = true;
        let mut ctx = ObfuscationContext::new(config);

        let result = run_file("<?php echo $a[0];", &mut ctx).expect("pipeline succeeds");
        assert!(result.output.starts_with("<?php\nif (!function_exists('_phpmix_array_get'))"), "{}", result.output);
        assert!(result.output.contains("_phpmix_array_get($a, 0)"));
    }
}
