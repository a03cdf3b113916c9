//! Comment Stripper.
//!
//! Comments never enter the AST: `phpmix_syntax::parser` discards
//! `LineComment`/`BlockComment`/`DocComment` tokens as trivia while building the tree,
//! so there is no tree node for a pass to delete here. The parser does, however,
//! record each comment's reconstructed source text as it skips past it
//! (`ParseResult::comments`), and this module is what turns that list into an actual
//! on/off toggle: stripping is simply not reinserting it, and a disabled pass
//! reinserts every recorded comment, verbatim, as a block right after the opening
//! `<?php` tag.
//!
//! Reinsertion is not positional. The AST carries no span linking a comment to the
//! statement it originally sat beside, so a disabled pass cannot put a comment back
//! next to the code it used to annotate; it can only guarantee the text survives into
//! the output somewhere.

pub fn run(printed: String, comments: &[String], enabled: bool) -> String {
    if enabled || comments.is_empty() {
        return printed;
    }

    let mut block = String::new();
    for comment in comments {
        block.push_str(comment);
        block.push('\n');
    }

    match printed.strip_prefix("<?php\n") {
        Some(rest) => format!("<?php\n{block}{rest}"),
        None => format!("<?php\n{block}{printed}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    fn pipeline(source: &str, enabled: bool) -> String {
        let result = parse(source);
        let printed = print_program(&result.program);
        run(printed, &result.comments, enabled)
    }

    #[test]
    fn enabled_leaves_output_untouched() {
        let out = pipeline("<?php\n// keep me\necho 1;", true);
        assert!(!out.contains("keep me"), "{out}");
    }

    #[test]
    fn disabled_reinserts_comment_text() {
        let out = pipeline("<?php\n// original note\n/** doc */\necho 1;", false);
        assert!(out.contains("// original note"), "{out}");
        assert!(out.contains("/* doc */"), "{out}");
    }

    #[test]
    fn disabled_with_no_comments_is_unchanged() {
        let out = pipeline("<?php\necho 1;", false);
        assert!(!out.contains("/*"), "{out}");
    }
}
