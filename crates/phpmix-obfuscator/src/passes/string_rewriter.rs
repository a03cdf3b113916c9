//! String Rewriter: replaces literal and interpolated strings with
//! decoder expressions.
//!
//! Implemented as a direct `MutWalker` override rather than through the
//! Parent-Tracker/Replacer machinery: this pass never needs to know a literal's
//! syntactic context, only its own shape, so substituting `*expression = new` in
//! place inside `visit_expression` is sufficient and avoids a pointless queue/apply
//! round trip for every string in the file.

use crate::config::StringTechnique;
use crate::context::ObfuscationContext;
use crate::ids::NodeIdGen;
use crate::php_escape::single_quote_escape;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use phpmix_syntax::ast::*;
use phpmix_syntax::walker::{walk_expression_children, MutWalker};
use phpmix_syntax::token::Span;

struct StringRewriter<'a> {
    technique: Option<StringTechnique>,
    xor_key: &'a str,
    ids: &'a mut NodeIdGen,
    used_xor: bool,
}

pub fn run(program: &mut Program, ctx: &mut ObfuscationContext, ids: &mut NodeIdGen) {
    if !ctx.config.strings.enabled {
        return;
    }
    let mut rewriter =
        StringRewriter { technique: ctx.config.strings.technique(), xor_key: &ctx.config.strings.xor_key, ids, used_xor: false };
    for statement in &mut program.statements {
        rewriter.visit_statement(statement);
    }
    if rewriter.used_xor {
        ctx.mark_needs_xor_helper();
    }
}

impl<'a> MutWalker for StringRewriter<'a> {
    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression_children(self, expression);

        match expression {
            Expression::Literal(Literal::String { value, .. }) if !value.is_empty() => {
                *expression = self.decode_call(value);
            }
            Expression::InterpolatedString(s) => {
                if let Some(rewritten) = self.decompose(s) {
                    *expression = rewritten;
                }
            }
            _ => {}
        }
    }
}

impl<'a> StringRewriter<'a> {
    fn name(&mut self, value: &str) -> Name {
        Name { id: self.ids.fresh(), span: Span::new(0, 0), value: value.to_string() }
    }

    fn string_literal(&mut self, value: String) -> Expression {
        Expression::Literal(Literal::String { id: self.ids.fresh(), span: Span::new(0, 0), raw: value.clone(), value, quote: QuoteKind::Single })
    }

    fn call(&mut self, function: &str, arguments: Vec<Expression>) -> Expression {
        let name = self.name(function);
        Expression::Call(Call { id: self.ids.fresh(), span: Span::new(0, 0), target: CallTarget::Function(name), arguments })
    }

    /// A plain string falls back to base64 when the technique is empty/unrecognized.
    fn decode_call(&mut self, original: &str) -> Expression {
        match self.technique.unwrap_or(StringTechnique::Base64) {
            StringTechnique::Base64 => {
                let encoded = BASE64.encode(original.as_bytes());
                let literal = self.string_literal(encoded);
                self.call("base64_decode", vec![literal])
            }
            StringTechnique::Rot13 => {
                let literal = self.string_literal(single_quote_escape(original));
                self.call("str_rot13", vec![literal])
            }
            StringTechnique::Xor => {
                self.used_xor = true;
                let key_bytes: &[u8] = if self.xor_key.is_empty() { b"\0" } else { self.xor_key.as_bytes() };
                let xored: Vec<u8> =
                    original.as_bytes().iter().enumerate().map(|(i, b)| b ^ key_bytes[i % key_bytes.len()]).collect();
                let data_b64 = BASE64.encode(&xored);
                let key_b64 = BASE64.encode(key_bytes);
                let data = self.string_literal(data_b64);
                let key = self.string_literal(key_b64);
                self.call("_obfuscated_xor_decode", vec![data, key])
            }
        }
    }

    /// Decomposes an interpolated string into a concatenation of decoded parts.
    /// Returns `None` when the technique is empty/unrecognized (interpolated strings
    /// are left untouched in that case, deliberately) or when the decomposition
    /// would collapse to a single part identical to the original.
    fn decompose(&mut self, s: &InterpolatedString) -> Option<Expression> {
        self.technique?;

        if s.parts.len() == 1 {
            if let StringPart::BracedExpression(_) = &s.parts[0] {
                return None;
            }
        }

        let mut pieces: Vec<Expression> = Vec::with_capacity(s.parts.len());
        for part in &s.parts {
            match part {
                StringPart::Literal(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    pieces.push(self.decode_call(text));
                }
                StringPart::Variable(v) => pieces.push(Expression::Variable(v.clone())),
                StringPart::BracedExpression(inner) => pieces.push((**inner).clone()),
            }
        }

        if pieces.is_empty() {
            return Some(self.string_literal(String::new()));
        }
        if pieces.len() == 1 && s.parts.len() == 1 {
            return None;
        }

        let mut iter = pieces.into_iter();
        let mut acc = iter.next().unwrap();
        for piece in iter {
            acc = Expression::Binary(Binary { id: self.ids.fresh(), span: Span::new(0, 0), op: BinaryOp::Concat, lhs: Box::new(acc), rhs: Box::new(piece) });
        }
        Some(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObfuscatorConfig;
    use phpmix_syntax::parser::parse;
    use phpmix_syntax::printer::print_program;

    fn rewrite(source: &str, technique: &str) -> String {
        let mut result = parse(source);
        let mut config = ObfuscatorConfig::default();
        config.strings.technique = technique.to_string();
        let mut ctx = ObfuscationContext::new(config);
        let mut ids = NodeIdGen::for_program(&result.program);
        run(&mut result.program, &mut ctx, &mut ids);
        print_program(&result.program)
    }

    #[test]
    fn base64_encodes_plain_string() {
        let out = rewrite(r#"<?php echo "hello";"#, "base64");
        assert!(out.contains("base64_decode('aGVsbG8=')"), "{out}");
    }

    #[test]
    fn rot13_leaves_literal_unencoded() {
        let out = rewrite(r#"<?php echo "one"; $x = 'two';"#, "rot13");
        assert!(out.contains("str_rot13('one')"), "{out}");
        assert!(out.contains("str_rot13('two')"), "{out}");
    }

    #[test]
    fn interpolated_string_decomposes_into_concatenation() {
        let out = rewrite(r#"<?php echo "Hello $name!";"#, "base64");
        assert!(out.contains("base64_decode('SGVsbG8g')"), "{out}");
        assert!(out.contains("$name"), "{out}");
        assert!(out.contains("base64_decode('IQ==')"), "{out}");
    }

    #[test]
    fn empty_string_is_never_rewritten() {
        let out = rewrite(r#"<?php echo "";"#, "base64");
        assert!(out.contains(r#"echo "";"#) || out.contains("echo '';"), "{out}");
    }
}
