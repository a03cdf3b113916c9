//! Small helpers for emitting PHP literal text into synthesized nodes.

/// Escapes `s` for embedding inside a single-quoted PHP string literal: only `\` and
/// `'` need escaping in that context.
pub fn single_quote_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
