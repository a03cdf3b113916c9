//! Error taxonomy for this crate: the subset of the seven kinds that
//! originate inside the pipeline itself — `parse-fatal`, `parse-recoverable` surfaced
//! as a warning rather than an error, and `pass-internal`. `io`, `persistence`, and
//! `not-found` belong to the walker and the root binary respectively.

use phpmix_syntax::ParseError;

#[derive(Debug)]
pub enum ObfuscatorError {
    /// The parser produced at least one fatal diagnostic; no usable tree exists.
    ParseFatal(Vec<ParseError>),
    /// A pass's own invariants broke (e.g. a helper was required but never emitted).
    PassInternal(String),
}

impl std::fmt::Display for ObfuscatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFatal(diagnostics) => {
                write!(f, "parsing failed with {} fatal diagnostic(s):", diagnostics.len())?;
                for diagnostic in diagnostics {
                    write!(f, "\n  - {}", diagnostic.message)?;
                }
                Ok(())
            }
            Self::PassInternal(message) => write!(f, "pass failed: {message}"),
        }
    }
}

impl std::error::Error for ObfuscatorError {}
