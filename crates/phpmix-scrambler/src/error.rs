use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ScramblerError {
    Io { path: PathBuf, source: std::io::Error },
    Corrupt { path: PathBuf, message: String },
}

impl fmt::Display for ScramblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScramblerError::Io { path, source } => write!(f, "failed to access `{}`: {source}", path.display()),
            ScramblerError::Corrupt { path, message } => {
                write!(f, "corrupt scrambler file `{}`: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ScramblerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScramblerError::Io { source, .. } => Some(source),
            ScramblerError::Corrupt { .. } => None,
        }
    }
}
