use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum WalkError {
    Io { path: PathBuf, source: std::io::Error },
    Canonicalize { path: PathBuf, source: std::io::Error },
    BrokenSymlink { path: PathBuf },
    Scrambler(phpmix_scrambler::ScramblerError),
    Obfuscator { path: PathBuf, source: phpmix_obfuscator::ObfuscatorError },
    InvalidGlob { pattern: String, source: globset::Error },
    /// `clean` was requested but `path` resolves to a filesystem root, the current
    /// directory, or a parent of it.
    RefusedCleanTarget(PathBuf),
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Canonicalize { path, source } => write!(f, "failed to canonicalize `{}`: {source}", path.display()),
            Self::BrokenSymlink { path } => write!(f, "broken symlink at `{}`", path.display()),
            Self::Scrambler(error) => write!(f, "{error}"),
            Self::Obfuscator { path, source } => write!(f, "{}: {source}", path.display()),
            Self::InvalidGlob { pattern, source } => write!(f, "invalid glob pattern `{pattern}`: {source}"),
            Self::RefusedCleanTarget(path) => {
                write!(f, "refusing to clean `{}`: resolves to a root, the current directory, or a parent of it", path.display())
            }
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Canonicalize { source, .. } => Some(source),
            Self::Scrambler(error) => Some(error),
            Self::Obfuscator { source, .. } => Some(source),
            Self::InvalidGlob { source, .. } => Some(source),
            Self::BrokenSymlink { .. } | Self::RefusedCleanTarget(_) => None,
        }
    }
}

impl From<phpmix_scrambler::ScramblerError> for WalkError {
    fn from(error: phpmix_scrambler::ScramblerError) -> Self {
        Self::Scrambler(error)
    }
}
