use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io { path: PathBuf, source: std::io::Error },
    DeserializingYaml(serde_norway::Error),
    SerializingYaml(serde_norway::Error),
    DeserializingToml(toml::de::Error),
    Obfuscator(phpmix_obfuscator::ObfuscatorError),
    Scrambler(phpmix_scrambler::ScramblerError),
    Walk(phpmix_walker::WalkError),
    UnknownCategory(String),
    NotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::DeserializingYaml(error) => write!(f, "failed to parse configuration: {error}"),
            Self::SerializingYaml(error) => write!(f, "failed to render configuration: {error}"),
            Self::DeserializingToml(error) => write!(f, "failed to parse configuration: {error}"),
            Self::Obfuscator(error) => write!(f, "{error}"),
            Self::Scrambler(error) => write!(f, "{error}"),
            Self::Walk(error) => write!(f, "{error}"),
            Self::UnknownCategory(name) => write!(f, "unknown identifier category `{name}`"),
            Self::NotFound(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::DeserializingYaml(error) | Self::SerializingYaml(error) => Some(error),
            Self::DeserializingToml(error) => Some(error),
            Self::Obfuscator(error) => Some(error),
            Self::Scrambler(error) => Some(error),
            Self::Walk(error) => Some(error),
            Self::UnknownCategory(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<phpmix_obfuscator::ObfuscatorError> for Error {
    fn from(error: phpmix_obfuscator::ObfuscatorError) -> Self {
        Self::Obfuscator(error)
    }
}

impl From<phpmix_scrambler::ScramblerError> for Error {
    fn from(error: phpmix_scrambler::ScramblerError) -> Self {
        Self::Scrambler(error)
    }
}

impl From<phpmix_walker::WalkError> for Error {
    fn from(error: phpmix_walker::WalkError) -> Self {
        Self::Walk(error)
    }
}
