use thiserror::Error;

/// Everything the version lifecycle engine can fail with.
#[derive(Error, Debug)]
pub enum GoenvError {
    #[error("Network error while fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Go version {0} is not installed. Please install it first.")]
    NotInstalled(String),

    #[error("Go version {0} is already installed.")]
    AlreadyInstalled(String),

    #[error("Cannot uninstall Go version {0} because it is currently active and no other version is installed.")]
    NoAlternativeVersion(String),

    #[error("Unsupported shell `{0}`, the startup file was not updated")]
    UnsupportedShell(String),

    #[error("Checksum mismatch for {file}: expected {expected}, found {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GoenvError {
    pub(crate) fn network(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        GoenvError::Network { url: url.to_string(), source: source.into() }
    }

    pub(crate) fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        GoenvError::Decode { what: what.into(), reason: reason.to_string() }
    }

    /// Expected business outcomes: reported to the user, never a failed run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GoenvError::NotInstalled(_)
                | GoenvError::AlreadyInstalled(_)
                | GoenvError::NoAlternativeVersion(_)
                | GoenvError::UnsupportedShell(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GoenvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_outcomes_are_recoverable() {
        assert!(GoenvError::NotInstalled("1.21.5".into()).is_recoverable());
        assert!(GoenvError::AlreadyInstalled("1.21.5".into()).is_recoverable());
        assert!(GoenvError::NoAlternativeVersion("1.21.5".into()).is_recoverable());
        assert!(GoenvError::UnsupportedShell("fish".into()).is_recoverable());
    }

    #[test]
    fn test_faults_are_not_recoverable() {
        let io = GoenvError::from(std::io::Error::other("boom"));
        assert!(!io.is_recoverable());
        assert!(!GoenvError::decode("archive", "bad gzip header").is_recoverable());
        assert!(!GoenvError::Config("bad".into()).is_recoverable());
    }
}
