use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum RankError {
    Input(String),
    Oracle {
        a: PathBuf,
        b: PathBuf,
        reason: String,
    },
    Io(std::io::Error),
    /// Another worker failed first and the pool is unwinding.
    Aborted,
    Other(String),
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankError::Input(e) => write!(f, "Input error: {}", e),
            RankError::Oracle { a, b, reason } => write!(
                f,
                "Oracle error comparing {} and {}: {}",
                a.display(),
                b.display(),
                reason
            ),
            RankError::Io(e) => write!(f, "IO error: {}", e),
            RankError::Aborted => write!(f, "Run aborted"),
            RankError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for RankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RankError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RankError {
    fn from(err: std::io::Error) -> Self {
        RankError::Io(err)
    }
}

impl From<String> for RankError {
    fn from(err: String) -> Self {
        RankError::Other(err)
    }
}

impl From<&str> for RankError {
    fn from(err: &str) -> Self {
        RankError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_error_names_both_paths() {
        let err = RankError::Oracle {
            a: PathBuf::from("sols/u1/a.cpp"),
            b: PathBuf::from("sols/u2/c.cpp"),
            reason: "exit status 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sols/u1/a.cpp"));
        assert!(msg.contains("sols/u2/c.cpp"));
        assert!(msg.contains("exit status 2"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RankError = io.into();
        assert!(matches!(err, RankError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
