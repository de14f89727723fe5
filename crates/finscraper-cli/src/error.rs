use finscraper_core::{ApiErrorKind, ScraperError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Scraper(ScraperError::Validation(_)) => 2,
            Self::Scraper(ScraperError::Storage(_)) => 10,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

/// Exit code for a command whose result object reported a failure.
pub const fn exit_code_for(kind: ApiErrorKind) -> u8 {
    match kind {
        ApiErrorKind::AlreadyExists => 0,
        ApiErrorKind::Validation | ApiErrorKind::FormatUnavailable => 2,
        ApiErrorKind::Resolution | ApiErrorKind::NotFound | ApiErrorKind::PartialFailure => 3,
        ApiErrorKind::Serialization => 4,
        ApiErrorKind::Storage | ApiErrorKind::Export => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_documented_codes() {
        assert_eq!(exit_code_for(ApiErrorKind::Validation), 2);
        assert_eq!(exit_code_for(ApiErrorKind::PartialFailure), 3);
        assert_eq!(exit_code_for(ApiErrorKind::Storage), 10);
        assert_eq!(exit_code_for(ApiErrorKind::AlreadyExists), 0);
    }
}
