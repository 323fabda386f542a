//! CLI-specific error types and exit code mapping

use std::path::PathBuf;

use tunerlink_core::error::{LinkageError, TunerLinkError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Declared hardware connections are inconsistent.
    #[error("invalid hardware linkage: {0}")]
    Linkage(#[from] LinkageError),

    /// No configuration file exists at the resolved path.
    #[error("tuner configuration not found at {}; suites are not applicable", .path.display())]
    NotApplicable { path: PathBuf },

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | General / command error          |
    /// | 2    | Configuration error              |
    /// | 3    | Invalid hardware linkage         |
    /// | 4    | Configuration absent (skip)      |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Linkage(_) => 3,
            Self::NotApplicable { .. } => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<TunerLinkError> for CliError {
    fn from(e: TunerLinkError) -> Self {
        match e {
            TunerLinkError::Config(e) => Self::Config(e.to_string()),
            TunerLinkError::Linkage(e) => Self::Linkage(e),
            TunerLinkError::Io(e) => Self::Io(e),
            TunerLinkError::Service(e) => Self::Command(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunerlink_core::error::{ConfigError, ServiceError};
    use tunerlink_core::types::{ResourceKind, ResourceRef};

    fn dangling() -> LinkageError {
        LinkageError::DanglingReference {
            index: 2,
            endpoint: ResourceRef::new(ResourceKind::Dvr, "dvr9"),
        }
    }

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_linkage_error() {
        let err = CliError::Linkage(dangling());
        assert_eq!(err.exit_code(), 3, "linkage error should return exit code 3");
    }

    #[test]
    fn test_exit_code_not_applicable() {
        let err = CliError::NotApplicable {
            path: PathBuf::from("/vendor/etc/tuner_vts_config_aidl_V1.toml"),
        };
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("/vendor/etc"));
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_exit_code_json_serialize_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json")
            .expect_err("should fail parsing");
        let err = CliError::JsonSerialize(json_err);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_from_core_config_error() {
        let core_err = TunerLinkError::Config(ConfigError::ParseFailed {
            reason: "expected `=`".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        assert_eq!(cli_err.exit_code(), 2);
        assert!(cli_err.to_string().contains("expected `=`"));
    }

    #[test]
    fn test_from_core_linkage_error_keeps_variant() {
        let cli_err: CliError = TunerLinkError::Linkage(dangling()).into();
        match cli_err {
            CliError::Linkage(e) => assert_eq!(e, dangling()),
            _ => panic!("expected Linkage error variant"),
        }
    }

    #[test]
    fn test_from_core_service_error() {
        let cli_err: CliError = TunerLinkError::Service(ServiceError::TunerUnavailable {
            instance: "default".to_owned(),
        })
        .into();
        assert_eq!(cli_err.exit_code(), 1);
    }
}
