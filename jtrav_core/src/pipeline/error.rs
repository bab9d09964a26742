use crate::bridge::{BuilderError, LinkageError};
use crate::config::ConfigError;
use crate::logging::{codes, Code};
use crate::processor::FrontEndDiagnosticError;

/// Errors that end a traversal run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),

    #[error("ECJ front-end errors detected in input java program ({count} global error(s))")]
    GlobalErrors { count: usize },

    #[error("ECJ front-end errors detected in input java program: {0}")]
    Diagnostics(#[from] FrontEndDiagnosticError),

    #[error("Native linkage failed: {0}")]
    Linkage(#[from] LinkageError),

    #[error("Builder failed at batch boundary: {0}")]
    Builder(#[from] BuilderError),
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Config(e) => e.error_code(),
            Self::GlobalErrors { .. } => codes::front_end::GLOBAL_ERRORS,
            Self::Diagnostics(e) => e.error_code(),
            Self::Linkage(e) => e.error_code(),
            Self::Builder(BuilderError::Linkage { .. }) => codes::linkage::NATIVE_LINKAGE_FAILURE,
            Self::Builder(BuilderError::Rejected { .. }) => codes::translation::TRANSLATION_FAILED,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_one() {
        let errors = vec![
            PipelineError::from(ConfigError::unknown_option("-bogus")),
            PipelineError::GlobalErrors { count: 2 },
            PipelineError::from(FrontEndDiagnosticError {
                file_name: "A.java".to_string(),
                error_count: 1,
                has_syntax_error: true,
            }),
            PipelineError::from(BuilderError::rejected("batch", "closed")),
        ];
        for error in errors {
            assert_eq!(error.exit_code(), 1, "{}", error);
        }
    }

    #[test]
    fn test_error_codes_follow_the_cause() {
        assert_eq!(
            PipelineError::GlobalErrors { count: 1 }.error_code(),
            codes::front_end::GLOBAL_ERRORS
        );
        assert_eq!(
            PipelineError::from(BuilderError::Linkage {
                entry_point: "end_batch".to_string()
            })
            .error_code(),
            codes::linkage::NATIVE_LINKAGE_FAILURE
        );
    }
}
