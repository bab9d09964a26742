use crate::config::runtime::RuntimeConfigError;
use crate::logging::{codes, Code};

/// Command line and preference errors; all of them stop the run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid verbosity flag '{flag}': '{value}' is not a non-negative integer")]
    InvalidVerbosity { flag: String, value: String },

    #[error("Option '{option}' requires a value")]
    MissingValue { option: String },

    #[error("Unrecognized option '{option}'")]
    UnknownOption { option: String },

    #[error("Unsupported encoding '{encoding}', sources must be UTF-8")]
    UnsupportedEncoding { encoding: String },

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },

    #[error("Runtime preferences could not be loaded: {message}")]
    RuntimePreferences { message: String },
}

impl ConfigError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::InvalidVerbosity { .. } => codes::config::INVALID_VERBOSITY,
            Self::MissingValue { .. } => codes::config::MISSING_OPTION_VALUE,
            Self::UnknownOption { .. } => codes::config::UNKNOWN_OPTION,
            Self::UnsupportedEncoding { .. } => codes::config::UNSUPPORTED_ENCODING,
            Self::InvalidValue { .. } => codes::config::INVALID_OPTION_VALUE,
            Self::RuntimePreferences { .. } => codes::config::INVALID_RUNTIME_CONFIG,
        }
    }

    pub fn missing_value(option: &str) -> Self {
        Self::MissingValue {
            option: option.to_string(),
        }
    }

    pub fn unknown_option(option: &str) -> Self {
        Self::UnknownOption {
            option: option.to_string(),
        }
    }
}

impl From<RuntimeConfigError> for ConfigError {
    fn from(error: RuntimeConfigError) -> Self {
        Self::RuntimePreferences {
            message: error.to_string(),
        }
    }
}
