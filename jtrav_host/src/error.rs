//! Host-side failures and the status codes they cross the boundary as

use jtrav_core::logging::{codes, Code};
use std::ffi::NulError;
use std::os::raw::c_int;

/// Status codes returned by the entry points
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JtravStatus {
    Success = 0,
    Failure = 1,
    NotInitialized = 2,
    InvalidArgument = 3,
}

impl From<JtravStatus> for c_int {
    fn from(status: JtravStatus) -> Self {
        status as c_int
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("jtrav_init has not been called")]
    NotInitialized,

    #[error("Null pointer passed as {argument}")]
    NullPointer { argument: &'static str },

    #[error("Argument {argument} is not valid UTF-8")]
    InvalidUtf8 { argument: String },

    #[error("Argument contains an interior NUL byte: {0}")]
    InteriorNul(#[from] NulError),

    #[error("Logging initialization failed: {message}")]
    Logging { message: String },
}

impl HostError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::NotInitialized => codes::linkage::HOST_NOT_INITIALIZED,
            Self::Logging { .. } => codes::system::INITIALIZATION_FAILURE,
            _ => codes::linkage::INVALID_HOST_ARGUMENT,
        }
    }

    pub fn status(&self) -> JtravStatus {
        match self {
            Self::NotInitialized => JtravStatus::NotInitialized,
            Self::Logging { .. } => JtravStatus::Failure,
            _ => JtravStatus::InvalidArgument,
        }
    }
}
