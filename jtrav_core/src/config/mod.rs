//! Configuration module for the traversal bridge
//! Compile-time limits are generated from the TOML profile by build.rs

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod error;
pub mod runtime;

pub use error::ConfigError;
pub use runtime::{FrontEndPreferences, LogLevel, LoggingPreferences, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("JTRAV_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("JTRAV_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_time_constants_are_sane() {
        assert!(compile_time::front_end::PARSE_THRESHOLD > 0);
        assert!(compile_time::front_end::READ_MANAGER_THRESHOLD > 0);
        assert!(compile_time::batch::MAX_READ_THREADS > 0);
        assert!(
            compile_time::logging::MAX_LOG_EVENTS_PER_FILE
                <= compile_time::logging::LOG_BUFFER_SIZE
        );
    }

    #[test]
    fn test_build_info() {
        assert!(build_info::source_info().ends_with(".toml"));
    }
}
