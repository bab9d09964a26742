// build.rs - TOML-driven constant generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    front_end: FrontEndLimits,
    batch: BatchLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FrontEndLimits {
    parse_threshold: usize,
    read_manager_threshold: usize,
    max_problems_per_unit: usize,
    max_source_file_size: u64,
}

#[derive(serde::Deserialize)]
struct BatchLimits {
    max_read_threads: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_error_collection: usize,
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_file: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=JTRAV_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=JTRAV_CONFIG_DIR");

    let profile = env::var("JTRAV_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("JTRAV_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of jtrav_core
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_SOURCE_SIZE: u64 = 1_000_000_000;

    if config.front_end.parse_threshold == 0 {
        panic!("CONFIG: parse_threshold must be at least 1");
    }

    if config.front_end.read_manager_threshold == 0 {
        panic!("CONFIG: read_manager_threshold must be at least 1");
    }

    if config.front_end.max_source_file_size > ABSOLUTE_MAX_SOURCE_SIZE {
        panic!("CONFIG: max_source_file_size exceeds absolute maximum");
    }

    if config.batch.max_read_threads == 0 {
        panic!("CONFIG: max_read_threads must be at least 1");
    }

    if config.logging.max_log_events_per_file > config.logging.log_buffer_size {
        panic!("CONFIG: max_log_events_per_file exceeds log_buffer_size");
    }

    if config.logging.max_error_collection < config.logging.max_log_events_per_file {
        panic!("CONFIG: max_error_collection is smaller than max_log_events_per_file");
    }

    if profile == "production" && config.front_end.max_source_file_size > 50_000_000 {
        panic!("PRODUCTION: max_source_file_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod front_end {{
        pub const PARSE_THRESHOLD: usize = {};
        pub const READ_MANAGER_THRESHOLD: usize = {};
        pub const MAX_PROBLEMS_PER_UNIT: usize = {};
        pub const MAX_SOURCE_FILE_SIZE: u64 = {};
    }}

    pub mod batch {{
        pub const MAX_READ_THREADS: usize = {};
    }}

    pub mod logging {{
        pub const MAX_ERROR_COLLECTION: usize = {};
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MAX_LOG_EVENTS_PER_FILE: usize = {};
    }}
}}
"#,
        profile,
        config.front_end.parse_threshold,
        config.front_end.read_manager_threshold,
        config.front_end.max_problems_per_unit,
        config.front_end.max_source_file_size,
        config.batch.max_read_threads,
        config.logging.max_error_collection,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.max_log_events_per_file,
    );

    fs::write(output_path, constants_code).unwrap();
}
