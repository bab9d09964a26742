//! # jtrav
//!
//! Compiles a batch of Java sources with the outline front end and translates
//! the requested units into an in-memory AST, optionally written as JSON.

use clap::{Parser, ValueEnum};
use jtrav_core::bridge::MemoryAstBuilder;
use jtrav_core::config::{build_info, ConfigError, RuntimeConfig};
use jtrav_core::filter::FilterConfig;
use jtrav_core::frontend::SourceFrontEnd;
use jtrav_core::logging::{self, codes};
use jtrav_core::pipeline::{self, PipelineConfig};
use jtrav_core::session::Session;
use log::{debug, error, info, warn};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VerboseStyle {
    /// `--verbose=<n>`
    Equals,
    /// `--verbose <n>`
    Separate,
}

#[derive(Debug, Parser)]
#[command(
    name = "jtrav",
    version,
    about = "Translate Java compilation units into a foreign AST"
)]
struct Cli {
    /// Write the translated units to this file as JSON
    #[arg(long, value_name = "FILE")]
    emit_ast: Option<PathBuf>,

    /// Emit structured JSON log events
    #[arg(long)]
    structured_logs: bool,

    /// Never prefetch sources on worker threads
    #[arg(long)]
    single_thread: bool,

    /// Prefetch worker count (defaults to the number of CPUs)
    #[arg(long, value_name = "N")]
    read_threads: Option<usize>,

    /// How the verbosity flag carries its level
    #[arg(long, value_enum, default_value_t = VerboseStyle::Equals)]
    verbose_style: VerboseStyle,

    /// Runtime preferences file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Front-end arguments: options, `--verbose` and `.java` files
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "ARGS"
    )]
    args: Vec<String>,
}

impl Cli {
    fn filter_config(&self) -> FilterConfig {
        match self.verbose_style {
            VerboseStyle::Equals => FilterConfig::default(),
            VerboseStyle::Separate => FilterConfig::separate("--verbose"),
        }
    }

    fn runtime_config(&self) -> Result<RuntimeConfig, ConfigError> {
        let mut runtime = match &self.config {
            Some(path) => RuntimeConfig::load(path)?,
            None => {
                let mut runtime = RuntimeConfig::from_env();
                runtime.front_end.read_threads = num_cpus::get();
                runtime
            }
        };

        if self.structured_logs {
            runtime.logging.use_structured_logging = true;
        }
        if self.single_thread {
            runtime.front_end.use_single_thread = true;
        }
        if let Some(threads) = self.read_threads {
            runtime.front_end.read_threads = threads;
        }
        Ok(runtime)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let runtime = cli.runtime_config()?;

    let _ = logging::config::init_runtime_preferences(runtime.logging.clone());
    logging::init_global_logging()?;
    debug!("jtrav v{} ({})", env!("CARGO_PKG_VERSION"), build_info::source_info());

    let config = PipelineConfig {
        filter: cli.filter_config(),
        front_end: runtime.front_end,
    };
    let mut session = Session::new();
    let mut front_end = SourceFrontEnd::new();
    let mut builder = MemoryAstBuilder::new();

    match pipeline::run(&mut front_end, &mut builder, &mut session, &cli.args, &config) {
        Ok(outcome) => {
            println!("{}", outcome.batch_report());

            if let Some(path) = &cli.emit_ast {
                let written = builder
                    .to_json()
                    .map_err(|e| e.to_string())
                    .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
                if let Err(message) = written {
                    jtrav_core::log_error!(codes::translation::AST_EXPORT_FAILED, &message,
                        "path" => path.display()
                    );
                    eprintln!("Failed to write {}: {}", path.display(), message);
                    return Ok(1);
                }
                info!("Wrote {} unit(s) to {}", builder.units().len(), path.display());
            }

            if outcome.error_occurred {
                warn!(
                    "{} unit(s) failed translation",
                    outcome.failures.len()
                );
                logging::print_cargo_style_summary();
            }
            Ok(outcome.exit_code())
        }
        Err(e) => {
            eprintln!("{}", e);
            logging::print_cargo_style_summary();
            Ok(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_front_end_arguments_pass_through() {
        let cli = Cli::try_parse_from([
            "jtrav",
            "--single-thread",
            "--emit-ast",
            "out.json",
            "-source",
            "1.7",
            "--verbose=3",
            "A.java",
        ])
        .unwrap();

        assert!(cli.single_thread);
        assert_eq!(cli.emit_ast, Some(PathBuf::from("out.json")));
        assert_eq!(cli.args, vec!["-source", "1.7", "--verbose=3", "A.java"]);
    }

    #[test]
    fn test_separate_verbose_style() {
        let cli = Cli::try_parse_from(["jtrav", "--verbose-style", "separate", "A.java"]).unwrap();
        assert_eq!(cli.filter_config(), FilterConfig::separate("--verbose"));
    }

    #[test]
    fn test_arguments_are_required() {
        assert!(Cli::try_parse_from(["jtrav"]).is_err());
    }

    #[test]
    fn test_flags_override_runtime_preferences() {
        let cli = Cli::try_parse_from(["jtrav", "--read-threads", "2", "--structured-logs", "A.java"])
            .unwrap();
        let runtime = cli.runtime_config().unwrap();
        assert_eq!(runtime.front_end.read_threads, 2);
        assert!(runtime.logging.use_structured_logging);
    }
}
