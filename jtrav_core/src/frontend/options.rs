//! Front-end command line options

use crate::config::compile_time::front_end::MAX_PROBLEMS_PER_UNIT;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Java source level handed to the AST builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    Jdk1_1,
    Jdk1_2,
    Jdk1_3,
    Jdk1_4,
    Jdk1_5,
    Jdk1_6,
    Jdk1_7,
    Jdk1_8,
    Unknown,
}

impl LanguageLevel {
    /// Parse a `-source` value such as `1.7`, `7` or `8`
    pub fn from_option(value: &str) -> Option<Self> {
        let level = match value.trim() {
            "1.1" | "1" => Self::Jdk1_1,
            "1.2" | "2" => Self::Jdk1_2,
            "1.3" | "3" => Self::Jdk1_3,
            "1.4" | "4" => Self::Jdk1_4,
            "1.5" | "5" | "5.0" => Self::Jdk1_5,
            "1.6" | "6" | "6.0" => Self::Jdk1_6,
            "1.7" | "7" | "7.0" => Self::Jdk1_7,
            "1.8" | "8" | "8.0" => Self::Jdk1_8,
            _ => return None,
        };
        Some(level)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Jdk1_1 => "JDK1_1",
            Self::Jdk1_2 => "JDK1_2",
            Self::Jdk1_3 => "JDK1_3",
            Self::Jdk1_4 => "JDK1_4",
            Self::Jdk1_5 => "JDK1_5",
            Self::Jdk1_6 => "JDK1_6",
            Self::Jdk1_7 => "JDK1_7",
            Self::Jdk1_8 => "JDK1_8",
            Self::Unknown => "???",
        }
    }
}

impl Default for LanguageLevel {
    fn default() -> Self {
        Self::Jdk1_8
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Options understood by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    pub source_level: LanguageLevel,
    pub target_level: Option<String>,
    pub sourcepath: Vec<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub encoding: String,
    /// `None` when class files are not written (`-d none`)
    pub output_dir: Option<PathBuf>,
    pub report_warnings: bool,
    pub debug_info: bool,
    pub proceed_on_error: bool,
    pub perform_statements_recovery: bool,
    pub generate_class_files: bool,
    pub max_problems_per_unit: usize,
    /// Source files in command line order, exactly as given
    pub files: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            source_level: LanguageLevel::default(),
            target_level: None,
            sourcepath: Vec::new(),
            classpath: Vec::new(),
            encoding: "UTF-8".to_string(),
            output_dir: None,
            report_warnings: true,
            debug_info: false,
            proceed_on_error: false,
            perform_statements_recovery: true,
            generate_class_files: true,
            max_problems_per_unit: MAX_PROBLEMS_PER_UNIT,
            files: Vec::new(),
        }
    }
}

impl CompilerOptions {
    /// Parse front-end arguments (the verbosity flag must already be filtered out)
    pub fn parse(args: &[String]) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let mut value_for = |option: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| ConfigError::missing_value(option))
            };

            match arg.as_str() {
                "-source" => {
                    let value = value_for(arg)?;
                    options.source_level = parse_level(arg, &value)?;
                }
                "-target" => options.target_level = Some(value_for(arg)?),
                "-sourcepath" => options.sourcepath = split_path_list(&value_for(arg)?),
                "-classpath" | "-cp" => options.classpath = split_path_list(&value_for(arg)?),
                "-encoding" => {
                    let value = value_for(arg)?;
                    if !is_utf8_name(&value) {
                        return Err(ConfigError::UnsupportedEncoding { encoding: value });
                    }
                    options.encoding = value;
                }
                "-d" => {
                    let value = value_for(arg)?;
                    options.output_dir = if value == "none" {
                        None
                    } else {
                        Some(PathBuf::from(value))
                    };
                }
                "-maxProblems" => {
                    let value = value_for(arg)?;
                    options.max_problems_per_unit =
                        value.parse().ok().filter(|n: &usize| *n > 0).ok_or_else(|| {
                            ConfigError::InvalidValue {
                                option: arg.clone(),
                                value: value.clone(),
                            }
                        })?;
                }
                "-nowarn" => options.report_warnings = false,
                "-proceedOnError" => options.proceed_on_error = true,
                "-g" => options.debug_info = true,
                _ if arg.starts_with("-g:") => options.debug_info = arg != "-g:none",
                _ if arg.starts_with("-warn:") => {}
                _ if arg.starts_with("-1.") => {
                    options.source_level = parse_level(arg, &arg[1..])?;
                }
                _ if arg.ends_with(".java") && !arg.starts_with('-') => {
                    options.files.push(arg.clone());
                }
                _ => return Err(ConfigError::unknown_option(arg)),
            }
        }

        Ok(options)
    }
}

fn parse_level(option: &str, value: &str) -> Result<LanguageLevel, ConfigError> {
    LanguageLevel::from_option(value).ok_or_else(|| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    })
}

fn split_path_list(value: &str) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

fn is_utf8_name(encoding: &str) -> bool {
    matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8")
}
