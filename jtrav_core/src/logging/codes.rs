//! Error and success codes with their classification metadata
//!
//! Every error code the bridge emits has a row in [`ERROR_TABLE`] giving its
//! category, severity, recoverability and the action an operator should take.

use std::fmt;

/// Error or success code as printed in diagnostics, e.g. `E022`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Which stage of a batch raised the error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    System,
    Configuration,
    FrontEnd,
    Translation,
    Linkage,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::System => "System",
            Category::Configuration => "Configuration",
            Category::FrontEnd => "FrontEnd",
            Category::Translation => "Translation",
            Category::Linkage => "Linkage",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorMetadata {
    pub code: Code,
    pub category: Category,
    pub severity: Severity,
    /// Later units of the same batch can still be translated
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    /// Unrecoverable errors stop the batch
    pub fn requires_halt(&self) -> bool {
        !self.recoverable
    }
}

/// Runtime system errors
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Command line and option errors
pub mod config {
    use super::Code;

    pub const INVALID_VERBOSITY: Code = Code::new("E010");
    pub const MISSING_OPTION_VALUE: Code = Code::new("E011");
    pub const UNKNOWN_OPTION: Code = Code::new("E012");
    pub const UNSUPPORTED_ENCODING: Code = Code::new("E013");
    pub const INVALID_RUNTIME_CONFIG: Code = Code::new("E014");
    pub const INVALID_OPTION_VALUE: Code = Code::new("E015");
}

/// Front-end diagnostics
pub mod front_end {
    use super::Code;

    pub const SOURCE_READ_FAILURE: Code = Code::new("E020");
    pub const SOURCE_TOO_LARGE: Code = Code::new("E021");
    pub const SYNTAX_ERROR: Code = Code::new("E022");
    pub const UNRESOLVED_IMPORT: Code = Code::new("E023");
    pub const DUPLICATE_TYPE: Code = Code::new("E024");
    pub const PUBLIC_TYPE_FILE_MISMATCH: Code = Code::new("E025");
    pub const DUPLICATE_MEMBER: Code = Code::new("E026");
    pub const GLOBAL_ERRORS: Code = Code::new("E027");
    pub const UNIT_DIAGNOSTICS: Code = Code::new("E028");
}

/// Translation into the foreign AST
pub mod translation {
    use super::Code;

    pub const TRANSLATION_FAILED: Code = Code::new("E040");
    pub const AST_EXPORT_FAILED: Code = Code::new("E041");
}

/// Native boundary errors
pub mod linkage {
    use super::Code;

    pub const NATIVE_LINKAGE_FAILURE: Code = Code::new("E050");
    pub const HOST_NOT_INITIALIZED: Code = Code::new("E051");
    pub const INVALID_HOST_ARGUMENT: Code = Code::new("E052");
}

/// Success codes, logged at info level
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const FRONT_END_CONFIGURED: Code = Code::new("I010");
    pub const BATCH_COMPILED: Code = Code::new("I020");
    pub const UNIT_PROCESSED: Code = Code::new("I030");
    pub const UNIT_TRANSLATED: Code = Code::new("I040");
    pub const BATCH_TRANSLATED: Code = Code::new("I041");
    pub const BATCH_ACCEPTED: Code = Code::new("I050");
}

const fn row(
    code: Code,
    category: Category,
    severity: Severity,
    recoverable: bool,
    description: &'static str,
    recommended_action: &'static str,
) -> ErrorMetadata {
    ErrorMetadata {
        code,
        category,
        severity,
        recoverable,
        description,
        recommended_action,
    }
}

use Category::*;
use Severity::*;

#[rustfmt::skip]
pub const ERROR_TABLE: &[ErrorMetadata] = &[
    row(system::INTERNAL_ERROR, System, Critical, false,
        "Critical internal error",
        "File a bug report with the failing command line"),
    row(system::INITIALIZATION_FAILURE, System, Critical, false,
        "Initialization failure",
        "Check configuration and that initialization runs once per process"),
    row(config::INVALID_VERBOSITY, Configuration, High, false,
        "Verbosity flag payload is not a non-negative integer",
        "Pass the verbosity flag with an integer level, e.g. --verbose=2"),
    row(config::MISSING_OPTION_VALUE, Configuration, High, false,
        "Option is missing its value",
        "Supply a value after the option"),
    row(config::UNKNOWN_OPTION, Configuration, High, false,
        "Unrecognized front-end option",
        "Remove the option or check its spelling"),
    row(config::UNSUPPORTED_ENCODING, Configuration, High, false,
        "Unsupported source encoding",
        "Convert sources to UTF-8"),
    row(config::INVALID_RUNTIME_CONFIG, Configuration, High, false,
        "Runtime preferences file could not be loaded",
        "Fix the TOML syntax or remove the preferences file"),
    row(config::INVALID_OPTION_VALUE, Configuration, High, false,
        "Option value is not valid for the option",
        "Use one of the documented values, e.g. -source 1.8"),
    row(front_end::SOURCE_READ_FAILURE, FrontEnd, High, false,
        "Source file could not be read",
        "Check that the file exists and is readable"),
    row(front_end::SOURCE_TOO_LARGE, FrontEnd, High, false,
        "Source file exceeds the configured size limit",
        "Split the file or raise max_source_file_size"),
    row(front_end::SYNTAX_ERROR, FrontEnd, High, false,
        "Syntax error in compilation unit",
        "Fix the reported syntax error"),
    row(front_end::UNRESOLVED_IMPORT, FrontEnd, High, false,
        "Import cannot be resolved",
        "Add the missing source to -sourcepath or pass a -classpath"),
    row(front_end::DUPLICATE_TYPE, FrontEnd, High, false,
        "Type is declared more than once in the batch",
        "Remove the duplicate declaration"),
    row(front_end::PUBLIC_TYPE_FILE_MISMATCH, FrontEnd, High, false,
        "Public type must be declared in a file of the same name",
        "Rename the file or the type"),
    row(front_end::DUPLICATE_MEMBER, FrontEnd, High, false,
        "Member is declared more than once in a type",
        "Remove the duplicate member"),
    row(front_end::GLOBAL_ERRORS, FrontEnd, Critical, false,
        "Front end reported global errors",
        "Resolve the reported front-end errors before translating"),
    row(front_end::UNIT_DIAGNOSTICS, FrontEnd, Critical, false,
        "Compilation unit has errors; batch aborted before translation",
        "Fix the unit's diagnostics and rerun the batch"),
    row(translation::TRANSLATION_FAILED, Translation, Medium, true,
        "Compilation unit could not be translated",
        "Inspect the builder diagnostics for the failing node"),
    row(translation::AST_EXPORT_FAILED, Translation, Medium, true,
        "Translated AST could not be exported",
        "Check the output path and disk space"),
    row(linkage::NATIVE_LINKAGE_FAILURE, Linkage, Critical, false,
        "Native AST builder entry point unavailable",
        "Make sure the signatures of all native callbacks match their declarations"),
    row(linkage::HOST_NOT_INITIALIZED, Linkage, Critical, false,
        "Host entry point called before initialization",
        "Call jtrav_init before any other entry point"),
    row(linkage::INVALID_HOST_ARGUMENT, Linkage, High, false,
        "Invalid argument passed across the native boundary",
        "Pass valid NUL-terminated UTF-8 strings"),
];

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    ERROR_TABLE.iter().find(|row| row.code.as_str() == code)
}

/// Unknown codes are treated as medium severity
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code).map_or(Medium, |m| m.severity)
}

/// Unknown codes are treated as recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code).map_or(true, |m| m.recoverable)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code).is_some_and(ErrorMetadata::requires_halt)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code).map_or("Unknown error", |m| m.description)
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code).map_or("No specific action available", |m| m.recommended_action)
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code).map_or("Unknown", |m| m.category.as_str())
}
