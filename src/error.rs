// Error handling for custom uploader templates

use std::fmt;

/// Errors raised while interpreting or compiling templates
#[derive(Debug)]
pub enum TemplateError {
    /// No registered function matches the name (or any alias)
    InvalidFunctionName(String),
    /// A function was called with fewer parameters than it requires
    MinimumParameterCount {
        function: String,
        minimum: usize,
        actual: usize,
    },
    /// A function was resolved but failed while producing its output
    FunctionFailed {
        function: String,
        source: anyhow::Error,
    },
    /// Syntax characters could not be used together
    InvalidSyntax(String),
    /// `%rf` was given something that is not a readable text file
    InvalidTextFile(String),
    /// A required item field is empty
    MissingField(&'static str),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::InvalidFunctionName(name) => {
                write!(f, "Invalid function name: {}", name)
            }
            TemplateError::MinimumParameterCount {
                function,
                minimum,
                actual,
            } => write!(
                f,
                "Minimum parameter count for function \"{}\" is {}, but {} given",
                function, minimum, actual
            ),
            TemplateError::FunctionFailed { function, source } => {
                write!(f, "Function \"{}\" failed: {:#}", function, source)
            }
            TemplateError::InvalidSyntax(msg) => write!(f, "Invalid syntax: {}", msg),
            TemplateError::InvalidTextFile(path) => {
                write!(f, "Valid text file path is required: {}", path)
            }
            TemplateError::MissingField(field) => write!(f, "{} must be configured", field),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::FunctionFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Result alias used by the parsing layers
pub type TemplateResult<T> = Result<T, TemplateError>;
