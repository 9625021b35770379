//! Error types for the simulation engine.
//!
//! This module provides the closed error taxonomy of §7: arithmetic faults,
//! scope/name errors, model-build errors, and the ambient I/O/format errors
//! that appear at the host boundary (config loading, report writing). All
//! errors implement the standard `Error` trait and carry enough context
//! (token, offset, resource path) for a caller to localize the fault.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Where in the model a runtime fault occurred, for error reporting.
///
/// Built up as evaluation descends into a resource: category, resource
/// name, and (for preprocess/for-loop bodies) the specific statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePath {
    pub category: Option<String>,
    pub resource: Option<String>,
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.category, &self.resource) {
            (Some(c), Some(r)) => write!(f, "{}/{}", c, r),
            (Some(c), None) => write!(f, "{}", c),
            (None, Some(r)) => write!(f, "{}", r),
            (None, None) => write!(f, "<root>"),
        }
    }
}

/// Custom error type for the simulation engine.
///
/// Covers both the closed taxonomy of §7 (arithmetic, scope, model-build
/// faults) and the ambient errors that arise at the host boundary
/// (configuration loading, report serialization).
#[derive(Debug)]
pub enum EngineError {
    /// Malformed expression source; carries the offending token text and
    /// the byte offset into the source string.
    Parse { token: String, offset: usize },

    /// A name was not found in any scope layer.
    UndefinedName(String),

    /// Attempt to bind a reserved identifier (`global`, `result`, `i`,
    /// `random`, `and`, `or`, `not`).
    ReservedName(String),

    /// A non-numeric argument reached a numeric operator. Unreachable under
    /// the current grammar (every literal and runtime value is numeric);
    /// retained so the taxonomy stays closed if the grammar ever grows a
    /// non-numeric literal form.
    TypeError(String),

    /// Division where the divisor's absolute magnitude is below `1e-300`.
    DivisionByZero,

    /// `**` with a negative base and non-integer exponent.
    DomainError(String),

    /// An arithmetic result was NaN or infinite.
    NumericOverflow,

    /// A `cases` list was exhausted without a truthy condition, at the
    /// given resource path.
    NoMatchingCase(ResourcePath),

    /// `for.aggregation` was not one of `sum`/`average`/`max`/`min`.
    InvalidAggregation(String),

    /// Structural violation detected while building a `Model`: name
    /// collisions, unsupported growth type, missing required field, or a
    /// malformed `CalcFn` (zero or multiple of `result|cases|for|exec`).
    Model(String),

    /// `$random` arguments violated `min < max`, `min <= mean <= max`, or
    /// arity != 3.
    RandomArgument(String),

    /// Evaluation of a resource failed; wraps the underlying fault together
    /// with the resource path that was being evaluated when it occurred.
    ResourceEvaluation {
        path: ResourcePath,
        source: Box<EngineError>,
    },

    /// Error occurred while reading a configuration document from disk.
    ConfigFileRead(io::Error),

    /// Error occurred while parsing a YAML configuration document.
    YamlParse(String),

    /// Error occurred while parsing a TOML configuration document.
    TomlParse(String),

    /// Error occurred while parsing a JSON configuration document.
    JsonParse(String),

    /// Configuration document has an unsupported file extension.
    UnsupportedConfigFormat(String),

    /// Error occurred while writing a report (JSON, CSV, or JSONL stream).
    ReportWrite(io::Error),

    /// Generic I/O error not covered by a more specific variant above.
    Io(io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse { token, offset } => {
                write!(f, "parse error at offset {}: unexpected token '{}'", offset, token)
            }
            EngineError::UndefinedName(name) => {
                write!(f, "undefined name: '{}'", name)
            }
            EngineError::ReservedName(name) => {
                write!(f, "'{}' is a reserved name and cannot be bound", name)
            }
            EngineError::TypeError(msg) => write!(f, "type error: {}", msg),
            EngineError::DivisionByZero => write!(f, "division by zero"),
            EngineError::DomainError(msg) => write!(f, "domain error: {}", msg),
            EngineError::NumericOverflow => {
                write!(f, "numeric overflow: result was NaN or infinite")
            }
            EngineError::NoMatchingCase(path) => {
                write!(f, "no matching case in cases list at '{}'", path)
            }
            EngineError::InvalidAggregation(agg) => {
                write!(f, "invalid for-loop aggregation: '{}'", agg)
            }
            EngineError::Model(msg) => write!(f, "model error: {}", msg),
            EngineError::RandomArgument(msg) => write!(f, "invalid $random arguments: {}", msg),
            EngineError::ResourceEvaluation { path, source } => {
                write!(f, "evaluation failed at '{}': {}", path, source)
            }
            EngineError::ConfigFileRead(e) => {
                write!(f, "failed to read configuration document: {}", e)
            }
            EngineError::YamlParse(msg) => write!(f, "failed to parse YAML document: {}", msg),
            EngineError::TomlParse(msg) => write!(f, "failed to parse TOML document: {}", msg),
            EngineError::JsonParse(msg) => write!(f, "failed to parse JSON document: {}", msg),
            EngineError::UnsupportedConfigFormat(ext) => write!(
                f,
                "unsupported configuration document format: '{}'. Use .yaml, .yml, .json, or .toml",
                ext
            ),
            EngineError::ReportWrite(e) => write!(f, "failed to write report: {}", e),
            EngineError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl StdError for EngineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EngineError::ConfigFileRead(e) | EngineError::ReportWrite(e) | EngineError::Io(e) => {
                Some(e)
            }
            EngineError::ResourceEvaluation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Io(err)
    }
}

impl EngineError {
    /// Wraps this error with the resource path that was being evaluated,
    /// unless it is already a `ResourceEvaluation` (avoids double-wrapping
    /// as the error propagates up through preprocess/body/for-loop frames).
    pub fn at_resource(self, path: ResourcePath) -> Self {
        match self {
            EngineError::ResourceEvaluation { .. } => self,
            other => EngineError::ResourceEvaluation {
                path,
                source: Box::new(other),
            },
        }
    }
}

/// Type alias for `Result` with `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;
