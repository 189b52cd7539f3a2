//! Error types for Polyforce.
//!
//! Errors are split by the phase in which they occur:
//!
//! | Type | Raised by | When |
//! |---|---|---|
//! | [`DefinitionError`] | [`build_fields`](crate::build_fields), [`Polycheck::wrap`](crate::Polycheck::wrap), [`ModelBuilder::build`](crate::ModelBuilder::build) | schema construction |
//! | [`ValidationFailureSet`] | [`Enforcer::enforce`](crate::Enforcer::enforce) | before a checked body runs |
//! | [`CallError`] | the argument binder and [`CallFrame`](crate::CallFrame) accessors | calling-convention problems |
//! | [`ConfigError`] | [`Config`](crate::Config) loaders | policy declarations |
//!
//! [`PolyError`] wraps all of them and is what the public entry points return.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{ConcreteType, Value};

/// Result type alias using [`PolyError`].
pub type PolyResult<T> = Result<T, PolyError>;

/// Result type alias for schema construction.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A callable or field was declared incorrectly.
    Definition,
    /// Arguments did not match the declared types.
    Validation,
    /// The calling convention was violated.
    Call,
    /// A policy declaration could not be loaded.
    Configuration,
    /// The wrapped body itself failed.
    Callable,
}

/// The resolved type names a value was expected to have.
///
/// A single type renders as `str`; several render as a tuple of quoted names,
/// `('int', 'str')`. Serialized as a plain string or a list respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    /// Exactly one acceptable type.
    One(String),
    /// Several acceptable types, in resolution order.
    Many(Vec<String>),
}

impl Expected {
    /// Builds the expectation from a list of concrete types.
    pub fn from_types(types: &[ConcreteType]) -> Self {
        match types {
            [single] => Self::One(single.name().to_string()),
            many => Self::Many(many.iter().map(|t| t.name().to_string()).collect()),
        }
    }

    /// Returns the expected type names.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(name) => f.write_str(name),
            Self::Many(names) => {
                f.write_str("(")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{name}'")?;
                }
                if names.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One argument's type mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Name of the callable or model that rejected the argument.
    pub source: String,
    /// The offending value in serializable form.
    pub value: serde_json::Value,
    /// The parameter the value was bound to.
    #[serde(rename = "input")]
    pub parameter: String,
    /// The resolved types the value should have had.
    pub expected: Expected,
    /// Human-readable message.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a failure for `value` bound to `parameter`.
    pub fn mismatch(
        source: impl Into<String>,
        parameter: impl Into<String>,
        value: &Value,
        expected: Expected,
    ) -> Self {
        let parameter = parameter.into();
        let message = format!(
            "Expected '{expected}' for attribute '{parameter}', but received type '{}'.",
            value.type_name()
        );
        Self {
            source: source.into(),
            value: value.to_json(),
            parameter,
            expected,
            message,
        }
    }
}

/// Every validation failure collected from one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailureSet {
    failures: Vec<ValidationFailure>,
}

impl ValidationFailureSet {
    /// Wraps the failures collected for one invocation.
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    /// Returns the individual failures in binding order.
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Returns the failures as a JSON list of records with the keys
    /// `source`, `value`, `input`, `expected` and `message`.
    pub fn errors(&self) -> serde_json::Value {
        serde_json::to_value(&self.failures).unwrap_or(serde_json::Value::Array(Vec::new()))
    }

    /// Renders [`errors`](Self::errors) as a JSON string.
    pub fn to_json(&self) -> String {
        self.errors().to_string()
    }

    /// Returns the failure recorded for `parameter`, if any.
    pub fn for_parameter(&self, parameter: &str) -> Option<&ValidationFailure> {
        self.failures.iter().find(|f| f.parameter == parameter)
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ValidationFailureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.failures.len();
        let noun = if count == 1 { "error" } else { "errors" };
        match self.failures.first() {
            Some(first) => write!(f, "{count} validation {noun} for '{}'", first.source)?,
            None => write!(f, "0 validation errors")?,
        }
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.parameter, failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailureSet {}

/// Errors raised while building a schema from a declaration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    /// A parameter carries no type annotation.
    #[error("'{name}' is not typed. If you are not sure, annotate with 'Any'.")]
    MissingAnnotation {
        /// The parameter name.
        name: String,
    },

    /// The callable declares no return type.
    #[error(
        "Missing return in '{callable}'. A return value of a function should be type annotated. \
         If your function doesn't return a value or returns None, annotate it as returning 'None'."
    )]
    ReturnSignatureMissing {
        /// The callable name.
        callable: String,
    },

    /// A method or class method declares no receiver parameter.
    #[error("'{callable}' is a method but declares no receiver parameter")]
    MissingReceiver {
        /// The callable name.
        callable: String,
    },

    /// Two parameters share a name.
    #[error("duplicate parameter '{name}' in '{callable}'")]
    DuplicateParameter {
        /// The callable name.
        callable: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A field declared both a default and a default factory.
    #[error("cannot specify both default and default_factory")]
    ConflictingDefaults,

    /// A field is explicitly required but also declares a default.
    #[error("a required field cannot declare a default")]
    RequiredWithDefault,

    /// A concrete default does not satisfy the declared type.
    #[error(
        "default '{found}' for field '{field}' is not valid for the field type annotation, \
         it must be type '{expected}'"
    )]
    IncompatibleDefault {
        /// The field name.
        field: String,
        /// Type name of the offending default.
        found: String,
        /// The resolved types the default should have had.
        expected: Expected,
    },
}

impl DefinitionError {
    /// Creates a missing-annotation error.
    pub fn missing_annotation(name: impl Into<String>) -> Self {
        Self::MissingAnnotation { name: name.into() }
    }

    /// Creates a missing-return error.
    pub fn return_signature_missing(callable: impl Into<String>) -> Self {
        Self::ReturnSignatureMissing {
            callable: callable.into(),
        }
    }

    /// Creates a missing-receiver error.
    pub fn missing_receiver(callable: impl Into<String>) -> Self {
        Self::MissingReceiver {
            callable: callable.into(),
        }
    }
}

/// Errors raised by the calling convention.
#[derive(Debug, Error)]
pub enum CallError {
    /// A required argument was not supplied.
    #[error("{callable}() missing required argument: '{parameter}'")]
    MissingArgument {
        /// The callable name.
        callable: String,
        /// The missing parameter.
        parameter: String,
    },

    /// An argument was supplied both positionally and by keyword.
    #[error("{callable}() got multiple values for argument '{parameter}'")]
    DuplicateArgument {
        /// The callable name.
        callable: String,
        /// The parameter that received two values.
        parameter: String,
    },

    /// More positional arguments were supplied than can be bound.
    #[error("{callable}() takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        /// The callable name.
        callable: String,
        /// Number of positional-capable parameters.
        expected: usize,
        /// Number of positional arguments supplied.
        given: usize,
    },

    /// A keyword does not name any parameter.
    #[error("{callable}() got an unexpected keyword argument '{parameter}'")]
    UnexpectedKeyword {
        /// The callable name.
        callable: String,
        /// The unknown keyword.
        parameter: String,
    },

    /// A method was called without a receiver.
    #[error("{callable}() requires a receiver")]
    MissingReceiver {
        /// The callable name.
        callable: String,
    },

    /// A model has no method with the requested name.
    #[error("'{model}' object has no method '{method}'")]
    UnknownMethod {
        /// The model name.
        model: String,
        /// The requested method.
        method: String,
    },

    /// A bound argument could not be converted to the requested Rust type.
    #[error("argument '{parameter}' of {callable}(): {source}")]
    Conversion {
        /// The callable name.
        callable: String,
        /// The parameter being read.
        parameter: String,
        /// The conversion failure.
        source: ConversionError,
    },
}

impl CallError {
    /// Creates a missing-argument error.
    pub fn missing_argument(callable: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            callable: callable.into(),
            parameter: parameter.into(),
        }
    }

    /// Creates a missing-receiver error.
    pub fn missing_receiver(callable: impl Into<String>) -> Self {
        Self::MissingReceiver {
            callable: callable.into(),
        }
    }

    /// Creates an unknown-method error.
    pub fn unknown_method(model: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            model: model.into(),
            method: method.into(),
        }
    }
}

/// A [`Value`] could not be converted into a Rust type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("expected {expected}, found '{found}'")]
pub struct ConversionError {
    /// Description of the requested Rust type.
    pub expected: String,
    /// Runtime type of the value.
    pub found: String,
}

impl ConversionError {
    /// Creates a conversion error for `value`.
    pub fn new(expected: impl Into<String>, value: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: value.type_name().to_string(),
        }
    }
}

/// Errors raised while loading a policy declaration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension names no supported format.
    #[error("unsupported configuration format '{extension}' (expected toml or json)")]
    UnsupportedFormat {
        /// The offending extension.
        extension: String,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field with invalid value.
        field: String,
        /// Description of what's wrong.
        message: String,
    },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Umbrella error returned by the public entry points.
#[derive(Debug, Error)]
pub enum PolyError {
    /// Schema construction failed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// Arguments did not match the declared types.
    #[error(transparent)]
    Validation(#[from] ValidationFailureSet),

    /// The calling convention was violated.
    #[error(transparent)]
    Call(#[from] CallError),

    /// A policy declaration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The wrapped body failed.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PolyError {
    /// Wraps an arbitrary body failure.
    pub fn callable(message: impl fmt::Display) -> Self {
        Self::Other(anyhow::anyhow!("{message}"))
    }

    /// Returns the error category.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Definition(_) => ErrorCategory::Definition,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Call(_) => ErrorCategory::Call,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Other(_) => ErrorCategory::Callable,
        }
    }

    /// Returns the validation failures if this is a validation error.
    pub fn validation_failures(&self) -> Option<&ValidationFailureSet> {
        match self {
            Self::Validation(set) => Some(set),
            _ => None,
        }
    }

    /// Converts a failure raised inside a body.
    ///
    /// Polyforce errors (the umbrella or any of its parts) keep their kind;
    /// everything else becomes [`PolyError::Other`].
    pub fn from_body<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        let error = match error.into().downcast::<Self>() {
            Ok(poly) => return poly,
            Err(other) => other,
        };
        let error = match error.downcast::<CallError>() {
            Ok(call) => return Self::Call(call),
            Err(other) => other,
        };
        let error = match error.downcast::<ValidationFailureSet>() {
            Ok(set) => return Self::Validation(set),
            Err(other) => other,
        };
        let error = match error.downcast::<DefinitionError>() {
            Ok(definition) => return Self::Definition(definition),
            Err(other) => other,
        };
        match error.downcast::<ConfigError>() {
            Ok(config) => Self::Config(config),
            Err(other) => Self::Other(other),
        }
    }
}
