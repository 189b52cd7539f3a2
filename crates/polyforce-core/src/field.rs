//! Field descriptors.
//!
//! A [`Field`] is the checked contract of one parameter. Fields are normally
//! produced by [`build_fields`](crate::build_fields); a parameter can refine
//! its field by declaring a [`FieldSpec`] as its default:
//!
//! ```rust
//! use polyforce_core::{FieldOptions, Parameter, TypeHint, Value};
//!
//! let spec = FieldOptions::new()
//!     .with_default_factory(|| Value::from(Vec::<Value>::new()))
//!     .title("Tags")
//!     .build()
//!     .unwrap();
//! let param = Parameter::typed("tags", TypeHint::list_of(TypeHint::str())).with_field(spec);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::{DefinitionError, DefinitionResult, Expected};
use crate::hint::{ResolvedTypes, TypeHint};
use crate::signature::ParamKind;
use crate::value::{ConcreteType, Value};

/// Produces a fresh default value on every call that omits the argument.
pub trait ProduceDefault: Send + Sync {
    /// Produces the default.
    fn produce(&self) -> Value;
}

impl<F> ProduceDefault for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn produce(&self) -> Value {
        self()
    }
}

/// A shared default producer.
#[derive(Clone)]
pub struct DefaultFactory(Arc<dyn ProduceDefault>);

impl DefaultFactory {
    /// Wraps a producer.
    pub fn new(producer: impl ProduceDefault + 'static) -> Self {
        Self(Arc::new(producer))
    }

    /// Invokes the producer.
    pub fn produce(&self) -> Value {
        self.0.produce()
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultFactory(..)")
    }
}

/// How a missing argument is filled in.
#[derive(Debug, Clone, Default)]
pub enum FieldDefault {
    /// No default: the argument must be supplied.
    #[default]
    Undefined,
    /// A concrete value, cloned per call.
    Value(Value),
    /// A producer, invoked per call.
    Factory(DefaultFactory),
}

impl FieldDefault {
    /// Returns `true` if there is no default.
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Materializes the default for one call.
    pub fn get(&self) -> Option<Value> {
        match self {
            Self::Undefined => None,
            Self::Value(value) => Some(value.clone()),
            Self::Factory(factory) => Some(factory.produce()),
        }
    }
}

/// Options accepted by the field declaration entry point.
///
/// Converted into a validated [`FieldSpec`] with [`FieldOptions::build`].
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// A concrete default.
    pub default: Option<Value>,
    /// A default producer.
    pub default_factory: Option<DefaultFactory>,
    /// Display title.
    pub title: Option<String>,
    /// Display description.
    pub description: Option<String>,
    /// Explicit requiredness; derived from the defaults when unset.
    pub required: Option<bool>,
}

impl FieldOptions {
    /// Creates empty options: a required field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a concrete default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets a default producer.
    pub fn with_default_factory(mut self, producer: impl ProduceDefault + 'static) -> Self {
        self.default_factory = Some(DefaultFactory::new(producer));
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets requiredness explicitly.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Validates the options.
    pub fn build(self) -> DefinitionResult<FieldSpec> {
        let default = match (self.default, self.default_factory) {
            (Some(_), Some(_)) => return Err(DefinitionError::ConflictingDefaults),
            (Some(value), None) => FieldDefault::Value(value),
            (None, Some(factory)) => FieldDefault::Factory(factory),
            (None, None) => FieldDefault::Undefined,
        };
        if self.required == Some(true) && !default.is_undefined() {
            return Err(DefinitionError::RequiredWithDefault);
        }
        Ok(FieldSpec {
            default,
            title: self.title,
            description: self.description,
            required: self.required,
        })
    }
}

/// A validated field declaration, not yet bound to a name or type.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    default: FieldDefault,
    title: Option<String>,
    description: Option<String>,
    required: Option<bool>,
}

impl FieldSpec {
    /// A required field with no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default.
    pub fn default_value(&self) -> &FieldDefault {
        &self.default
    }

    /// Returns `true` unless a default exists or the declaration says otherwise.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or_else(|| self.default.is_undefined())
    }
}

/// The checked contract of one parameter.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: ParamKind,
    declared_type: TypeHint,
    default: FieldDefault,
    title: Option<String>,
    description: Option<String>,
    required: bool,
    metadata: Vec<Value>,
}

impl Field {
    /// Builds a field, validating any concrete default against `declared_type`.
    pub fn build(
        name: impl Into<String>,
        declared_type: TypeHint,
        spec: FieldSpec,
    ) -> DefinitionResult<Self> {
        Self::from_parts(
            name.into(),
            ParamKind::PositionalOrKeyword,
            declared_type,
            spec,
            &IndexSet::new(),
        )
    }

    /// Assembles a field. `Annotated` layers are moved into the metadata.
    pub(crate) fn from_parts(
        name: String,
        kind: ParamKind,
        declared_type: TypeHint,
        spec: FieldSpec,
        exempt_types: &IndexSet<ConcreteType>,
    ) -> DefinitionResult<Self> {
        let (declared_type, metadata) = declared_type.strip_annotations();
        let exempt = declared_type
            .identity()
            .is_some_and(|ty| exempt_types.contains(ty));
        let declared_type = if exempt {
            TypeHint::exempt(declared_type)
        } else {
            declared_type
        };

        if let FieldDefault::Value(value) = &spec.default {
            if let ResolvedTypes::OneOf(types) = declared_type.resolve(exempt_types) {
                if !types.contains(&value.type_of()) {
                    return Err(DefinitionError::IncompatibleDefault {
                        field: name,
                        found: value.type_name().to_string(),
                        expected: Expected::from_types(&types),
                    });
                }
            }
        }

        let required = spec.is_required();
        Ok(Self {
            name,
            kind,
            declared_type,
            default: spec.default,
            title: spec.title,
            description: spec.description,
            required,
            metadata,
        })
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of the parameter this field describes.
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the declared type, with annotations stripped.
    pub fn declared_type(&self) -> &TypeHint {
        &self.declared_type
    }

    /// Returns the default policy.
    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    /// Returns `true` if a default or producer exists.
    pub const fn has_default(&self) -> bool {
        !self.default.is_undefined()
    }

    /// Returns the title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns `true` if the argument must be supplied.
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the `Annotated` metadata payloads.
    pub fn metadata(&self) -> &[Value] {
        &self.metadata
    }

    /// Resolves the declared type under `exempt_types`.
    pub fn resolved_types(&self, exempt_types: &IndexSet<ConcreteType>) -> ResolvedTypes {
        self.declared_type.resolve(exempt_types)
    }
}
