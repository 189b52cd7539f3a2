//! Callable signatures.
//!
//! A [`Signature`] is the declared shape of a callable: its name, whether it
//! takes a receiver, its parameters in declaration order and its return hint.
//! It is the input to [`build_fields`](crate::build_fields) and to the
//! argument binder.

use serde::Serialize;

use crate::field::FieldSpec;
use crate::hint::TypeHint;
use crate::value::Value;

/// Name of the receiver parameter inserted by [`Signature::method`].
pub const SELF_RECEIVER: &str = "self";

/// Name of the receiver parameter inserted by [`Signature::class_method`].
pub const CLASS_RECEIVER: &str = "cls";

/// How a callable is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallableKind {
    /// A free function.
    Function,
    /// An instance method; the first parameter is the instance.
    Method,
    /// A class method; the first parameter is the class.
    ClassMethod,
    /// A static method; no receiver.
    StaticMethod,
}

impl CallableKind {
    /// Returns `true` if the first declared parameter is a receiver.
    pub const fn has_receiver(self) -> bool {
        matches!(self, Self::Method | Self::ClassMethod)
    }
}

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Positional only.
    PositionalOnly,
    /// Positional or keyword.
    PositionalOrKeyword,
    /// Keyword only.
    KeywordOnly,
    /// Collects extra positional arguments.
    VarPositional,
    /// Collects extra keyword arguments.
    VarKeyword,
}

impl ParamKind {
    /// Returns `true` for the collecting kinds.
    pub const fn is_variadic(self) -> bool {
        matches!(self, Self::VarPositional | Self::VarKeyword)
    }

    /// Returns `true` if a positional argument can bind to this kind.
    pub const fn accepts_positional(self) -> bool {
        matches!(self, Self::PositionalOnly | Self::PositionalOrKeyword)
    }

    /// Returns `true` if a keyword argument can bind to this kind by name.
    pub const fn accepts_keyword(self) -> bool {
        matches!(self, Self::PositionalOrKeyword | Self::KeywordOnly)
    }
}

/// A parameter's declared default.
#[derive(Debug, Clone, Default)]
pub enum ParamDefault {
    /// No default.
    #[default]
    Empty,
    /// A literal default.
    Value(Value),
    /// A field declaration.
    Field(FieldSpec),
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    annotation: Option<TypeHint>,
    default: ParamDefault,
}

impl Parameter {
    /// An unannotated positional-or-keyword parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation: None,
            default: ParamDefault::Empty,
        }
    }

    /// An annotated positional-or-keyword parameter.
    pub fn typed(name: impl Into<String>, hint: TypeHint) -> Self {
        Self::new(name).with_annotation(hint)
    }

    /// Sets the annotation.
    pub fn with_annotation(mut self, hint: TypeHint) -> Self {
        self.annotation = Some(hint);
        self
    }

    /// Sets a literal default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = ParamDefault::Value(value.into());
        self
    }

    /// Uses a field declaration as the default.
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.default = ParamDefault::Field(spec);
        self
    }

    /// Sets the parameter kind.
    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    /// Makes the parameter positional only.
    pub fn positional_only(self) -> Self {
        self.with_kind(ParamKind::PositionalOnly)
    }

    /// Makes the parameter keyword only.
    pub fn keyword_only(self) -> Self {
        self.with_kind(ParamKind::KeywordOnly)
    }

    /// Makes the parameter collect extra positional arguments.
    pub fn var_positional(self) -> Self {
        self.with_kind(ParamKind::VarPositional)
    }

    /// Makes the parameter collect extra keyword arguments.
    pub fn var_keyword(self) -> Self {
        self.with_kind(ParamKind::VarKeyword)
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind.
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the annotation.
    pub fn annotation(&self) -> Option<&TypeHint> {
        self.annotation.as_ref()
    }

    /// Returns the declared default.
    pub fn default(&self) -> &ParamDefault {
        &self.default
    }

    /// Returns `true` if a missing argument can be filled in.
    pub fn has_default(&self) -> bool {
        match &self.default {
            ParamDefault::Empty => false,
            ParamDefault::Value(_) => true,
            ParamDefault::Field(spec) => !spec.default_value().is_undefined(),
        }
    }

    /// Materializes the declared default for one call.
    pub(crate) fn default_for_call(&self) -> Option<Value> {
        match &self.default {
            ParamDefault::Empty => None,
            ParamDefault::Value(value) => Some(value.clone()),
            ParamDefault::Field(spec) => spec.default_value().get(),
        }
    }
}

/// The declared shape of a callable.
///
/// ```rust
/// use polyforce_core::{CallableKind, Signature, TypeHint};
///
/// let sig = Signature::method("add_actor")
///     .arg("actor", TypeHint::class("Actor"))
///     .returns(TypeHint::none());
///
/// assert_eq!(sig.kind(), CallableKind::Method);
/// assert_eq!(sig.parameters().len(), 2);
/// assert_eq!(sig.declared_parameters()[0].name(), "actor");
/// ```
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    kind: CallableKind,
    parameters: Vec<Parameter>,
    returns: Option<TypeHint>,
}

impl Signature {
    /// A signature with no parameters. No receiver is inserted.
    pub fn new(name: impl Into<String>, kind: CallableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            returns: None,
        }
    }

    /// A free function.
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(name, CallableKind::Function)
    }

    /// An instance method with a `self` receiver.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, CallableKind::Method).param(Parameter::new(SELF_RECEIVER))
    }

    /// A class method with a `cls` receiver.
    pub fn class_method(name: impl Into<String>) -> Self {
        Self::new(name, CallableKind::ClassMethod).param(Parameter::new(CLASS_RECEIVER))
    }

    /// A static method.
    pub fn static_method(name: impl Into<String>) -> Self {
        Self::new(name, CallableKind::StaticMethod)
    }

    /// Appends a parameter.
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends an annotated parameter.
    pub fn arg(self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.param(Parameter::typed(name, hint))
    }

    /// Appends an annotated parameter with a literal default.
    pub fn arg_with_default(
        self,
        name: impl Into<String>,
        hint: TypeHint,
        default: impl Into<Value>,
    ) -> Self {
        self.param(Parameter::typed(name, hint).with_default(default))
    }

    /// Sets the return hint.
    pub fn returns(mut self, hint: TypeHint) -> Self {
        self.returns = Some(hint);
        self
    }

    /// Renames the callable.
    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the callable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the binding kind.
    pub const fn kind(&self) -> CallableKind {
        self.kind
    }

    /// Returns every declared parameter, receiver included.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the receiver parameter of methods and class methods.
    pub fn receiver(&self) -> Option<&Parameter> {
        if self.kind.has_receiver() {
            self.parameters.first()
        } else {
            None
        }
    }

    /// Returns the parameters that bind call arguments, receiver excluded.
    pub fn declared_parameters(&self) -> &[Parameter] {
        if self.kind.has_receiver() && !self.parameters.is_empty() {
            &self.parameters[1..]
        } else {
            &self.parameters
        }
    }

    /// Returns the return hint.
    pub fn return_annotation(&self) -> Option<&TypeHint> {
        self.returns.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldOptions;

    #[test]
    fn test_method_inserts_receiver() {
        let sig = Signature::method("greet").arg("name", TypeHint::str());
        assert_eq!(sig.receiver().map(Parameter::name), Some("self"));
        assert_eq!(sig.declared_parameters().len(), 1);

        let sig = Signature::class_method("create");
        assert_eq!(sig.receiver().map(Parameter::name), Some("cls"));
        assert!(sig.declared_parameters().is_empty());
    }

    #[test]
    fn test_static_and_function_have_no_receiver() {
        let sig = Signature::static_method("util").arg("x", TypeHint::int());
        assert!(sig.receiver().is_none());
        assert_eq!(sig.declared_parameters().len(), 1);
        assert!(Signature::function("f").receiver().is_none());
    }

    #[test]
    fn test_parameter_kinds() {
        assert!(ParamKind::VarPositional.is_variadic());
        assert!(!ParamKind::KeywordOnly.accepts_positional());
        assert!(!ParamKind::PositionalOnly.accepts_keyword());
        let p = Parameter::typed("args", TypeHint::any()).var_positional();
        assert_eq!(p.kind(), ParamKind::VarPositional);
    }

    #[test]
    fn test_parameter_defaults() {
        let p = Parameter::typed("n", TypeHint::int()).with_default(3);
        assert!(p.has_default());
        assert_eq!(p.default_for_call(), Some(Value::Int(3)));

        let required = Parameter::typed("n", TypeHint::int()).with_field(FieldSpec::new());
        assert!(!required.has_default());

        let spec = FieldOptions::new()
            .with_default_factory(|| Value::from("x"))
            .build()
            .unwrap();
        let produced = Parameter::typed("s", TypeHint::str()).with_field(spec);
        assert_eq!(produced.default_for_call(), Some(Value::from("x")));
    }

    #[test]
    fn test_return_annotation() {
        let sig = Signature::function("f");
        assert!(sig.return_annotation().is_none());
        let sig = sig.returns(TypeHint::none());
        assert_eq!(sig.return_annotation(), Some(&TypeHint::none()));
    }
}
