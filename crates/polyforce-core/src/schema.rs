//! Signature building and schemas.
//!
//! [`build_fields`] turns a [`Signature`] into the [`FieldSet`] the enforcer
//! checks arguments against. A [`Schema`] collects the field sets of every
//! callable a model knows about.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::Policy;
use crate::error::{DefinitionError, DefinitionResult};
use crate::field::{Field, FieldOptions, FieldSpec};
use crate::hint::TypeHint;
use crate::signature::{ParamDefault, Signature};

/// The ordered fields of one callable.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: IndexMap<String, Field>,
}

impl FieldSet {
    /// An empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, field: Field) {
        self.fields.insert(field.name().to_string(), field);
    }

    /// Returns the field for `name`.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns `true` if `name` is a field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a Field;
    type IntoIter = indexmap::map::Values<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.values()
    }
}

/// Field sets keyed by callable name.
///
/// Entries are shared: a subclass that does not override a method holds the
/// same `Arc<FieldSet>` as its ancestor.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: IndexMap<String, Arc<FieldSet>>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fields of callable `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<FieldSet>> {
        self.entries.get(name)
    }

    /// Returns `true` if callable `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns callable names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FieldSet>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, fields: Arc<FieldSet>) {
        self.entries.insert(name.into(), fields);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.entries.shift_remove(name);
    }
}

/// Builds the fields of `signature` under `policy`.
///
/// ```rust
/// use polyforce_core::{build_fields, DefinitionError, Policy, Signature, Parameter, TypeHint};
///
/// let sig = Signature::function("f")
///     .arg("a", TypeHint::union([TypeHint::int(), TypeHint::str()]))
///     .arg("b", TypeHint::any())
///     .returns(TypeHint::any());
/// let fields = build_fields(&sig, &Policy::new()).unwrap();
/// assert_eq!(fields.names().collect::<Vec<_>>(), ["a", "b"]);
///
/// let untyped = Signature::function("g").param(Parameter::new("name")).returns(TypeHint::none());
/// assert_eq!(
///     build_fields(&untyped, &Policy::new()).unwrap_err(),
///     DefinitionError::missing_annotation("name"),
/// );
/// ```
pub fn build_fields(signature: &Signature, policy: &Policy) -> DefinitionResult<FieldSet> {
    if signature.kind().has_receiver() && signature.parameters().is_empty() {
        return Err(DefinitionError::missing_receiver(signature.name()));
    }
    let parameters = signature.declared_parameters();

    for (i, param) in parameters.iter().enumerate() {
        if parameters[..i].iter().any(|p| p.name() == param.name()) {
            return Err(DefinitionError::DuplicateParameter {
                callable: signature.name().to_string(),
                name: param.name().to_string(),
            });
        }
    }

    if !policy.bypass() {
        if signature.return_annotation().is_none() {
            return Err(DefinitionError::return_signature_missing(signature.name()));
        }
        if let Some(untyped) = parameters.iter().find(|p| p.annotation().is_none()) {
            return Err(DefinitionError::missing_annotation(untyped.name()));
        }
    }

    let mut fields = FieldSet::new();
    for param in parameters.iter().filter(|p| !p.kind().is_variadic()) {
        let declared_type = if policy.bypass() {
            TypeHint::Any
        } else {
            param.annotation().cloned().unwrap_or(TypeHint::Any)
        };
        let spec = match param.default() {
            ParamDefault::Empty => FieldSpec::new(),
            ParamDefault::Value(value) => FieldOptions::new()
                .with_default(value.clone())
                .build()?,
            ParamDefault::Field(spec) => spec.clone(),
        };
        fields.insert(Field::from_parts(
            param.name().to_string(),
            param.kind(),
            declared_type,
            spec,
            policy.exempt_types(),
        )?);
    }

    debug!(
        callable = %signature.name(),
        fields = fields.len(),
        bypass = policy.bypass(),
        "Built signature fields"
    );

    Ok(fields)
}
