//! Declared type hints and their resolution to concrete types.
//!
//! A [`TypeHint`] is what a parameter declares; [`TypeHint::resolve`] turns it
//! into the [`ResolvedTypes`] an argument must belong to. Resolution never
//! fails and never looks inside containers: `list[str]` accepts any list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::Expected;
use crate::value::{ConcreteType, Object, Value};

/// A declared type hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeHint {
    /// Accepts any value.
    Any,
    /// An unconstrained type variable; accepts any value.
    TypeVar(String),
    /// A single concrete type.
    Concrete(ConcreteType),
    /// Any of several hints. Build with [`TypeHint::union`] to flatten.
    Union(Vec<TypeHint>),
    /// A generic container such as `list[str]`. Only `origin` is checked.
    Container {
        /// The container type.
        origin: ConcreteType,
        /// Element hints, kept for rendering.
        args: Vec<TypeHint>,
    },
    /// A hint carrying extra metadata payloads.
    Annotated {
        /// The underlying hint.
        inner: Box<TypeHint>,
        /// Opaque metadata, in declaration order.
        metadata: Vec<Value>,
    },
    /// A hint whose type was declared exempt from checking.
    Exempt(Box<TypeHint>),
}

impl TypeHint {
    /// The wildcard hint.
    pub const fn any() -> Self {
        Self::Any
    }

    /// A type variable.
    pub fn type_var(name: impl Into<String>) -> Self {
        Self::TypeVar(name.into())
    }

    /// A hint for exactly `ty`.
    pub const fn of(ty: ConcreteType) -> Self {
        Self::Concrete(ty)
    }

    /// `None`.
    pub const fn none() -> Self {
        Self::Concrete(ConcreteType::NoneType)
    }

    /// `bool`.
    pub const fn bool() -> Self {
        Self::Concrete(ConcreteType::Bool)
    }

    /// `int`.
    pub const fn int() -> Self {
        Self::Concrete(ConcreteType::Int)
    }

    /// `float`.
    pub const fn float() -> Self {
        Self::Concrete(ConcreteType::Float)
    }

    /// `str`.
    pub const fn str() -> Self {
        Self::Concrete(ConcreteType::Str)
    }

    /// `bytes`.
    pub const fn bytes() -> Self {
        Self::Concrete(ConcreteType::Bytes)
    }

    /// A user-defined class.
    pub fn class(name: impl AsRef<str>) -> Self {
        Self::Concrete(ConcreteType::class(name))
    }

    /// A generic container.
    pub fn container(origin: ConcreteType, args: impl IntoIterator<Item = TypeHint>) -> Self {
        Self::Container {
            origin,
            args: args.into_iter().collect(),
        }
    }

    /// `list[item]`.
    pub fn list_of(item: TypeHint) -> Self {
        Self::container(ConcreteType::List, [item])
    }

    /// `set[item]`.
    pub fn set_of(item: TypeHint) -> Self {
        Self::container(ConcreteType::Set, [item])
    }

    /// `tuple[items...]`.
    pub fn tuple_of(items: impl IntoIterator<Item = TypeHint>) -> Self {
        Self::container(ConcreteType::Tuple, items)
    }

    /// `dict[key, value]`.
    pub fn dict_of(key: TypeHint, value: TypeHint) -> Self {
        Self::container(ConcreteType::Dict, [key, value])
    }

    /// A union of `members`.
    ///
    /// Nested unions are flattened and repeated members dropped. A union of
    /// one member is that member.
    pub fn union(members: impl IntoIterator<Item = TypeHint>) -> Self {
        let mut flat: Vec<TypeHint> = Vec::new();
        for member in members {
            let nested = match member {
                Self::Union(inner) => inner,
                other => vec![other],
            };
            for hint in nested {
                if !flat.contains(&hint) {
                    flat.push(hint);
                }
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat)
        }
    }

    /// `Union[inner, None]`.
    pub fn optional(inner: TypeHint) -> Self {
        Self::union([inner, Self::none()])
    }

    /// `Annotated[inner, metadata...]`.
    pub fn annotated(inner: TypeHint, metadata: impl IntoIterator<Item = Value>) -> Self {
        Self::Annotated {
            inner: Box::new(inner),
            metadata: metadata.into_iter().collect(),
        }
    }

    /// Marks `inner` as exempt from checking.
    pub fn exempt(inner: TypeHint) -> Self {
        Self::Exempt(Box::new(inner))
    }

    /// Returns `true` for hints that accept anything regardless of policy.
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any | Self::TypeVar(_) | Self::Exempt(_))
    }

    /// Returns the concrete type this hint names directly, if any.
    ///
    /// Containers name their origin; unions and wildcards name nothing.
    pub fn identity(&self) -> Option<&ConcreteType> {
        match self {
            Self::Concrete(ty) | Self::Container { origin: ty, .. } => Some(ty),
            Self::Annotated { inner, .. } => inner.identity(),
            _ => None,
        }
    }

    /// Removes `Annotated` layers, returning the bare hint and the collected
    /// metadata (outermost layer last).
    pub fn strip_annotations(self) -> (TypeHint, Vec<Value>) {
        match self {
            Self::Annotated { inner, metadata } => {
                let (bare, mut collected) = inner.strip_annotations();
                collected.extend(metadata);
                (bare, collected)
            }
            other => (other, Vec::new()),
        }
    }

    /// Resolves this hint to the concrete types an argument must have.
    pub fn resolve(&self, exempt_types: &IndexSet<ConcreteType>) -> ResolvedTypes {
        match self {
            Self::Any | Self::TypeVar(_) | Self::Exempt(_) => ResolvedTypes::Anything,
            Self::Concrete(ty) | Self::Container { origin: ty, .. } => {
                if exempt_types.contains(ty) {
                    ResolvedTypes::Anything
                } else {
                    ResolvedTypes::OneOf(vec![ty.clone()])
                }
            }
            Self::Annotated { inner, .. } => inner.resolve(exempt_types),
            Self::Union(members) => {
                let mut types: Vec<ConcreteType> = Vec::new();
                for member in members {
                    match member.resolve(exempt_types) {
                        ResolvedTypes::Anything => return ResolvedTypes::Anything,
                        ResolvedTypes::OneOf(resolved) => {
                            for ty in resolved {
                                if !types.contains(&ty) {
                                    types.push(ty);
                                }
                            }
                        }
                    }
                }
                ResolvedTypes::OneOf(types)
            }
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, hints: &[TypeHint]) -> fmt::Result {
            for (i, hint) in hints.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{hint}")?;
            }
            Ok(())
        }

        match self {
            Self::Any => f.write_str("Any"),
            Self::TypeVar(name) => f.write_str(name),
            Self::Concrete(ConcreteType::NoneType) => f.write_str("None"),
            Self::Concrete(ty) => f.write_str(ty.name()),
            Self::Union(members) => {
                f.write_str("Union[")?;
                list(f, members)?;
                f.write_str("]")
            }
            Self::Container { origin, args } if args.is_empty() => f.write_str(origin.name()),
            Self::Container { origin, args } => {
                write!(f, "{}[", origin.name())?;
                list(f, args)?;
                f.write_str("]")
            }
            Self::Annotated { inner, metadata } => {
                write!(f, "Annotated[{inner}")?;
                for item in metadata {
                    write!(f, ", {item}")?;
                }
                f.write_str("]")
            }
            Self::Exempt(inner) => write!(f, "{inner}"),
        }
    }
}

impl From<ConcreteType> for TypeHint {
    fn from(ty: ConcreteType) -> Self {
        Self::Concrete(ty)
    }
}

/// The concrete types an argument must belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTypes {
    /// Every value is accepted.
    Anything,
    /// The value's type must be one of these, compared by identity.
    OneOf(Vec<ConcreteType>),
}

impl ResolvedTypes {
    /// Returns `true` if a value of type `ty` is accepted.
    pub fn accepts(&self, ty: &ConcreteType) -> bool {
        match self {
            Self::Anything => true,
            Self::OneOf(types) => types.contains(ty),
        }
    }

    /// Returns `true` if every value is accepted.
    pub const fn is_anything(&self) -> bool {
        matches!(self, Self::Anything)
    }

    /// Returns the accepted types; empty for [`ResolvedTypes::Anything`].
    pub fn types(&self) -> &[ConcreteType] {
        match self {
            Self::Anything => &[],
            Self::OneOf(types) => types,
        }
    }

    /// Renders the accepted types for a failure record.
    pub fn expected(&self) -> Expected {
        match self {
            Self::Anything => Expected::One("Any".to_string()),
            Self::OneOf(types) => Expected::from_types(types),
        }
    }
}

/// Maps a Rust type to the hint a parameter of that type declares.
///
/// ```rust
/// use polyforce_core::{TypeHint, TypeHintOf};
///
/// assert_eq!(<Option<String>>::type_hint().to_string(), "Union[str, None]");
/// assert_eq!(<Vec<i64>>::type_hint(), TypeHint::list_of(TypeHint::int()));
/// ```
pub trait TypeHintOf {
    /// The hint for `Self`.
    fn type_hint() -> TypeHint;
}

macro_rules! hint_of {
    ($hint:expr => $($t:ty),*) => {
        $(
            impl TypeHintOf for $t {
                fn type_hint() -> TypeHint {
                    $hint
                }
            }
        )*
    };
}

hint_of!(TypeHint::int() => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
hint_of!(TypeHint::float() => f32, f64);
hint_of!(TypeHint::bool() => bool);
hint_of!(TypeHint::str() => String);
hint_of!(TypeHint::none() => ());
// Any object passes; declare a class hint explicitly to constrain it.
hint_of!(TypeHint::any() => Value, Arc<Object>);

impl<T: TypeHintOf> TypeHintOf for Option<T> {
    fn type_hint() -> TypeHint {
        TypeHint::optional(T::type_hint())
    }
}

impl<T: TypeHintOf> TypeHintOf for Vec<T> {
    fn type_hint() -> TypeHint {
        TypeHint::list_of(T::type_hint())
    }
}

impl<T: TypeHintOf> TypeHintOf for IndexMap<String, T> {
    fn type_hint() -> TypeHint {
        TypeHint::dict_of(TypeHint::str(), T::type_hint())
    }
}

impl<T: TypeHintOf> TypeHintOf for HashMap<String, T> {
    fn type_hint() -> TypeHint {
        TypeHint::dict_of(TypeHint::str(), T::type_hint())
    }
}

impl<T: TypeHintOf> TypeHintOf for BTreeMap<String, T> {
    fn type_hint() -> TypeHint {
        TypeHint::dict_of(TypeHint::str(), T::type_hint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_exemptions() -> IndexSet<ConcreteType> {
        IndexSet::new()
    }

    #[test]
    fn test_wildcards_resolve_to_anything() {
        let exempt = no_exemptions();
        assert!(TypeHint::any().resolve(&exempt).is_anything());
        assert!(TypeHint::type_var("T").resolve(&exempt).is_anything());
        assert!(TypeHint::exempt(TypeHint::int()).resolve(&exempt).is_anything());
    }

    #[test]
    fn test_union_resolution() {
        let hint = TypeHint::union([TypeHint::int(), TypeHint::str(), TypeHint::int()]);
        let resolved = hint.resolve(&no_exemptions());
        assert_eq!(
            resolved,
            ResolvedTypes::OneOf(vec![ConcreteType::Int, ConcreteType::Str])
        );
        assert!(!resolved.accepts(&ConcreteType::Float));
        assert_eq!(
            resolved.expected(),
            Expected::Many(vec!["int".into(), "str".into()])
        );
    }

    #[test]
    fn test_union_with_any_member_accepts_anything() {
        let hint = TypeHint::union([TypeHint::int(), TypeHint::any()]);
        assert!(hint.resolve(&no_exemptions()).is_anything());
    }

    #[test]
    fn test_nested_unions_flatten() {
        let inner = TypeHint::union([TypeHint::int(), TypeHint::str()]);
        let outer = TypeHint::union([inner, TypeHint::float()]);
        assert_eq!(
            outer,
            TypeHint::Union(vec![TypeHint::int(), TypeHint::str(), TypeHint::float()])
        );
        assert_eq!(TypeHint::union([TypeHint::int()]), TypeHint::int());
    }

    #[test]
    fn test_container_resolves_to_origin() {
        let hint = TypeHint::dict_of(TypeHint::str(), TypeHint::int());
        assert_eq!(
            hint.resolve(&no_exemptions()),
            ResolvedTypes::OneOf(vec![ConcreteType::Dict])
        );
    }

    #[test]
    fn test_annotated_resolves_as_inner() {
        let hint = TypeHint::annotated(TypeHint::int(), [Value::from("meta")]);
        assert_eq!(
            hint.resolve(&no_exemptions()),
            ResolvedTypes::OneOf(vec![ConcreteType::Int])
        );
        let (bare, metadata) = hint.strip_annotations();
        assert_eq!(bare, TypeHint::int());
        assert_eq!(metadata, vec![Value::from("meta")]);
    }

    #[test]
    fn test_exempt_types() {
        let exempt: IndexSet<ConcreteType> = [ConcreteType::class("Actor")].into_iter().collect();
        assert!(TypeHint::class("Actor").resolve(&exempt).is_anything());
        assert!(!TypeHint::class("Movie").resolve(&exempt).is_anything());
        let optional = TypeHint::optional(TypeHint::class("Actor"));
        assert!(optional.resolve(&exempt).is_anything());
    }

    #[test]
    fn test_no_subtype_relation() {
        let resolved = TypeHint::int().resolve(&no_exemptions());
        assert!(!resolved.accepts(&ConcreteType::Bool));
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeHint::optional(TypeHint::str()).to_string(), "Union[str, None]");
        assert_eq!(TypeHint::list_of(TypeHint::str()).to_string(), "list[str]");
        assert_eq!(
            TypeHint::annotated(TypeHint::int(), [Value::from("m")]).to_string(),
            "Annotated[int, 'm']"
        );
        assert_eq!(TypeHint::container(ConcreteType::List, []).to_string(), "list");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(TypeHint::list_of(TypeHint::int())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "container": { "origin": "list", "args": [{ "concrete": "int" }] } })
        );
        assert_eq!(serde_json::to_value(TypeHint::Any).unwrap(), "any");
    }

    #[test]
    fn test_type_hint_of() {
        assert_eq!(i32::type_hint(), TypeHint::int());
        assert_eq!(<()>::type_hint(), TypeHint::none());
        assert_eq!(Value::type_hint(), TypeHint::Any);
        assert_eq!(
            <HashMap<String, bool>>::type_hint(),
            TypeHint::dict_of(TypeHint::str(), TypeHint::bool())
        );
    }
}
