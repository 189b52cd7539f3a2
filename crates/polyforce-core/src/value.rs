//! Dynamic values and their runtime types.
//!
//! Checked callables receive their arguments as [`Value`]s. Every value has a
//! [`ConcreteType`], which is what the enforcer compares against the types a
//! declared hint resolves to. Instances of user-defined classes are
//! [`Object`]s: a class name plus an ordered attribute map behind a lock, so
//! method bodies may mutate instance state through a shared `Arc`.
//!
//! # Example
//!
//! ```rust
//! use polyforce_core::{ConcreteType, FromValue, Object, Value};
//!
//! let actor = Object::new("Actor");
//! actor.set("name", "Keanu");
//!
//! let value = Value::from(actor.clone());
//! assert_eq!(value.type_of(), ConcreteType::class("Actor"));
//! assert_eq!(String::from_value(&actor.get("name").unwrap()).unwrap(), "Keanu");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConversionError;

/// The runtime type identity of a [`Value`].
///
/// Built-in variants mirror the value variants; `Class` names a user-defined
/// class. Matching is by identity only: there is no subtype relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConcreteType {
    /// The type of `None`.
    NoneType,
    /// Booleans.
    Bool,
    /// Integers.
    Int,
    /// Floating point numbers.
    Float,
    /// Text.
    Str,
    /// Raw bytes.
    Bytes,
    /// Ordered, mutable sequences.
    List,
    /// Ordered, fixed sequences.
    Tuple,
    /// Unordered collections of distinct values.
    Set,
    /// String-keyed mappings.
    Dict,
    /// A user-defined class, by name.
    Class(Arc<str>),
}

impl ConcreteType {
    /// Creates a class type.
    pub fn class(name: impl AsRef<str>) -> Self {
        Self::Class(Arc::from(name.as_ref()))
    }

    /// Returns the type name as shown in messages.
    pub fn name(&self) -> &str {
        match self {
            Self::NoneType => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Dict => "dict",
            Self::Class(name) => name,
        }
    }

    /// Parses a type name. Names that are not built-ins become classes.
    pub fn from_name(name: &str) -> Self {
        match name {
            "None" | "NoneType" => Self::NoneType,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            "bytes" => Self::Bytes,
            "list" => Self::List,
            "tuple" => Self::Tuple,
            "set" => Self::Set,
            "dict" => Self::Dict,
            other => Self::class(other),
        }
    }

    /// Returns `true` for user-defined classes.
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for ConcreteType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for ConcreteType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl Serialize for ConcreteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ConcreteType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// An instance of a user-defined class.
pub struct Object {
    class: ConcreteType,
    attributes: RwLock<IndexMap<String, Value>>,
}

impl Object {
    /// Creates an object of class `class_name` with no attributes.
    pub fn new(class_name: impl AsRef<str>) -> Arc<Self> {
        Self::with_attributes(class_name, std::iter::empty::<(String, Value)>())
    }

    /// Creates an object with initial attributes.
    pub fn with_attributes<K, V>(
        class_name: impl AsRef<str>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Arc<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Arc::new(Self {
            class: ConcreteType::class(class_name),
            attributes: RwLock::new(
                attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        })
    }

    /// Returns the object's class.
    pub fn class(&self) -> &ConcreteType {
        &self.class
    }

    /// Returns the object's class name.
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Returns a clone of attribute `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attributes.read().get(name).cloned()
    }

    /// Sets attribute `name`, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.write().insert(name.into(), value.into())
    }

    /// Returns `true` if attribute `name` is set.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.read().contains_key(name)
    }

    /// Returns a snapshot of every attribute in insertion order.
    pub fn attributes(&self) -> IndexMap<String, Value> {
        self.attributes.read().clone()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self.attributes.read();
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("attributes", &attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object {
    /// Returns the JSON form of this object: the mapping of its attributes.
    ///
    /// An object reached again while it is being rendered, directly or
    /// through nested values, renders as `"<Class object>"`.
    pub fn to_json(&self) -> serde_json::Value {
        self.json_with(&mut Vec::new())
    }

    fn json_with(&self, active: &mut Vec<*const Object>) -> serde_json::Value {
        let ptr: *const Object = self;
        if active.contains(&ptr) {
            return serde_json::Value::String(format!("<{} object>", self.class_name()));
        }
        // snapshot so the lock is not held while nested objects render
        let attributes = self.attributes();
        active.push(ptr);
        let map = attributes
            .iter()
            .map(|(name, value)| (name.clone(), json_of(value, active)))
            .collect();
        active.pop();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn json_of(value: &Value, active: &mut Vec<*const Object>) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x).map_or(Json::Null, Json::Number),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::List(items) | Value::Tuple(items) => {
            Json::Array(items.iter().map(|item| json_of(item, active)).collect())
        }
        Value::Set(items) => Json::Array(items.iter().map(|item| json_of(item, active)).collect()),
        Value::Dict(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_of(v, active)))
                .collect(),
        ),
        Value::Object(object) => object.json_with(active),
    }
}

/// The distinct members of a set value, in first-seen order.
///
/// Only [`Value::set`] builds one, so members never repeat. Equality ignores
/// order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet(Vec<Value>);

impl ValueSet {
    /// Returns the members.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Iterates over the members.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `value` is a member.
    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value.
    None,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// Text.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A list.
    List(Vec<Value>),
    /// A tuple.
    Tuple(Vec<Value>),
    /// A set. Built with [`Value::set`].
    Set(ValueSet),
    /// A string-keyed mapping.
    Dict(IndexMap<String, Value>),
    /// An instance of a user-defined class.
    Object(Arc<Object>),
}

impl Value {
    /// Builds a set value, dropping duplicates while keeping first occurrences.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self::Set(ValueSet(unique))
    }

    /// Builds a tuple value.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Returns the runtime type of this value.
    pub fn type_of(&self) -> ConcreteType {
        match self {
            Self::None => ConcreteType::NoneType,
            Self::Bool(_) => ConcreteType::Bool,
            Self::Int(_) => ConcreteType::Int,
            Self::Float(_) => ConcreteType::Float,
            Self::Str(_) => ConcreteType::Str,
            Self::Bytes(_) => ConcreteType::Bytes,
            Self::List(_) => ConcreteType::List,
            Self::Tuple(_) => ConcreteType::Tuple,
            Self::Set(_) => ConcreteType::Set,
            Self::Dict(_) => ConcreteType::Dict,
            Self::Object(object) => object.class().clone(),
        }
    }

    /// Returns the name of this value's runtime type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Object(object) => object.class_name(),
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
        }
    }

    /// Returns `true` for [`Value::None`].
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the text if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an int.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the object if this is a class instance.
    pub fn as_object(&self) -> Option<&Arc<Object>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the serializable JSON form of this value.
    ///
    /// Objects render as the mapping of their attributes, and an object that
    /// contains itself renders its repeat as `"<Class object>"`. Non-finite
    /// floats render as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        json_of(self, &mut Vec::new())
    }

    /// Converts a JSON document into a value. Objects become dicts.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Dict(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Bytes(bytes) => write!(f, "b'{}'", String::from_utf8_lossy(bytes)),
            Self::List(items) => {
                f.write_str("[")?;
                seq(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                seq(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Set(items) if items.is_empty() => f.write_str("set()"),
            Self::Set(items) => {
                f.write_str("{")?;
                seq(f, items.as_slice())?;
                f.write_str("}")
            }
            Self::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                f.write_str("}")
            }
            Self::Object(object) => write!(f, "<{} object>", object.class_name()),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Self::Int(i64::from(i))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Arc<Object>> for Value {
    fn from(object: Arc<Object>) -> Self {
        Self::Object(object)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Self::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(map: IndexMap<String, T>) -> Self {
        Self::Dict(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(map: HashMap<String, T>) -> Self {
        Self::Dict(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Self::Dict(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Conversion from a borrowed [`Value`] into a Rust type.
///
/// Conversions are exact: an `int` never converts to `f64` and a `list`
/// never converts to `String`.
pub trait FromValue: Sized {
    /// Converts the value or reports what was expected.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Conversion from a Rust type into a [`Value`].
///
/// Blanket-implemented for everything that implements `Into<Value>`.
pub trait IntoValue {
    /// Converts self into a value.
    fn into_value(self) -> Value;
}

impl<T: Into<Value>> IntoValue for T {
    fn into_value(self) -> Value {
        self.into()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::None => Ok(()),
            other => Err(ConversionError::new("None", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(ConversionError::new("bool", other)),
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => <$t>::try_from(*i)
                            .map_err(|_| ConversionError::new(stringify!($t), value)),
                        other => Err(ConversionError::new("int", other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(x) => Ok(*x),
            other => Err(ConversionError::new("float", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ConversionError::new("str", other)),
        }
    }
}

impl FromValue for Arc<Object> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Object(object) => Ok(Arc::clone(object)),
            other => Err(ConversionError::new("object", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(items) | Value::Tuple(items) => items.iter().map(T::from_value).collect(),
            Value::Set(items) => items.iter().map(T::from_value).collect(),
            other => Err(ConversionError::new("list", other)),
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Dict(map) => map
                .iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            other => Err(ConversionError::new("dict", other)),
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        IndexMap::<String, T>::from_value(value).map(|map| map.into_iter().collect())
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        IndexMap::<String, T>::from_value(value).map(|map| map.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for name in ["NoneType", "bool", "int", "float", "str", "bytes", "list", "tuple", "set", "dict"] {
            assert_eq!(ConcreteType::from_name(name).name(), name);
        }
        assert_eq!(ConcreteType::from_name("None"), ConcreteType::NoneType);
        assert_eq!(ConcreteType::from_name("Actor"), ConcreteType::class("Actor"));
        assert!(ConcreteType::from("Actor").is_class());
    }

    #[test]
    fn test_concrete_type_serde() {
        let json = serde_json::to_string(&ConcreteType::class("Movie")).unwrap();
        assert_eq!(json, "\"Movie\"");
        let parsed: Vec<ConcreteType> = serde_json::from_str(r#"["int", "Actor"]"#).unwrap();
        assert_eq!(parsed, vec![ConcreteType::Int, ConcreteType::class("Actor")]);
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::None.type_of(), ConcreteType::NoneType);
        assert_eq!(Value::from(2.0).type_of(), ConcreteType::Float);
        assert_eq!(Value::from(vec![1, 2]).type_of(), ConcreteType::List);
        assert_eq!(Value::tuple([Value::Int(1)]).type_of(), ConcreteType::Tuple);
        assert_eq!(Value::from(Object::new("Actor")).type_name(), "Actor");
        // bool is its own type, not an int
        assert_eq!(Value::from(true).type_of(), ConcreteType::Bool);
    }

    #[test]
    fn test_set_drops_duplicates() {
        let set = Value::set([Value::Int(1), Value::Int(2), Value::Int(1)]);
        let Value::Set(items) = &set else {
            panic!("expected a set");
        };
        assert_eq!(items.as_slice(), [Value::Int(1), Value::Int(2)]);
        assert_eq!(set, Value::set([Value::Int(2), Value::Int(1)]));
        assert_ne!(set, Value::set([Value::Int(1)]));
        assert_eq!(set.to_json(), serde_json::json!([1, 2]));
    }

    #[test]
    fn test_object_identity_equality() {
        let a = Object::new("Actor");
        let b = Object::new("Actor");
        assert_eq!(Value::from(a.clone()), Value::from(a));
        assert_ne!(Value::from(b.clone()), Value::from(Object::new("Actor")));
    }

    #[test]
    fn test_object_attributes() {
        let actor = Object::with_attributes("Actor", [("name", "Keanu")]);
        assert!(actor.has("name"));
        assert_eq!(actor.set("age", 58), None);
        assert_eq!(actor.get("age"), Some(Value::Int(58)));
        let keys: Vec<_> = actor.attributes().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "age"]);
    }

    #[test]
    fn test_to_json() {
        let actor = Object::with_attributes("Actor", [("name", "Keanu")]);
        assert_eq!(
            Value::from(actor).to_json(),
            serde_json::json!({ "name": "Keanu" })
        );
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::tuple([Value::Int(1)]).to_json(), serde_json::json!([1]));
    }

    #[test]
    fn test_self_referencing_object_to_json() {
        let node = Object::new("Node");
        node.set("id", 1);
        node.set("me", node.clone());
        node.set("children", vec![Value::from(node.clone())]);
        assert_eq!(
            Value::from(node.clone()).to_json(),
            serde_json::json!({
                "id": 1,
                "me": "<Node object>",
                "children": ["<Node object>"]
            })
        );

        // the same object twice side by side is not a cycle
        let leaf = Object::with_attributes("Leaf", [("n", 0)]);
        let pair = Value::List(vec![leaf.clone().into(), leaf.into()]);
        assert_eq!(pair.to_json(), serde_json::json!([{ "n": 0 }, { "n": 0 }]));
        assert!(serde_json::to_string(&node).is_ok());
    }

    #[test]
    fn test_from_json() {
        let value = Value::from_json(serde_json::json!({ "a": [1, 2.5, null] }));
        let Value::Dict(map) = value else {
            panic!("expected a dict");
        };
        assert_eq!(
            map["a"],
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::None])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(2.0).to_string(), "2.0");
        assert_eq!(Value::from("x").to_string(), "'x'");
        assert_eq!(Value::tuple([Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::set([]).to_string(), "set()");
        assert_eq!(Value::from(Some(true)).to_string(), "True");
    }

    #[test]
    fn test_from_value_is_exact() {
        assert_eq!(i64::from_value(&Value::Int(3)), Ok(3));
        assert!(f64::from_value(&Value::Int(3)).is_err());
        assert!(u8::from_value(&Value::Int(300)).is_err());
        assert_eq!(Option::<String>::from_value(&Value::None), Ok(None));
        assert_eq!(
            Vec::<i32>::from_value(&Value::from(vec![1, 2])),
            Ok(vec![1, 2])
        );
        let err = String::from_value(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "expected str, found 'int'");
    }

    #[test]
    fn test_into_value() {
        assert_eq!(().into_value(), Value::None);
        assert_eq!(5_u32.into_value(), Value::Int(5));
        let map: HashMap<String, i32> = [("a".to_string(), 1)].into_iter().collect();
        assert_eq!(map.into_value().type_of(), ConcreteType::Dict);
    }
}
