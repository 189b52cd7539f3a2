//! # Polyforce Core
//!
//! Runtime signature validation.
//!
//! A callable declares typed parameters through a [`Signature`]. From it,
//! [`build_fields`] derives a [`FieldSet`]: one [`Field`] per parameter with
//! its declared [`TypeHint`], default and requiredness. On every call the
//! [`Enforcer`] binds the supplied [`Arguments`], fills in defaults, resolves
//! each hint to the concrete types it admits and rejects the call with a
//! [`ValidationFailureSet`] listing every mismatch before the body runs.
//!
//! - [`Polycheck`] wraps standalone functions into [`CheckedFunction`]s
//! - [`ModelBuilder`] builds [`Model`]s whose methods are all checked, with
//!   schemas inherited from parent models
//! - [`Config`] and [`Policy`] switch enforcement off or exempt whole types
//!
//! Values cross the checked boundary as [`Value`]s; [`FromValue`],
//! [`IntoValue`] and [`TypeHintOf`] connect them to ordinary Rust types.

#![doc(html_root_url = "https://docs.rs/polyforce-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod config;
mod decorator;
mod enforce;
mod error;
mod field;
mod hint;
mod model;
mod schema;
mod signature;
mod value;

pub use args::{Arguments, CallFrame, Receiver};
pub use config::{Config, Policy};
pub use decorator::{Body, CheckedFunction, Polycheck};
pub use enforce::Enforcer;
pub use error::{
    CallError, ConfigError, ConversionError, DefinitionError, DefinitionResult, ErrorCategory,
    Expected, PolyError, PolyResult, ValidationFailure, ValidationFailureSet,
};
pub use field::{DefaultFactory, Field, FieldDefault, FieldOptions, FieldSpec, ProduceDefault};
pub use hint::{ResolvedTypes, TypeHint, TypeHintOf};
pub use model::{Instance, Model, ModelBuilder, INIT};
pub use schema::{build_fields, FieldSet, Schema};
pub use signature::{
    CallableKind, ParamDefault, ParamKind, Parameter, Signature, CLASS_RECEIVER, SELF_RECEIVER,
};
pub use value::{ConcreteType, FromValue, IntoValue, Object, Value, ValueSet};
