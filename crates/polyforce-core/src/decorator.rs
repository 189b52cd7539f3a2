//! Wrapping standalone callables.
//!
//! [`Polycheck`] turns a signature and a body into a [`CheckedFunction`]
//! whose every call is enforced before the body runs.
//!
//! # Example
//!
//! ```rust
//! use polyforce_core::{Arguments, Polycheck, Signature, TypeHint, Value};
//!
//! let greet = Polycheck::new()
//!     .wrap(
//!         Signature::function("greet")
//!             .arg("name", TypeHint::str())
//!             .returns(TypeHint::str()),
//!         |frame| {
//!             let name: String = frame.arg("name")?;
//!             Ok(Value::from(format!("hello {name}")))
//!         },
//!     )
//!     .unwrap();
//!
//! assert_eq!(greet.call(Arguments::new().arg("Ada")).unwrap(), Value::from("hello Ada"));
//! assert!(greet.call(Arguments::new().arg(7)).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::args::{Arguments, CallFrame, Receiver};
use crate::config::{Config, Policy};
use crate::enforce::Enforcer;
use crate::error::{CallError, DefinitionResult, PolyResult};
use crate::schema::{build_fields, FieldSet};
use crate::signature::{CallableKind, Signature};
use crate::value::{ConcreteType, Value};

/// A callable body. Receives the bound, already checked arguments.
pub type Body = Arc<dyn Fn(&CallFrame) -> PolyResult<Value> + Send + Sync>;

/// Options for wrapping a callable.
#[derive(Debug, Clone, Default)]
pub struct Polycheck {
    signature: Option<Signature>,
    config: Config,
}

impl Polycheck {
    /// Full enforcement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables type enforcement. Defaults and binding still apply.
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.config = self.config.ignore(ignore);
        self
    }

    /// Exempts values of `types` from checking.
    pub fn ignored_types<T>(mut self, types: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<ConcreteType>,
    {
        self.config = self.config.ignored_types(types);
        self
    }

    /// Uses a policy declaration.
    pub fn config(mut self, config: Config) -> Self {
        self.config.overlay(&config);
        self
    }

    /// Builds the schema from `signature` instead of the one passed to
    /// [`wrap`](Self::wrap).
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Returns the effective policy.
    pub fn policy(&self) -> Policy {
        Policy::from_config(&self.config)
    }

    /// Builds the fields and wraps `body`.
    pub fn wrap<F>(self, signature: Signature, body: F) -> DefinitionResult<CheckedFunction>
    where
        F: Fn(&CallFrame) -> PolyResult<Value> + Send + Sync + 'static,
    {
        let policy = self.policy();
        let signature = self.signature.unwrap_or(signature);
        let fields = build_fields(&signature, &policy)?;
        debug!(
            callable = %signature.name(),
            bypass = policy.bypass(),
            "Wrapped checked function"
        );
        Ok(CheckedFunction {
            source: signature.name().to_string(),
            signature: Arc::new(signature),
            fields: Arc::new(fields),
            policy: Arc::new(policy),
            body: Arc::new(body),
        })
    }
}

/// A callable whose arguments are enforced on every call.
///
/// Cloning is cheap; clones share the signature, fields and body.
#[derive(Clone)]
pub struct CheckedFunction {
    source: String,
    signature: Arc<Signature>,
    fields: Arc<FieldSet>,
    policy: Arc<Policy>,
    body: Body,
}

impl CheckedFunction {
    pub(crate) fn from_parts(
        source: impl Into<String>,
        signature: Arc<Signature>,
        fields: Arc<FieldSet>,
        policy: Arc<Policy>,
        body: Body,
    ) -> Self {
        Self {
            source: source.into(),
            signature,
            fields,
            policy,
            body,
        }
    }

    /// The same callable reported under `source` and checked under `policy`.
    pub(crate) fn rebind(&self, source: impl Into<String>, policy: Arc<Policy>) -> Self {
        Self {
            source: source.into(),
            policy,
            ..self.clone()
        }
    }

    /// Returns the callable name.
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// Returns the name reported in validation failures.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the binding kind.
    pub fn kind(&self) -> CallableKind {
        self.signature.kind()
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the fields checked on every call.
    pub fn fields(&self) -> &Arc<FieldSet> {
        &self.fields
    }

    /// Returns the effective policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Calls a function or static method.
    pub fn call(&self, args: Arguments) -> PolyResult<Value> {
        self.invoke(None, args)
    }

    /// Calls a method or class method on `receiver`.
    pub fn call_with_receiver(
        &self,
        receiver: impl Into<Receiver>,
        args: Arguments,
    ) -> PolyResult<Value> {
        self.invoke(Some(receiver.into()), args)
    }

    /// Checks and binds `args` without running the body.
    ///
    /// The returned frame has defaults applied and no receiver.
    pub fn enforce(&self, args: Arguments) -> PolyResult<CallFrame> {
        Enforcer::new(&self.source, &self.signature, &self.fields, &self.policy).enforce(args)
    }

    pub(crate) fn invoke(&self, receiver: Option<Receiver>, args: Arguments) -> PolyResult<Value> {
        if self.kind().has_receiver() && receiver.is_none() {
            return Err(CallError::missing_receiver(self.name()).into());
        }
        let frame = self.enforce(args)?.with_receiver(receiver);
        (self.body)(&frame)
    }
}

impl fmt::Debug for CheckedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedFunction")
            .field("source", &self.source)
            .field("signature", &self.signature)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DefinitionError, PolyError};
    use crate::hint::TypeHint;
    use crate::signature::Parameter;
    use crate::value::Object;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo(frame: &CallFrame) -> PolyResult<Value> {
        Ok(frame.get("x").cloned().unwrap_or(Value::None))
    }

    #[test]
    fn test_body_not_run_on_failure() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);
        let f = Polycheck::new()
            .wrap(
                Signature::function("h").arg("x", TypeHint::int()).returns(TypeHint::none()),
                |_| {
                    RUNS.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::None)
                },
            )
            .unwrap();
        assert!(f.call(Arguments::new().arg("no")).is_err());
        assert_eq!(RUNS.load(Ordering::SeqCst), 0);
        assert_eq!(f.call(Arguments::new().arg(1)).unwrap(), Value::None);
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_definition_errors_surface_at_wrap() {
        let err = Polycheck::new()
            .wrap(
                Signature::function("g").param(Parameter::new("name")).returns(TypeHint::none()),
                echo,
            )
            .unwrap_err();
        assert_eq!(err, DefinitionError::missing_annotation("name"));
    }

    #[test]
    fn test_ignore() {
        let f = Polycheck::new()
            .ignore(true)
            .wrap(Signature::function("loose").param(Parameter::new("x")), echo)
            .unwrap();
        assert_eq!(f.call(Arguments::new().arg(1.5)).unwrap(), Value::Float(1.5));
        assert!(f.policy().bypass());
    }

    #[test]
    fn test_ignored_types() {
        let f = Polycheck::new()
            .ignored_types(["Actor"])
            .wrap(
                Signature::function("cast")
                    .arg("x", TypeHint::class("Actor"))
                    .returns(TypeHint::any()),
                echo,
            )
            .unwrap();
        assert_eq!(f.call(Arguments::new().arg("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_signature_override() {
        let f = Polycheck::new()
            .signature(Signature::function("f").arg("x", TypeHint::str()).returns(TypeHint::any()))
            .wrap(Signature::function("f").param(Parameter::new("x")), echo)
            .unwrap();
        assert!(f.call(Arguments::new().arg(1)).is_err());
        assert!(f.call(Arguments::new().arg("ok")).is_ok());
    }

    #[test]
    fn test_method_requires_receiver() {
        let f = Polycheck::new()
            .wrap(
                Signature::method("rename").arg("x", TypeHint::str()).returns(TypeHint::none()),
                |frame| {
                    if let Some(Receiver::Value(Value::Object(object))) = frame.receiver() {
                        object.set("name", frame.get("x").cloned().unwrap_or(Value::None));
                    }
                    Ok(Value::None)
                },
            )
            .unwrap();
        let err = f.call(Arguments::new().arg("a")).unwrap_err();
        assert!(matches!(err, PolyError::Call(CallError::MissingReceiver { .. })));

        let object = Object::new("Thing");
        f.call_with_receiver(object.clone(), Arguments::new().arg("a"))
            .unwrap();
        assert_eq!(object.get("name"), Some(Value::from("a")));
    }

    #[test]
    fn test_body_errors_propagate() {
        let f = Polycheck::new()
            .wrap(Signature::function("fail").returns(TypeHint::none()), |_| {
                Err(PolyError::callable("boom"))
            })
            .unwrap();
        let err = f.call(Arguments::new()).unwrap_err();
        assert!(matches!(err, PolyError::Other(_)));
    }

    #[test]
    fn test_checked_function_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CheckedFunction>();
    }

    #[test]
    fn test_enforce_binds_without_running_body() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);
        let f = Polycheck::new()
            .wrap(
                Signature::function("pair")
                    .arg("x", TypeHint::int())
                    .arg_with_default("y", TypeHint::int(), 2)
                    .returns(TypeHint::none()),
                |_| {
                    RUNS.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::None)
                },
            )
            .unwrap();
        let frame = f.enforce(Arguments::new().arg(1)).unwrap();
        assert_eq!(frame.get("x"), Some(&Value::Int(1)));
        assert_eq!(frame.get("y"), Some(&Value::Int(2)));
        assert!(f.enforce(Arguments::new().arg("one")).is_err());
        assert_eq!(RUNS.load(Ordering::SeqCst), 0);
    }
}
