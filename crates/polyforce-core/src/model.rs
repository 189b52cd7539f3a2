//! Models: classes whose methods are checked.
//!
//! A [`Model`] is built once with a [`ModelBuilder`]. Building runs the
//! signature builder over every checked method, merges the schemas of the
//! parents, and installs a method table of checked wrappers. The finished
//! model is immutable and shared through `Arc`.
//!
//! # Example
//!
//! ```rust
//! use polyforce_core::{Arguments, Model, Signature, TypeHint, Value};
//!
//! let user = Model::builder("User")
//!     .init(
//!         Signature::method("__init__").arg("name", TypeHint::str()).returns(TypeHint::none()),
//!         |frame| {
//!             frame.instance()?.set("name", frame.arg::<String>("name")?);
//!             Ok(Value::None)
//!         },
//!     )
//!     .build()
//!     .unwrap();
//!
//! let ada = user.instantiate(Arguments::new().arg("Ada")).unwrap();
//! assert_eq!(ada.get("name"), Some(Value::from("Ada")));
//! assert!(user.instantiate(Arguments::new().arg(1)).is_err());
//! assert!(user.schema().contains("__init__"));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::args::{Arguments, Binding, CallFrame, Receiver};
use crate::config::{Config, Policy};
use crate::decorator::{Body, CheckedFunction};
use crate::error::{CallError, PolyResult};
use crate::hint::TypeHint;
use crate::schema::{build_fields, Schema};
use crate::signature::{CallableKind, Signature};
use crate::value::{ConcreteType, Object, Value};

/// Name of the constructor method.
pub const INIT: &str = "__init__";

/// Names starting or ending with `__` are hooks or private helpers.
fn is_reserved(name: &str) -> bool {
    name.starts_with("__") || name.ends_with("__")
}

/// A method that is bound but never type checked.
#[derive(Clone)]
struct RawMethod {
    signature: Arc<Signature>,
    body: Body,
}

impl RawMethod {
    fn invoke(&self, receiver: Option<Receiver>, args: Arguments) -> PolyResult<Value> {
        let parameters = self.signature.declared_parameters();
        let mut binding = Binding::bind(self.signature.name(), parameters, args);
        binding.apply_parameter_defaults(parameters);
        let frame = binding
            .finish(self.signature.name(), parameters, |param| param.has_default())?
            .with_receiver(receiver);
        (self.body)(&frame)
    }
}

struct MethodDef {
    signature: Signature,
    body: Body,
    checked: bool,
}

/// Builds a [`Model`].
pub struct ModelBuilder {
    name: String,
    parents: Vec<Arc<Model>>,
    config: Option<Config>,
    methods: IndexMap<String, MethodDef>,
}

impl ModelBuilder {
    /// Starts a model named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            config: None,
            methods: IndexMap::new(),
        }
    }

    /// Adds a parent. Parents listed first take precedence.
    pub fn parent(mut self, parent: &Arc<Model>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Declares the local validation policy.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Defines the constructor. The signature is renamed to `__init__`.
    pub fn init<F>(self, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallFrame) -> PolyResult<Value> + Send + Sync + 'static,
    {
        self.method(signature.with_name(INIT), body)
    }

    /// Defines a checked method. Names starting or ending with `__`, other
    /// than `__init__`, are installed unchecked.
    pub fn method<F>(mut self, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallFrame) -> PolyResult<Value> + Send + Sync + 'static,
    {
        let checked = !is_reserved(signature.name()) || signature.name() == INIT;
        self.methods.insert(
            signature.name().to_string(),
            MethodDef {
                signature,
                body: Arc::new(body),
                checked,
            },
        );
        self
    }

    /// Defines a method that is bound but never checked.
    pub fn raw_method<F>(mut self, signature: Signature, body: F) -> Self
    where
        F: Fn(&CallFrame) -> PolyResult<Value> + Send + Sync + 'static,
    {
        self.methods.insert(
            signature.name().to_string(),
            MethodDef {
                signature,
                body: Arc::new(body),
                checked: false,
            },
        );
        self
    }

    /// Builds the model.
    ///
    /// Fails with the first definition error of any checked method.
    pub fn build(self) -> PolyResult<Arc<Model>> {
        let config = Config::merged(
            self.parents.iter().rev().map(|parent| &parent.config),
            self.config.as_ref(),
        );
        let policy = Arc::new(Policy::from_config(&config));

        let mut schema = Schema::new();
        let mut methods: IndexMap<String, CheckedFunction> = IndexMap::new();
        let mut raw_methods: IndexMap<String, RawMethod> = IndexMap::new();

        for parent in self.parents.iter().rev() {
            for (name, method) in &parent.methods {
                raw_methods.shift_remove(name);
                schema.insert(name, Arc::clone(method.fields()));
                methods.insert(name.clone(), method.rebind(&self.name, Arc::clone(&policy)));
            }
            for (name, raw) in &parent.raw_methods {
                methods.shift_remove(name);
                schema.remove(name);
                raw_methods.insert(name.clone(), raw.clone());
            }
        }

        let mut local = self.methods;
        if !local.contains_key(INIT) && !methods.contains_key(INIT) {
            local.insert(INIT.to_string(), MethodDef::default_init());
        }

        for (name, def) in local {
            if def.checked {
                let fields = Arc::new(build_fields(&def.signature, &policy)?);
                schema.insert(name.clone(), Arc::clone(&fields));
                raw_methods.shift_remove(&name);
                methods.insert(
                    name,
                    CheckedFunction::from_parts(
                        self.name.clone(),
                        Arc::new(def.signature),
                        fields,
                        Arc::clone(&policy),
                        def.body,
                    ),
                );
            } else {
                schema.remove(&name);
                methods.shift_remove(&name);
                raw_methods.insert(
                    name,
                    RawMethod {
                        signature: Arc::new(def.signature),
                        body: def.body,
                    },
                );
            }
        }

        debug!(
            model = %self.name,
            parents = self.parents.len(),
            methods = methods.len(),
            bypass = policy.bypass(),
            exempt_types = policy.exempt_types().len(),
            "Built model"
        );

        Ok(Arc::new(Model {
            class: ConcreteType::class(&self.name),
            name: self.name,
            parents: self.parents,
            config,
            policy,
            schema,
            methods,
            raw_methods,
        }))
    }
}

fn empty_init(_: &CallFrame) -> PolyResult<Value> {
    Ok(Value::None)
}

impl MethodDef {
    fn default_init() -> Self {
        Self {
            signature: Signature::method(INIT).returns(TypeHint::none()),
            body: Arc::new(empty_init),
            checked: true,
        }
    }
}

impl fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A class with checked methods.
pub struct Model {
    name: String,
    class: ConcreteType,
    parents: Vec<Arc<Model>>,
    config: Config,
    policy: Arc<Policy>,
    schema: Schema,
    methods: IndexMap<String, CheckedFunction>,
    raw_methods: IndexMap<String, RawMethod>,
}

impl Model {
    /// Starts building a model named `name`.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type of this model's instances.
    pub fn class(&self) -> &ConcreteType {
        &self.class
    }

    /// Returns the direct parents in declaration order.
    pub fn parents(&self) -> &[Arc<Model>] {
        &self.parents
    }

    /// Returns the merged policy declaration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the effective policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Returns the merged schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the checked method `name`.
    pub fn method(&self, name: &str) -> Option<&CheckedFunction> {
        self.methods.get(name)
    }

    /// Returns `true` if `name` can be called on this model or its instances.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name) || self.raw_methods.contains_key(name)
    }

    /// Creates an instance and runs the checked constructor on it.
    pub fn instantiate(self: &Arc<Self>, args: Arguments) -> PolyResult<Instance> {
        let instance = Instance {
            model: Arc::clone(self),
            object: Object::new(&self.name),
        };
        self.dispatch(Some(&instance), INIT, args)?;
        Ok(instance)
    }

    /// Calls a static or class method.
    pub fn call(self: &Arc<Self>, name: &str, args: Arguments) -> PolyResult<Value> {
        self.dispatch(None, name, args)
    }

    fn dispatch(
        self: &Arc<Self>,
        instance: Option<&Instance>,
        name: &str,
        args: Arguments,
    ) -> PolyResult<Value> {
        let receiver = |kind: CallableKind| -> PolyResult<Option<Receiver>> {
            match kind {
                CallableKind::Method => instance
                    .map(|i| Some(Receiver::Instance(i.clone())))
                    .ok_or_else(|| CallError::missing_receiver(name).into()),
                CallableKind::ClassMethod => Ok(Some(Receiver::Class(Arc::clone(self)))),
                CallableKind::Function | CallableKind::StaticMethod => Ok(None),
            }
        };

        if let Some(method) = self.methods.get(name) {
            return method.invoke(receiver(method.kind())?, args);
        }
        if let Some(raw) = self.raw_methods.get(name) {
            return raw.invoke(receiver(raw.signature.kind())?, args);
        }
        Err(CallError::unknown_method(&self.name, name).into())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field(
                "parents",
                &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// An instance of a [`Model`].
#[derive(Clone)]
pub struct Instance {
    model: Arc<Model>,
    object: Arc<Object>,
}

impl Instance {
    /// Returns the model.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Returns the underlying object.
    pub fn object(&self) -> &Arc<Object> {
        &self.object
    }

    /// Calls method `name` on this instance.
    pub fn call(&self, name: &str, args: Arguments) -> PolyResult<Value> {
        self.model.dispatch(Some(self), name, args)
    }

    /// Returns attribute `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.object.get(name)
    }

    /// Sets attribute `name`.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.object.set(name, value)
    }

    /// Returns the model's schema.
    pub fn schema(&self) -> &Schema {
        self.model.schema()
    }

    /// Returns the model's policy.
    pub fn policy(&self) -> &Policy {
        self.model.policy()
    }

    /// Returns this instance as a value.
    pub fn to_value(&self) -> Value {
        Value::Object(Arc::clone(&self.object))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Object(instance.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("object", &self.object)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DefinitionError, PolyError};
    use crate::signature::Parameter;

    fn noop(_: &CallFrame) -> PolyResult<Value> {
        Ok(Value::None)
    }

    #[test]
    fn test_default_init_synthesized() {
        let model = Model::builder("Empty").build().unwrap();
        assert_eq!(model.schema().names().collect::<Vec<_>>(), [INIT]);
        assert!(model.schema().get(INIT).unwrap().is_empty());
        assert!(model.instantiate(Arguments::new()).is_ok());
        assert!(model.instantiate(Arguments::new().arg(1)).is_err());
    }

    #[test]
    fn test_dunder_methods_unchecked() {
        let model = Model::builder("Printable")
            .method(Signature::method("__str__").param(Parameter::new("extra")), |_| {
                Ok(Value::from("printable"))
            })
            .method(
                Signature::method("_helper").arg("x", TypeHint::int()).returns(TypeHint::int()),
                noop,
            )
            .build()
            .unwrap();
        assert!(!model.schema().contains("__str__"));
        assert!(model.schema().contains("_helper"));
        let instance = model.instantiate(Arguments::new()).unwrap();
        assert_eq!(
            instance.call("__str__", Arguments::new().arg(1.5)).unwrap(),
            Value::from("printable")
        );
    }

    #[test]
    fn test_definition_error_aborts_build() {
        let err = Model::builder("Broken")
            .method(Signature::method("run").param(Parameter::new("x")), noop)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PolyError::Definition(DefinitionError::ReturnSignatureMissing { .. })
        ));
    }

    #[test]
    fn test_unknown_method() {
        let model = Model::builder("Thing").build().unwrap();
        let instance = model.instantiate(Arguments::new()).unwrap();
        let err = instance.call("fly", Arguments::new()).unwrap_err();
        assert_eq!(err.to_string(), "'Thing' object has no method 'fly'");
    }

    #[test]
    fn test_method_needs_instance() {
        let model = Model::builder("Thing")
            .method(Signature::method("run").returns(TypeHint::none()), noop)
            .build()
            .unwrap();
        let err = model.call("run", Arguments::new()).unwrap_err();
        assert!(matches!(err, PolyError::Call(CallError::MissingReceiver { .. })));
    }

    #[test]
    fn test_class_method_receives_model() {
        let model = Model::builder("Factory")
            .method(
                Signature::class_method("kind").returns(TypeHint::str()),
                |frame| Ok(Value::from(frame.model()?.name())),
            )
            .build()
            .unwrap();
        assert_eq!(model.call("kind", Arguments::new()).unwrap(), Value::from("Factory"));
    }

    #[test]
    fn test_reserved_names_unchecked() {
        let model = Model::builder("Vault")
            .method(Signature::method("__secret").param(Parameter::new("key")), noop)
            .method(Signature::method("token__").param(Parameter::new("key")), noop)
            .build()
            .unwrap();
        assert!(!model.schema().contains("__secret"));
        assert!(!model.schema().contains("token__"));
        assert!(model.has_method("__secret"));
        let vault = model.instantiate(Arguments::new()).unwrap();
        assert!(vault.call("__secret", Arguments::new().arg(1.5)).is_ok());
        assert!(!is_reserved("_helper"));
        assert!(is_reserved("__init__"));
    }

    #[test]
    fn test_winning_parent_decides_schema_and_dispatch() {
        fn raw(_: &CallFrame) -> PolyResult<Value> {
            Ok(Value::from("raw"))
        }

        let loose = Model::builder("Loose")
            .raw_method(Signature::method("x").param(Parameter::new("v")), raw)
            .build()
            .unwrap();
        let strict = Model::builder("Strict")
            .method(
                Signature::method("x").arg("v", TypeHint::int()).returns(TypeHint::none()),
                noop,
            )
            .build()
            .unwrap();

        let loose_first = Model::builder("A").parent(&loose).parent(&strict).build().unwrap();
        assert!(!loose_first.schema().contains("x"));
        assert!(loose_first.method("x").is_none());
        let a = loose_first.instantiate(Arguments::new()).unwrap();
        assert_eq!(a.call("x", Arguments::new().arg("text")).unwrap(), Value::from("raw"));

        let strict_first = Model::builder("B").parent(&strict).parent(&loose).build().unwrap();
        assert!(Arc::ptr_eq(
            strict_first.schema().get("x").unwrap(),
            strict.schema().get("x").unwrap()
        ));
        let b = strict_first.instantiate(Arguments::new()).unwrap();
        assert!(b.call("x", Arguments::new().arg("text")).is_err());
        assert_eq!(b.call("x", Arguments::new().arg(1)).unwrap(), Value::None);
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<Model>>();
        assert_send_sync::<Instance>();
    }
}
