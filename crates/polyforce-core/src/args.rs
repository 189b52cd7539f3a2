//! Call arguments and argument binding.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{CallError, PolyResult};
use crate::model::{Instance, Model};
use crate::signature::{ParamKind, Parameter};
use crate::value::{FromValue, Object, Value};

/// Arguments supplied to one call.
///
/// ```rust
/// use polyforce_core::Arguments;
///
/// let args = Arguments::new().arg(1).kwarg("name", "Ada");
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: IndexMap<String, Value>,
}

impl Arguments {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only positional arguments.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keywords: IndexMap::new(),
        }
    }

    /// Only keyword arguments.
    pub fn keywords<K: Into<String>>(values: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self {
            positional: Vec::new(),
            keywords: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword argument, replacing an earlier one with the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    /// Returns the positional arguments.
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword arguments.
    pub fn keyword_values(&self) -> &IndexMap<String, Value> {
        &self.keywords
    }

    /// Returns the total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    /// Returns `true` if no argument was supplied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The receiver a method or class method was invoked on.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// A model instance.
    Instance(Instance),
    /// A model, for class methods.
    Class(Arc<Model>),
    /// Any other value, for methods wrapped outside a model.
    Value(Value),
}

impl From<Instance> for Receiver {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<Arc<Model>> for Receiver {
    fn from(model: Arc<Model>) -> Self {
        Self::Class(model)
    }
}

impl From<Value> for Receiver {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Arc<Object>> for Receiver {
    fn from(object: Arc<Object>) -> Self {
        Self::Value(Value::Object(object))
    }
}

/// Arguments bound to a callable's parameters, handed to its body.
#[derive(Debug, Clone)]
pub struct CallFrame {
    callable: String,
    receiver: Option<Receiver>,
    arguments: IndexMap<String, Value>,
    var_positional: Vec<Value>,
    var_keyword: IndexMap<String, Value>,
}

impl CallFrame {
    /// Returns the callable name.
    pub fn callable(&self) -> &str {
        &self.callable
    }

    /// Returns the receiver, if the call had one.
    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }

    /// Returns the model instance the method was invoked on.
    pub fn instance(&self) -> PolyResult<&Instance> {
        match &self.receiver {
            Some(Receiver::Instance(instance)) => Ok(instance),
            _ => Err(CallError::missing_receiver(&self.callable).into()),
        }
    }

    /// Returns the model a class method was invoked on, or the model of the
    /// instance for methods.
    pub fn model(&self) -> PolyResult<&Arc<Model>> {
        match &self.receiver {
            Some(Receiver::Class(model)) => Ok(model),
            Some(Receiver::Instance(instance)) => Ok(instance.model()),
            _ => Err(CallError::missing_receiver(&self.callable).into()),
        }
    }

    /// Returns the raw bound value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// Converts the bound value of `name`.
    ///
    /// An unbound optional parameter reads as `None`.
    pub fn arg<T: FromValue>(&self, name: &str) -> PolyResult<T> {
        match self.arguments.get(name) {
            Some(value) => T::from_value(value).map_err(|source| {
                CallError::Conversion {
                    callable: self.callable.clone(),
                    parameter: name.to_string(),
                    source,
                }
                .into()
            }),
            None => T::from_value(&Value::None)
                .map_err(|_| CallError::missing_argument(&self.callable, name).into()),
        }
    }

    /// Returns every bound argument in parameter order.
    pub fn arguments(&self) -> &IndexMap<String, Value> {
        &self.arguments
    }

    /// Returns the extra positional arguments.
    pub fn varargs(&self) -> &[Value] {
        &self.var_positional
    }

    /// Returns the extra keyword arguments.
    pub fn kwargs(&self) -> &IndexMap<String, Value> {
        &self.var_keyword
    }

    pub(crate) fn with_receiver(mut self, receiver: Option<Receiver>) -> Self {
        self.receiver = receiver;
        self
    }
}

/// The outcome of binding arguments to parameters.
///
/// Binding never fails outright: calling-convention problems are recorded and
/// reported by [`Binding::finish`], after type checks had a chance to run.
#[derive(Debug)]
pub(crate) struct Binding {
    pub(crate) bound: IndexMap<String, Value>,
    var_positional: Vec<Value>,
    var_keyword: IndexMap<String, Value>,
    problems: Vec<CallError>,
}

impl Binding {
    /// Binds `args` to `parameters` (receiver already excluded).
    pub(crate) fn bind(callable: &str, parameters: &[Parameter], args: Arguments) -> Self {
        let mut bound = IndexMap::new();
        let mut problems = Vec::new();
        let collects_positional = parameters
            .iter()
            .any(|p| p.kind() == ParamKind::VarPositional);
        let collects_keywords = parameters.iter().any(|p| p.kind() == ParamKind::VarKeyword);

        let slots: Vec<&Parameter> = parameters
            .iter()
            .filter(|p| p.kind().accepts_positional())
            .collect();
        let given = args.positional.len();
        let mut positional = args.positional.into_iter();
        for slot in &slots {
            match positional.next() {
                Some(value) => {
                    bound.insert(slot.name().to_string(), value);
                }
                None => break,
            }
        }

        let extra: Vec<Value> = positional.collect();
        let var_positional = if extra.is_empty() || collects_positional {
            extra
        } else {
            problems.push(CallError::TooManyPositional {
                callable: callable.to_string(),
                expected: slots.len(),
                given,
            });
            Vec::new()
        };

        let mut var_keyword = IndexMap::new();
        for (name, value) in args.keywords {
            let target = parameters
                .iter()
                .find(|p| p.name() == name && p.kind().accepts_keyword());
            match target {
                Some(_) if bound.contains_key(&name) => {
                    problems.push(CallError::DuplicateArgument {
                        callable: callable.to_string(),
                        parameter: name,
                    });
                }
                Some(_) => {
                    bound.insert(name, value);
                }
                None if collects_keywords => {
                    var_keyword.insert(name, value);
                }
                None => problems.push(CallError::UnexpectedKeyword {
                    callable: callable.to_string(),
                    parameter: name,
                }),
            }
        }

        Self {
            bound,
            var_positional,
            var_keyword,
            problems,
        }
    }

    /// Fills unbound parameters from their declared defaults.
    pub(crate) fn apply_parameter_defaults(&mut self, parameters: &[Parameter]) {
        for param in parameters.iter().filter(|p| !p.kind().is_variadic()) {
            if !self.bound.contains_key(param.name()) {
                if let Some(value) = param.default_for_call() {
                    self.bound.insert(param.name().to_string(), value);
                }
            }
        }
    }

    /// Reports the first calling-convention problem, or produces the frame.
    ///
    /// `is_optional` decides whether an unbound parameter may stay unbound.
    pub(crate) fn finish(
        mut self,
        callable: &str,
        parameters: &[Parameter],
        is_optional: impl Fn(&Parameter) -> bool,
    ) -> Result<CallFrame, CallError> {
        if !self.problems.is_empty() {
            return Err(self.problems.remove(0));
        }

        let mut arguments = IndexMap::with_capacity(self.bound.len());
        for param in parameters.iter().filter(|p| !p.kind().is_variadic()) {
            match self.bound.shift_remove(param.name()) {
                Some(value) => {
                    arguments.insert(param.name().to_string(), value);
                }
                None if is_optional(param) => {}
                None => return Err(CallError::missing_argument(callable, param.name())),
            }
        }

        Ok(CallFrame {
            callable: callable.to_string(),
            receiver: None,
            arguments,
            var_positional: self.var_positional,
            var_keyword: self.var_keyword,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::TypeHint;

    fn params() -> Vec<Parameter> {
        vec![
            Parameter::typed("a", TypeHint::int()),
            Parameter::typed("b", TypeHint::str()).with_default("x"),
            Parameter::typed("c", TypeHint::bool()).keyword_only(),
        ]
    }

    fn optional(p: &Parameter) -> bool {
        p.has_default()
    }

    #[test]
    fn test_positional_then_keyword() {
        let args = Arguments::new().arg(1).kwarg("c", true);
        let mut binding = Binding::bind("f", &params(), args);
        binding.apply_parameter_defaults(&params());
        let frame = binding.finish("f", &params(), optional).unwrap();
        assert_eq!(frame.arg::<i64>("a").unwrap(), 1);
        assert_eq!(frame.arg::<String>("b").unwrap(), "x");
        assert!(frame.arg::<bool>("c").unwrap());
        assert_eq!(frame.arguments().keys().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_keyword_only_not_positional() {
        let args = Arguments::positional([Value::Int(1), Value::from("y"), Value::Bool(true)]);
        let err = Binding::bind("f", &params(), args)
            .finish("f", &params(), optional)
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::TooManyPositional {
                expected: 2,
                given: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_argument() {
        let args = Arguments::new().kwarg("c", false);
        let err = Binding::bind("f", &params(), args)
            .finish("f", &params(), optional)
            .unwrap_err();
        assert_eq!(err.to_string(), "f() missing required argument: 'a'");
    }

    #[test]
    fn test_duplicate_argument() {
        let args = Arguments::new().arg(1).kwarg("a", 2).kwarg("c", true);
        let err = Binding::bind("f", &params(), args)
            .finish("f", &params(), optional)
            .unwrap_err();
        assert!(matches!(err, CallError::DuplicateArgument { .. }));
    }

    #[test]
    fn test_unexpected_keyword() {
        let args = Arguments::new().arg(1).kwarg("c", true).kwarg("zzz", 0);
        let err = Binding::bind("f", &params(), args)
            .finish("f", &params(), optional)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "f() got an unexpected keyword argument 'zzz'"
        );
    }

    #[test]
    fn test_positional_only_rejects_keyword() {
        let params = vec![Parameter::typed("a", TypeHint::int()).positional_only()];
        let err = Binding::bind("f", &params, Arguments::new().kwarg("a", 1))
            .finish("f", &params, optional)
            .unwrap_err();
        assert!(matches!(err, CallError::UnexpectedKeyword { .. }));
    }

    #[test]
    fn test_variadics_collect_extras() {
        let params = vec![
            Parameter::typed("a", TypeHint::int()),
            Parameter::typed("rest", TypeHint::any()).var_positional(),
            Parameter::typed("options", TypeHint::any()).var_keyword(),
        ];
        let args = Arguments::positional([Value::Int(1), Value::Int(2), Value::Int(3)])
            .kwarg("verbose", true);
        let frame = Binding::bind("f", &params, args)
            .finish("f", &params, optional)
            .unwrap();
        assert_eq!(frame.varargs(), &[Value::Int(2), Value::Int(3)]);
        assert_eq!(frame.kwargs().get("verbose"), Some(&Value::Bool(true)));
        assert!(frame.get("rest").is_none());
    }

    #[test]
    fn test_frame_conversion_error() {
        let params = vec![Parameter::typed("a", TypeHint::any())];
        let frame = Binding::bind("f", &params, Arguments::new().arg("text"))
            .finish("f", &params, optional)
            .unwrap();
        let err = frame.arg::<i64>("a").unwrap_err();
        assert!(err.to_string().contains("argument 'a' of f()"));
        assert!(frame.arg::<Option<i64>>("missing").unwrap().is_none());
        assert!(frame.instance().is_err());
    }
}
