//! Invocation enforcement.

use tracing::{debug, trace};

use crate::args::{Arguments, Binding, CallFrame};
use crate::config::Policy;
use crate::error::{PolyResult, ValidationFailure, ValidationFailureSet};
use crate::schema::FieldSet;
use crate::signature::Signature;

/// Checks one call's arguments against a callable's fields.
///
/// The enforcer holds only borrowed, immutable data; any number of calls may
/// be enforced concurrently against the same fields.
#[derive(Debug, Clone, Copy)]
pub struct Enforcer<'a> {
    source: &'a str,
    signature: &'a Signature,
    fields: &'a FieldSet,
    policy: &'a Policy,
}

impl<'a> Enforcer<'a> {
    /// Creates an enforcer. `source` names the callable or model in failures.
    pub const fn new(
        source: &'a str,
        signature: &'a Signature,
        fields: &'a FieldSet,
        policy: &'a Policy,
    ) -> Self {
        Self {
            source,
            signature,
            fields,
            policy,
        }
    }

    /// Binds and checks `args`.
    ///
    /// Type mismatches are reported together as a [`ValidationFailureSet`]
    /// before any calling-convention error, so a call that is both ill-typed
    /// and short an argument reports the types.
    pub fn enforce(&self, args: Arguments) -> PolyResult<CallFrame> {
        let callable = self.signature.name();
        let parameters = self.signature.declared_parameters();
        let mut binding = Binding::bind(callable, parameters, args);

        for field in self.fields {
            if !binding.bound.contains_key(field.name()) {
                if let Some(value) = field.default().get() {
                    binding.bound.insert(field.name().to_string(), value);
                }
            }
        }

        if self.policy.bypass() {
            trace!(source = %self.source, callable = %callable, "Type checks bypassed");
        } else {
            let failures = self.check(&binding);
            if !failures.is_empty() {
                debug!(
                    source = %self.source,
                    callable = %callable,
                    failures = failures.len(),
                    "Rejected call arguments"
                );
                return Err(ValidationFailureSet::new(failures).into());
            }
        }

        let frame = binding.finish(callable, parameters, |param| {
            self.fields
                .get(param.name())
                .map_or(param.has_default(), |field| !field.is_required())
        })?;

        trace!(source = %self.source, callable = %callable, "Call arguments accepted");
        Ok(frame)
    }

    fn check(&self, binding: &Binding) -> Vec<ValidationFailure> {
        let exempt = self.policy.exempt_types();
        binding
            .bound
            .iter()
            .filter_map(|(name, value)| {
                let field = self.fields.get(name)?;
                let resolved = field.resolved_types(exempt);
                if resolved.accepts(&value.type_of()) {
                    None
                } else {
                    Some(ValidationFailure::mismatch(
                        self.source,
                        name,
                        value,
                        resolved.expected(),
                    ))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{CallError, Expected, PolyError};
    use crate::field::FieldOptions;
    use crate::hint::TypeHint;
    use crate::schema::build_fields;
    use crate::signature::Parameter;
    use crate::value::Value;

    fn enforce(sig: &Signature, policy: &Policy, args: Arguments) -> PolyResult<CallFrame> {
        let fields = build_fields(sig, policy)?;
        Enforcer::new(sig.name(), sig, &fields, policy).enforce(args)
    }

    #[test]
    fn test_union_mismatch_reported() {
        let sig = Signature::function("f")
            .arg("a", TypeHint::union([TypeHint::int(), TypeHint::str()]))
            .arg("b", TypeHint::any())
            .returns(TypeHint::any());
        let args = Arguments::new().kwarg("a", 2.0).kwarg("b", "x");
        let err = enforce(&sig, &Policy::new(), args).unwrap_err();
        let set = err.validation_failures().unwrap();
        assert_eq!(set.len(), 1);
        let failure = &set.failures()[0];
        assert_eq!(failure.parameter, "a");
        assert_eq!(failure.source, "f");
        assert_eq!(failure.expected, Expected::Many(vec!["int".into(), "str".into()]));
        assert_eq!(
            failure.message,
            "Expected '('int', 'str')' for attribute 'a', but received type 'float'."
        );
    }

    #[test]
    fn test_all_failures_collected_in_binding_order() {
        let sig = Signature::function("f")
            .arg("a", TypeHint::int())
            .arg("b", TypeHint::str())
            .arg("c", TypeHint::bool())
            .returns(TypeHint::none());
        let args = Arguments::new().arg("x").kwarg("c", 1).kwarg("b", "ok");
        let err = enforce(&sig, &Policy::new(), args).unwrap_err();
        let params: Vec<_> = err
            .validation_failures()
            .unwrap()
            .failures()
            .iter()
            .map(|f| f.parameter.clone())
            .collect();
        assert_eq!(params, ["a", "c"]);
    }

    #[test]
    fn test_type_failures_win_over_missing_arguments() {
        let sig = Signature::function("f")
            .arg("a", TypeHint::int())
            .arg("b", TypeHint::int())
            .returns(TypeHint::none());
        let err = enforce(&sig, &Policy::new(), Arguments::new().arg("x")).unwrap_err();
        assert!(matches!(err, PolyError::Validation(_)));

        let err = enforce(&sig, &Policy::new(), Arguments::new().arg(1)).unwrap_err();
        assert!(matches!(
            err,
            PolyError::Call(CallError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_defaults_applied() {
        let sig = Signature::function("f")
            .arg_with_default("n", TypeHint::int(), 3)
            .returns(TypeHint::none());
        let frame = enforce(&sig, &Policy::new(), Arguments::new()).unwrap();
        assert_eq!(frame.get("n"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_factory_result_is_checked() {
        let spec = FieldOptions::new()
            .with_default_factory(|| Value::Int(1))
            .build()
            .unwrap();
        let sig = Signature::function("f")
            .param(Parameter::typed("s", TypeHint::str()).with_field(spec))
            .returns(TypeHint::none());
        let err = enforce(&sig, &Policy::new(), Arguments::new()).unwrap_err();
        assert!(err.validation_failures().is_some());
    }

    #[test]
    fn test_bypass_accepts_anything() {
        let policy = Policy::from_config(&Config::new().ignore(true));
        let sig = Signature::function("f")
            .arg("n", TypeHint::int())
            .returns(TypeHint::none());
        let frame = enforce(&sig, &policy, Arguments::new().arg("text")).unwrap();
        assert_eq!(frame.get("n"), Some(&Value::from("text")));
    }

    #[test]
    fn test_exempt_type_accepts_anything() {
        let policy = Policy::from_config(&Config::new().ignored_types(["Actor"]));
        let sig = Signature::function("f")
            .arg("actor", TypeHint::class("Actor"))
            .returns(TypeHint::none());
        assert!(enforce(&sig, &policy, Arguments::new().arg(42)).is_ok());
    }

    #[test]
    fn test_optional_field_may_stay_unbound() {
        let spec = FieldOptions::new().required(false).build().unwrap();
        let sig = Signature::function("f")
            .param(Parameter::typed("note", TypeHint::optional(TypeHint::str())).with_field(spec))
            .returns(TypeHint::none());
        let frame = enforce(&sig, &Policy::new(), Arguments::new()).unwrap();
        assert!(frame.get("note").is_none());
        assert_eq!(frame.arg::<Option<String>>("note").unwrap(), None);
    }
}
