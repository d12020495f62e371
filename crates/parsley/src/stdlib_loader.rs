//! `@std/api` exports (spec §4.7): the one `@std/*` module this crate
//! constructs itself instead of handing off to the host's [`Loader`], since
//! its auth wrappers need to call back into the evaluator to invoke the
//! handler `Function` they wrap — something a host-provided loader, which
//! only ever returns plain values, has no way to do.
//!
//! `parsley-stdlib::api` stays pure (gate checks only); this module is the
//! "evaluator's job" its own doc comment calls out: building the wrapper
//! `Function`s around those checks.

use std::rc::Rc;

use parsley_core::environment::{AuthContext, Environment};
use parsley_core::value::function::{Evaluate, Function};
use parsley_core::value::{Builtin, Dict, Value};
use parsley_core::ErrorValue;

use parsley_stdlib::api;

use crate::ast::{not_callable_error, Expr};

fn auth_ctx(env: &Environment) -> Result<Rc<dyn AuthContext>, ErrorValue> {
    env.host
        .auth
        .clone()
        .ok_or_else(|| ErrorValue::name_error("no AuthContext configured for this evaluation").with_hint("the host did not provide an AuthContext"))
}

fn call_handler(handler: &Value, args: &[Value], evaluator: &dyn Evaluate) -> Result<Value, ErrorValue> {
    match handler {
        Value::Function(f) => evaluator.call_function(f, args),
        Value::Builtin(b) => b.call(args),
        other => Err(not_callable_error(other.value_type().as_str(), matches!(other, Value::Null))),
    }
}

/// Builds the `Function` that stands in for a gated handler: calling it
/// runs `gate` against the environment in scope at call time, then forwards
/// to `handler` on success.
fn wrap(env: &Environment, name: &'static str, handler: Value, gate: impl Fn(&Environment) -> Result<(), ErrorValue> + 'static) -> Value {
    let body = Expr::Native(Rc::new(move |args, call_env, evaluator| {
        gate(call_env)?;
        call_handler(&handler, args, evaluator)
    }));
    Value::Function(Rc::new(Function {
        name: Some(name.to_string()),
        params: Vec::new(),
        body: Rc::new(body),
        env: env.clone(),
    }))
}

fn make_gate(env: Environment, name: &'static str, gate: impl Fn(&Environment) -> Result<(), ErrorValue> + Clone + 'static) -> Builtin {
    Builtin::new(name, Some(1), move |args| Ok(wrap(&env, name, args[0].clone(), gate.clone())))
}

fn make_roles(env: Environment) -> Builtin {
    Builtin::new("roles", Some(1), move |args| {
        let Some(Value::Array(allowed)) = args.first() else {
            return Err(ErrorValue::type_error("TYPE-0028", "roles: expected an array of role names"));
        };
        let mut names = Vec::with_capacity(allowed.len());
        for role in allowed.iter() {
            let Value::String(s) = role else {
                return Err(ErrorValue::type_error("TYPE-0028", "roles: expected an array of role names"));
            };
            names.push(s.to_string());
        }
        let env = env.clone();
        Ok(Value::Builtin(Builtin::new("roles(...)", Some(1), move |inner_args| {
            let names = names.clone();
            Ok(wrap(&env, "roles(...)", inner_args[0].clone(), move |call_env| {
                let ctx = auth_ctx(call_env)?;
                api::check_roles(ctx.as_ref(), &names)
            }))
        })))
    })
}

fn error_builtin(name: &'static str, build: fn(String) -> ErrorValue) -> Builtin {
    Builtin::new(name, Some(1), move |args| {
        let Some(Value::String(message)) = args.first() else {
            return Err(ErrorValue::type_error("TYPE-0010", format!("{name}: expected a string message")));
        };
        Ok(Value::error(build(message.to_string())))
    })
}

#[must_use]
pub fn std_api_exports(env: &Environment) -> Value {
    let dict = Dict::new();
    dict.insert("public", Value::Builtin(make_gate(env.clone(), "public", |_: &Environment| api::check_public())));
    dict.insert(
        "auth",
        Value::Builtin(make_gate(env.clone(), "auth", |call_env: &Environment| api::check_auth(auth_ctx(call_env)?.as_ref()))),
    );
    dict.insert(
        "adminOnly",
        Value::Builtin(make_gate(env.clone(), "adminOnly", |call_env: &Environment| {
            api::check_admin_only(auth_ctx(call_env)?.as_ref())
        })),
    );
    dict.insert("roles", Value::Builtin(make_roles(env.clone())));
    dict.insert("notFound", Value::Builtin(error_builtin("notFound", api::not_found)));
    dict.insert("forbidden", Value::Builtin(error_builtin("forbidden", api::forbidden)));
    dict.insert("badRequest", Value::Builtin(error_builtin("badRequest", api::bad_request)));
    dict.insert("unauthorized", Value::Builtin(error_builtin("unauthorized", api::unauthorized)));
    dict.insert("conflict", Value::Builtin(error_builtin("conflict", api::conflict)));
    dict.insert("serverError", Value::Builtin(error_builtin("serverError", api::server_error)));
    Value::Dict(dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::config::EngineConfig;
    use parsley_core::environment::HostContext;
    use parsley_core::value::Value;

    struct FakeCtx {
        authenticated: bool,
        roles: Vec<String>,
    }

    impl AuthContext for FakeCtx {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }
        fn user(&self) -> Option<Value> {
            None
        }
        fn roles(&self) -> Vec<String> {
            self.roles.clone()
        }
    }

    fn env_with_auth(ctx: Option<Rc<dyn AuthContext>>) -> Environment {
        let mut host = HostContext::new(EngineConfig::default());
        host.auth = ctx;
        Environment::root(Rc::new(host))
    }

    fn handler_returning(value: Value) -> Value {
        Value::Builtin(Builtin::new("handler", Some(0), move |_| Ok(value.clone())))
    }

    fn call(wrapped: &Value, evaluator: &crate::evaluator::Evaluator) -> Result<Value, ErrorValue> {
        let Value::Function(f) = wrapped else { panic!("expected a wrapped function") };
        evaluator.call_function(f, &[])
    }

    #[test]
    fn public_never_gates() {
        let env = env_with_auth(None);
        let exports = std_api_exports(&env);
        let Value::Dict(dict) = &exports else { panic!("expected dict") };
        let Value::Builtin(public) = dict.peek("public").unwrap() else { panic!("expected builtin") };
        let wrapped = public.call(&[handler_returning(Value::Integer(1))]).unwrap();
        let evaluator = crate::evaluator::Evaluator::new(Rc::clone(&env.host));
        assert_eq!(call(&wrapped, &evaluator).unwrap(), Value::Integer(1));
    }

    #[test]
    fn auth_rejects_when_no_auth_context_is_configured() {
        let env = env_with_auth(None);
        let exports = std_api_exports(&env);
        let Value::Dict(dict) = &exports else { panic!("expected dict") };
        let Value::Builtin(auth) = dict.peek("auth").unwrap() else { panic!("expected builtin") };
        let wrapped = auth.call(&[handler_returning(Value::Integer(1))]).unwrap();
        let evaluator = crate::evaluator::Evaluator::new(Rc::clone(&env.host));
        assert!(call(&wrapped, &evaluator).is_err());
    }

    #[test]
    fn roles_rejects_when_role_is_missing() {
        let env = env_with_auth(Some(Rc::new(FakeCtx { authenticated: true, roles: vec!["editor".to_string()] })));
        let exports = std_api_exports(&env);
        let Value::Dict(dict) = &exports else { panic!("expected dict") };
        let Value::Builtin(roles) = dict.peek("roles").unwrap() else { panic!("expected builtin") };
        let gate = roles.call(&[Value::array(vec![Value::string("admin")])]).unwrap();
        let Value::Builtin(gate) = gate else { panic!("expected builtin") };
        let wrapped = gate.call(&[handler_returning(Value::Integer(1))]).unwrap();
        let evaluator = crate::evaluator::Evaluator::new(Rc::clone(&env.host));
        let err = call(&wrapped, &evaluator).unwrap_err();
        assert_eq!(err.code, "HTTP-403");
    }

    #[test]
    fn error_builders_carry_the_http_code() {
        let env = env_with_auth(None);
        let exports = std_api_exports(&env);
        let Value::Dict(dict) = &exports else { panic!("expected dict") };
        let Value::Builtin(not_found) = dict.peek("notFound").unwrap() else { panic!("expected builtin") };
        let Value::Error(err) = not_found.call(&[Value::string("no such user")]).unwrap() else { panic!("expected error value") };
        assert_eq!(err.code, "HTTP-404");
    }
}
