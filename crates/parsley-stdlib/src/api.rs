//! `@std/api` (spec §4.7): auth-gating wrappers and HTTP error builders.
//!
//! The evaluator owns the actual "wrap a function" step (calling a
//! user-defined `Function` needs an [`Evaluate`](parsley_core::value::function::Evaluate),
//! which these guards don't need); this module is the pure gate a handler
//! wrapper checks before invoking the wrapped function, grounded on
//! `oxide-auth`'s `user_has_permission`/group-role-check idiom
//! (`permissions.rs`), generalised from a database lookup to the
//! request-scoped `AuthContext` collaborator.

use parsley_core::environment::AuthContext;
use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use tracing::debug;

fn http_error(status: u16, kind: ErrorKind, message: impl Into<String>) -> ErrorValue {
    ErrorValue::new(kind, format!("HTTP-{status}"), message)
}

/// Parses the status integer back out of an `HTTP-4xx`/`HTTP-5xx` code.
#[must_use]
pub fn http_status(error: &ErrorValue) -> Option<u16> {
    error.code.strip_prefix("HTTP-").and_then(|s| s.parse().ok())
}

pub fn not_found(message: impl Into<String>) -> ErrorValue {
    http_error(404, ErrorKind::Validation, message)
}

pub fn forbidden(message: impl Into<String>) -> ErrorValue {
    http_error(403, ErrorKind::Validation, message)
}

pub fn bad_request(message: impl Into<String>) -> ErrorValue {
    http_error(400, ErrorKind::Validation, message)
}

pub fn unauthorized(message: impl Into<String>) -> ErrorValue {
    http_error(401, ErrorKind::Validation, message)
}

pub fn conflict(message: impl Into<String>) -> ErrorValue {
    http_error(409, ErrorKind::Validation, message)
}

pub fn server_error(message: impl Into<String>) -> ErrorValue {
    http_error(500, ErrorKind::Io, message)
}

/// `public(handler)`: no gate, always passes.
pub fn check_public() -> Result<(), ErrorValue> {
    Ok(())
}

/// `auth(handler)`: requires an authenticated request.
pub fn check_auth(ctx: &dyn AuthContext) -> Result<(), ErrorValue> {
    if ctx.is_authenticated() {
        Ok(())
    } else {
        Err(unauthorized("authentication required"))
    }
}

/// `adminOnly(handler)`: requires the `admin` role.
pub fn check_admin_only(ctx: &dyn AuthContext) -> Result<(), ErrorValue> {
    check_roles(ctx, &["admin".to_string()])
}

/// `roles(allowed, handler)`: requires at least one of `allowed` among the
/// request's roles. Implicitly requires authentication first.
pub fn check_roles(ctx: &dyn AuthContext, allowed: &[String]) -> Result<(), ErrorValue> {
    check_auth(ctx)?;
    let held = ctx.roles();
    if allowed.iter().any(|role| held.contains(role)) {
        Ok(())
    } else {
        debug!(?allowed, ?held, "role check failed");
        Err(forbidden("insufficient role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCtx {
        authenticated: bool,
        roles: Vec<String>,
    }

    impl AuthContext for FakeCtx {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }
        fn user(&self) -> Option<parsley_core::value::Value> {
            None
        }
        fn roles(&self) -> Vec<String> {
            self.roles.clone()
        }
    }

    #[test]
    fn public_always_passes() {
        assert!(check_public().is_ok());
    }

    #[test]
    fn auth_rejects_anonymous() {
        let ctx = FakeCtx { authenticated: false, roles: vec![] };
        let err = check_auth(&ctx).unwrap_err();
        assert_eq!(err.code, "HTTP-401");
    }

    #[test]
    fn auth_accepts_authenticated() {
        let ctx = FakeCtx { authenticated: true, roles: vec![] };
        assert!(check_auth(&ctx).is_ok());
    }

    #[test]
    fn admin_only_rejects_non_admin() {
        let ctx = FakeCtx { authenticated: true, roles: vec!["editor".to_string()] };
        let err = check_admin_only(&ctx).unwrap_err();
        assert_eq!(err.code, "HTTP-403");
    }

    #[test]
    fn admin_only_accepts_admin() {
        let ctx = FakeCtx { authenticated: true, roles: vec!["admin".to_string()] };
        assert!(check_admin_only(&ctx).is_ok());
    }

    #[test]
    fn roles_requires_auth_before_role_check() {
        let ctx = FakeCtx { authenticated: false, roles: vec!["admin".to_string()] };
        let err = check_roles(&ctx, &["admin".to_string()]).unwrap_err();
        assert_eq!(err.code, "HTTP-401");
    }

    #[test]
    fn http_status_parses_the_code_suffix() {
        assert_eq!(http_status(&not_found("x")), Some(404));
        assert_eq!(http_status(&server_error("x")), Some(500));
    }
}
