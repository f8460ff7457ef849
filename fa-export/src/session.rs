//! Per-request session state.

use crate::credentials::LoginCookie;

/// Who supplied the credential a request runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// The caller sent a cookie in the `FA_COOKIE` header.
    Caller,
    /// The process's own session was used.
    System,
}

/// A credential together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub cookie: LoginCookie,
    pub origin: CredentialOrigin,
}

impl ResolvedCredential {
    pub fn caller(cookie: LoginCookie) -> Self {
        Self {
            cookie,
            origin: CredentialOrigin::Caller,
        }
    }

    pub fn system(cookie: LoginCookie) -> Self {
        Self {
            cookie,
            origin: CredentialOrigin::System,
        }
    }
}

/// Everything a single request needs to talk to FA.
///
/// Built once per request from the resolved credential and the `sfw` query
/// parameter, then passed by reference to the upstream layer. It is never
/// stored anywhere that outlives the request.
#[derive(Debug)]
pub struct SessionContext {
    credential: LoginCookie,
    origin: CredentialOrigin,
    safe_for_work: bool,
}

impl SessionContext {
    pub fn new(resolved: ResolvedCredential, safe_for_work: bool) -> Self {
        Self {
            credential: resolved.cookie,
            origin: resolved.origin,
            safe_for_work,
        }
    }

    pub fn credential(&self) -> &LoginCookie {
        &self.credential
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }

    pub fn is_caller_supplied(&self) -> bool {
        self.origin == CredentialOrigin::Caller
    }

    pub fn safe_for_work(&self) -> bool {
        self.safe_for_work
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_carries_origin_and_scope() {
        let cookie = LoginCookie::parse("a=0a0a; b=1b1b").unwrap();
        let ctx = SessionContext::new(ResolvedCredential::caller(cookie.clone()), true);
        assert!(ctx.is_caller_supplied());
        assert!(ctx.safe_for_work());
        assert_eq!(ctx.credential(), &cookie);

        let ctx = SessionContext::new(ResolvedCredential::system(cookie), false);
        assert_eq!(ctx.origin(), CredentialOrigin::System);
        assert!(!ctx.safe_for_work());
    }
}
