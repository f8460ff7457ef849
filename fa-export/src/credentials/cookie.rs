//! FA login cookie parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::FaError;

/// `x=token; y=token` with `x`, `y` drawn from `a`/`b`; the markers are
/// checked for distinctness after matching.
static COOKIE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ab])=([0-9a-f-]+); ?([ab])=([0-9a-f-]+)$").unwrap());

pub const COOKIE_FORMAT_MESSAGE: &str = "The login cookie provided must be in the format \
     \"b=xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx; a=xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx\"";

/// A validated FA login cookie.
///
/// The original string (trimmed) is kept as-is because it is sent upstream
/// verbatim. `Debug` redacts the tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCookie {
    value: String,
    a: String,
    b: String,
}

impl LoginCookie {
    /// Validate a raw cookie string.
    ///
    /// Fails with a `LoginCookie` error for anything that is not exactly two
    /// distinct `a`/`b` assignments of lowercase hex-and-hyphen tokens.
    pub fn parse(raw: &str) -> Result<Self, FaError> {
        let value = raw.trim();
        let caps = COOKIE_REGEX
            .captures(value)
            .ok_or_else(|| FaError::login_cookie(COOKIE_FORMAT_MESSAGE))?;

        let (first, first_token) = (&caps[1], &caps[2]);
        let (second, second_token) = (&caps[3], &caps[4]);
        if first == second {
            return Err(FaError::login_cookie(COOKIE_FORMAT_MESSAGE));
        }

        let (a, b) = if first == "a" {
            (first_token, second_token)
        } else {
            (second_token, first_token)
        };

        Ok(Self {
            value: value.to_string(),
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    /// The cookie exactly as it is sent upstream.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn a(&self) -> &str {
        &self.a
    }

    pub fn b(&self) -> &str {
        &self.b
    }

    /// Stable identifier for the session, independent of component order.
    ///
    /// Used in cache keys so per-user documents never share an entry and the
    /// raw tokens never appear in the cache store's key space.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.a.as_bytes());
        hasher.update(b"|");
        hasher.update(self.b.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for LoginCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCookie")
            .field("digest", &&self.digest()[..12])
            .finish()
    }
}
