//! Claims carried by the bearer tokens this service issues.
//!
//! Tokens are signed with HS256 using the configured secret. Only the
//! registered `sub`, `iat` and `exp` claims are used; `sub` holds the user id
//! in its decimal string form, as the JWT registered claim is a string.

use entity::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BearerClaims {
    pub(crate) sub: String,
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

impl BearerClaims {
    pub(crate) fn new(user_id: Id, issued_at: u64, lifetime_secs: u64) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
        }
    }

    pub(crate) fn user_id(&self) -> Option<Id> {
        self.sub.parse().ok()
    }
}
