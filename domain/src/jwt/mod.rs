//! Bearer tokens for the HTTP API and the realtime upgrade.
//!
//! A token is issued on login and presented as `Authorization: Bearer <token>`
//! (or as the `token` query parameter when opening `/ws`, where browsers cannot
//! set headers). Validation only proves who the caller is; whether that user
//! still exists is checked by the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain::jwt::{authenticate_token, generate_token};
//! use domain::users;
//! use service::config::Config;
//!
//! fn example(config: &Config, user: users::Model) -> Result<(), domain::error::Error> {
//!     let jwt = generate_token(config, user)?;
//!     let user_id = authenticate_token(config, &jwt.token)?;
//!     assert_eq!(user_id, jwt.user.id);
//!     Ok(())
//! }
//! ```

use crate::error::Error;
use crate::users;
use chrono::Utc;
use claims::BearerClaims;
use entity::Id;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use service::config::Config;

// re-export the Jwt struct from the entity module
pub use entity::jwt::Jwt;

pub(crate) mod claims;

/// Signs a token for `user` valid for the configured lifetime.
pub fn generate_token(config: &Config, user: users::Model) -> Result<Jwt, Error> {
    let issued_at = Utc::now().timestamp().max(0) as u64;
    let claims = BearerClaims::new(user.id, issued_at, config.token_expiry_seconds);

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret().as_bytes()),
    )?;

    Ok(Jwt { token, user })
}

/// Verifies signature and expiry of `token` and returns the user id it was
/// issued to.
pub fn authenticate_token(config: &Config, token: &str) -> Result<Id, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<BearerClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret().as_bytes()),
        &validation,
    )
    .map_err(|err| {
        debug!("Rejected bearer token: {err}");
        Error {
            source: Some(Box::new(err)),
            ..Error::unauthenticated()
        }
    })?;

    token_data.claims.user_id().ok_or_else(|| {
        warn!("Bearer token carries a non-numeric subject");
        Error::unauthenticated()
    })
}
