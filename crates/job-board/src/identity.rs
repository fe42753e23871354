//! Bearer-token identity.
//!
//! Handlers never look up a "current user" from ambient state: the [`Caller`] extractor
//! verifies the token, resolves its subject against the account store and passes the
//! resulting value explicitly into every service call. The role always comes from the
//! stored account, never from the token.

use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::board::domain::{User, UserId};

/// Account role, fixed when the account is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    JobSeeker,
    JobProvider,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::JobSeeker => "JOB_SEEKER",
            Role::JobProvider => "JOB_PROVIDER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capability held by an authenticated job seeker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seeker {
    pub id: UserId,
}

/// Capability held by an authenticated job provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Provider {
    pub id: UserId,
}

/// Authenticated identity of the party issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    Seeker(Seeker),
    Provider(Provider),
}

impl Caller {
    pub fn new(id: UserId, role: Role) -> Self {
        match role {
            Role::JobSeeker => Caller::Seeker(Seeker { id }),
            Role::JobProvider => Caller::Provider(Provider { id }),
        }
    }

    pub fn id(&self) -> UserId {
        match self {
            Caller::Seeker(seeker) => seeker.id,
            Caller::Provider(provider) => provider.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Caller::Seeker(_) => Role::JobSeeker,
            Caller::Provider(_) => Role::JobProvider,
        }
    }

    pub fn seeker(&self) -> Result<Seeker, RoleMismatch> {
        match self {
            Caller::Seeker(seeker) => Ok(*seeker),
            Caller::Provider(_) => Err(RoleMismatch {
                required: Role::JobSeeker,
            }),
        }
    }

    pub fn provider(&self) -> Result<Provider, RoleMismatch> {
        match self {
            Caller::Provider(provider) => Ok(*provider),
            Caller::Seeker(_) => Err(RoleMismatch {
                required: Role::JobProvider,
            }),
        }
    }
}

impl From<Seeker> for Caller {
    fn from(value: Seeker) -> Self {
        Caller::Seeker(value)
    }
}

impl From<Provider> for Caller {
    fn from(value: Provider) -> Self {
        Caller::Provider(value)
    }
}

/// Raised when a caller holds the other role than the operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation requires the {required} role")]
pub struct RoleMismatch {
    pub required: Role,
}

/// HS256 token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification material for bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user` valid from `now` for the configured lifetime.
    pub fn issue(
        &self,
        user: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, IdentityError> {
        let claims = Claims {
            sub: user.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| IdentityError::Signing(err.to_string()))
    }

    /// Checks signature and expiry. The subject still has to be resolved against the
    /// account store with [`TokenSubject::resolve`].
    pub fn verify(&self, token: &str) -> Result<TokenSubject, IdentityError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::Invalid(err.to_string()),
            }
        })?;

        let id = data
            .claims
            .sub
            .parse::<u64>()
            .map_err(|_| IdentityError::Invalid("subject is not a user id".to_string()))?;

        Ok(TokenSubject {
            id: UserId(id),
            role: data.claims.role,
            issued_at: data.claims.iat,
        })
    }
}

/// Account store consulted for every authenticated request.
pub trait AccountLookup: Send + Sync {
    fn account(&self, id: UserId) -> Result<Option<User>, IdentityError>;
}

/// Claims of a token whose signature and expiry have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: UserId,
    pub role: Role,
    /// Seconds since the epoch.
    pub issued_at: i64,
}

impl TokenSubject {
    /// The identity as the token states it, without consulting any account.
    pub fn claimed(&self) -> Caller {
        Caller::new(self.id, self.role)
    }

    /// The caller this token speaks for. Fails when the account does not exist or was
    /// created after the token was issued (ids are reused once the store is reset).
    pub fn resolve(self, accounts: &dyn AccountLookup) -> Result<Caller, IdentityError> {
        let account = accounts
            .account(self.id)?
            .ok_or(IdentityError::UnknownAccount)?;
        if self.issued_at < account.created_at.timestamp() {
            return Err(IdentityError::UnknownAccount);
        }
        if account.role != self.role {
            warn!(
                user_id = %account.id,
                claimed = %self.role,
                stored = %account.role,
                "token role differs from account role"
            );
        }
        Ok(Caller::new(account.id, account.role))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token does not belong to a registered account")]
    UnknownAccount,
    #[error("unable to sign token: {0}")]
    Signing(String),
    #[error("account lookup failed: {0}")]
    Lookup(String),
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let (status, kind) = match self {
            IdentityError::Signing(_) | IdentityError::Lookup(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unavailable")
            }
            _ => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        };
        let body = Json(json!({ "error": self.to_string(), "kind": kind }));
        (status, body).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(IdentityError::MissingToken)?
        .to_str()
        .map_err(|_| IdentityError::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(IdentityError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(IdentityError::MissingToken);
    }
    Ok(token)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<TokenKeys>: FromRef<S>,
    Arc<dyn AccountLookup>: FromRef<S>,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = <Arc<TokenKeys> as FromRef<S>>::from_ref(state);
        let accounts = <Arc<dyn AccountLookup> as FromRef<S>>::from_ref(state);
        let subject = keys.verify(bearer_token(&parts.headers)?)?;
        subject.resolve(accounts.as_ref())
    }
}
