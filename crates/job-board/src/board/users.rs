use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{NewUser, User, UserId};
use super::error::BoardError;
use super::jobs::limit_text;
use super::repository::{BoardStore, RepositoryError};
use super::views::UserView;
use crate::identity::{AccountLookup, Caller, IdentityError, Role, TokenKeys};

const EMAIL_MAX: usize = 100;
const NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Bearer token issued at sign-up, alongside the account it identifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(flatten)]
    pub user: UserView,
}

pub struct UserDirectory<S> {
    store: Arc<S>,
    keys: Arc<TokenKeys>,
}

impl<S> UserDirectory<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>, keys: Arc<TokenKeys>) -> Self {
        Self { store, keys }
    }

    pub fn register(&self, request: SignupRequest) -> Result<AuthResponse, BoardError> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(BoardError::invalid("Email must be a valid address"));
        }
        limit_text("Email", Some(&email), EMAIL_MAX)?;
        let first_name = required_name("First name", &request.first_name)?;
        let last_name = required_name("Last name", &request.last_name)?;

        if self.store.find_user_by_email(&email)?.is_some() {
            return Err(BoardError::EmailTaken);
        }

        let now = Utc::now();
        let user = self
            .store
            .insert_user(NewUser {
                email,
                first_name,
                last_name,
                role: request.role,
                created_at: now,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => BoardError::EmailTaken,
                other => BoardError::from(other),
            })?;

        let token = self
            .keys
            .issue(user.id, user.role, now)
            .map_err(|err| BoardError::TokenIssue(err.to_string()))?;
        info!(user_id = %user.id, role = %user.role, "account registered");

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            user: UserView::from(user),
        })
    }

    /// The account behind the caller's token.
    pub fn me(&self, caller: Caller) -> Result<UserView, BoardError> {
        self.store
            .fetch_user(caller.id())?
            .map(UserView::from)
            .ok_or(BoardError::UserNotFound)
    }
}

impl<S> AccountLookup for UserDirectory<S>
where
    S: BoardStore + 'static,
{
    fn account(&self, id: UserId) -> Result<Option<User>, IdentityError> {
        self.store
            .fetch_user(id)
            .map_err(|err| IdentityError::Lookup(err.to_string()))
    }
}

fn required_name(field: &str, value: &str) -> Result<String, BoardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::invalid(format!("{field} is required")));
    }
    limit_text(field, Some(trimmed), NAME_MAX)?;
    Ok(trimmed.to_string())
}
