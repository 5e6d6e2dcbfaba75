//! Account identity as seen by the domain services.
//!
//! Session handling lives in the gateway in front of this service; requests arrive with the
//! authenticated account in the `x-account-id` and `x-account-role` headers.

use std::fmt;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const ACCOUNT_ROLE_HEADER: &str = "x-account-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Student,
    Company,
    Admin,
}

impl AccountRole {
    pub const fn label(self) -> &'static str {
        match self {
            AccountRole::Student => "student",
            AccountRole::Company => "company",
            AccountRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "company" => Some(Self::Company),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller of a domain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub account_id: AccountId,
    pub role: AccountRole,
}

impl Actor {
    pub const fn new(account_id: AccountId, role: AccountRole) -> Self {
        Self { account_id, role }
    }

    pub const fn student(id: u64) -> Self {
        Self::new(AccountId(id), AccountRole::Student)
    }

    pub const fn company(id: u64) -> Self {
        Self::new(AccountId(id), AccountRole::Company)
    }

    pub const fn admin(id: u64) -> Self {
        Self::new(AccountId(id), AccountRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    /// Owners and admins may manage a resource owned by `owner`.
    pub fn can_manage(&self, owner: AccountId) -> bool {
        self.is_admin() || self.account_id == owner
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let account_id = header(ACCOUNT_ID_HEADER)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(AccountId);
        let role = header(ACCOUNT_ROLE_HEADER).and_then(|raw| AccountRole::parse(&raw));

        match (account_id, role) {
            (Some(account_id), Some(role)) => Ok(Actor { account_id, role }),
            _ => {
                let payload = json!({ "error": "missing or invalid account headers" });
                Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
            }
        }
    }
}
