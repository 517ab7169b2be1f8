use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The password hash never leaves the crate;
/// API responses go through `dto::PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
    pub verified_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Single-use activation record tied to a user. The token string itself is
/// the lookup key; consuming it deletes the row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    pub token: String,
    pub user_id: Uuid,
    pub purpose: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// What a verification token was issued for. Only account activation exists
/// today; password reset would add a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    AccountActivation,
}

impl TokenPurpose {
    /// Canonical string stored in `verification_tokens.purpose`.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::AccountActivation => "Register New Account",
        }
    }
}
