use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::auth::repo_types::{User, VerificationToken};
use crate::response::FieldError;

/// Request body for user registration. Fields default so absent keys reach
/// `validate` as empty strings and come back as field-level errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for reissuing a verification token.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResendVerificationRequest {
    pub email: String,
}

impl RegisterRequest {
    /// Field-level checks, run on the body as submitted and before any side
    /// effect. Collects every failure rather than stopping at the first.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.full_name.is_empty() {
            errors.push(FieldError {
                field: "fullName",
                message: "Full name is required",
            });
        }
        if self.email.is_empty() {
            errors.push(FieldError {
                field: "email",
                message: "Email is required",
            });
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: "Please enter a valid email",
            });
        }
        if self.password.is_empty() {
            errors.push(FieldError {
                field: "password",
                message: "Password is required",
            });
        }
        errors
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.email.is_empty() {
            errors.push(FieldError {
                field: "email",
                message: "Email is required",
            });
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: "Please enter a valid email",
            });
        }
        if self.password.is_empty() {
            errors.push(FieldError {
                field: "password",
                message: "Password is required",
            });
        }
        errors
    }
}

impl ResendVerificationRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        if self.email.is_empty() {
            vec![FieldError {
                field: "email",
                message: "Email is required",
            }]
        } else {
            Vec::new()
        }
    }
}

/// Lower-case and strip all whitespace. Emails are stored and looked up in
/// this form on every path.
pub fn normalize_email(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub verified_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            verified: user.verified,
            verified_at: user.verified_at,
            created_at: user.created_at,
        }
    }
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
    pub verification: VerificationToken,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
}

/// Response returned when a verification token is reissued.
#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub verification: VerificationToken,
}

/// Caller identity echoed back by `GET /api/auth/user`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            full_name: claims.full_name,
            email: claims.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: AuthenticatedUser,
}
