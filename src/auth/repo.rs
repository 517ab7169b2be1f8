use anyhow::Context;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::auth::repo_types::{TokenPurpose, User, VerificationToken};

/// Length of the activation tokens placed in verification links.
pub(crate) const ACTIVATION_TOKEN_LEN: usize = 200;

/// Outcome of a registration attempt. `EmailTaken` also covers the race
/// where a concurrent registration wins between the handler's pre-check and
/// the insert.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created {
        user: User,
        verification: VerificationToken,
    },
    EmailTaken,
}

impl User {
    /// Find a user by normalized email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, verified, verified_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, email, password_hash, verified, verified_at, created_at
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut **tx)
        .await
    }

    /// Flip the verified flag and stamp `verified_at`. The guard keeps the
    /// timestamp from moving once set.
    async fn mark_verified(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE, verified_at = NOW()
            WHERE id = $1 AND verified = FALSE
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("mark user verified")?;
        Ok(())
    }
}

impl VerificationToken {
    /// Persist a fresh token for `user_id`. Does not supersede existing
    /// tokens; callers that want at most one live token delete first.
    pub async fn issue(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> anyhow::Result<VerificationToken> {
        let record = sqlx::query_as::<_, VerificationToken>(
            r#"
            INSERT INTO verification_tokens (token, user_id, purpose)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, purpose, created_at
            "#,
        )
        .bind(generate_activation_token())
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_one(&mut **tx)
        .await
        .context("insert verification token")?;
        Ok(record)
    }

    /// Delete the matching record and return its user in one statement;
    /// concurrent consumers of the same token succeed at most once.
    pub async fn consume(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
        purpose: TokenPurpose,
    ) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            DELETE FROM verification_tokens
            WHERE token = $1 AND purpose = $2
            RETURNING user_id
            "#,
        )
        .bind(token)
        .bind(purpose.as_str())
        .fetch_optional(&mut **tx)
        .await
        .context("consume verification token")?;
        Ok(row.map(|(user_id,)| user_id))
    }

    /// Remove every live token held by `user_id` for `purpose`.
    pub async fn delete_for_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM verification_tokens
            WHERE user_id = $1 AND purpose = $2
            "#,
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(&mut **tx)
        .await
        .context("delete verification tokens")?;
        Ok(result.rows_affected())
    }
}

/// Create the user and their activation token in one transaction. The unique
/// index on email backstops the handler's duplicate pre-check.
pub async fn register_user(
    db: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> anyhow::Result<RegisterOutcome> {
    let mut tx = db.begin().await.context("begin register transaction")?;

    let user = match User::insert(&mut tx, full_name, email, password_hash).await {
        Ok(user) => user,
        Err(err) if is_unique_violation(&err) => {
            let _ = tx.rollback().await;
            return Ok(RegisterOutcome::EmailTaken);
        }
        Err(err) => return Err(err).context("insert user"),
    };

    let verification =
        VerificationToken::issue(&mut tx, user.id, TokenPurpose::AccountActivation).await?;
    tx.commit().await.context("commit register transaction")?;

    Ok(RegisterOutcome::Created { user, verification })
}

/// Consume `token` and mark the owning account verified, atomically.
/// Returns the user id when the token existed.
pub async fn verify_account(
    db: &PgPool,
    token: &str,
    purpose: TokenPurpose,
) -> anyhow::Result<Option<Uuid>> {
    let mut tx = db.begin().await.context("begin verify transaction")?;

    let Some(user_id) = VerificationToken::consume(&mut tx, token, purpose).await? else {
        let _ = tx.rollback().await;
        return Ok(None);
    };

    User::mark_verified(&mut tx, user_id).await?;
    tx.commit().await.context("commit verify transaction")?;

    Ok(Some(user_id))
}

/// Drop any outstanding tokens for the user and issue a fresh one, leaving
/// exactly one live token for the purpose.
pub async fn reissue_verification(
    db: &PgPool,
    user_id: Uuid,
    purpose: TokenPurpose,
) -> anyhow::Result<VerificationToken> {
    let mut tx = db.begin().await.context("begin resend transaction")?;

    VerificationToken::delete_for_user(&mut tx, user_id, purpose).await?;
    let verification = VerificationToken::issue(&mut tx, user_id, purpose).await?;
    tx.commit().await.context("commit resend transaction")?;

    Ok(verification)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Random 200-character alphanumeric token.
pub(crate) fn generate_activation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ACTIVATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
