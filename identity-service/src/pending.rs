//! Signups waiting for OTP confirmation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::db::models::DbPendingSignup;
use common::error::Result;
use dashmap::DashMap;
use sqlx::PgPool;
use tracing::debug;

/// Hashed credentials and OTP of a signup that has not been confirmed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignup {
    /// Normalized e-mail, the store key
    pub email: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub otp: String,
    /// Wrong OTPs submitted so far
    pub failed_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingSignup {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<DbPendingSignup> for PendingSignup {
    fn from(row: DbPendingSignup) -> Self {
        Self {
            email: row.email,
            password_hash: row.password_hash,
            pin_hash: row.pin_hash,
            otp: row.otp,
            failed_attempts: u32::try_from(row.failed_attempts).unwrap_or_default(),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

/// Storage for pending signups, one per e-mail
#[async_trait]
pub trait PendingSignupStore: Send + Sync {
    /// Insert or replace the pending signup for its e-mail
    async fn put(&self, signup: PendingSignup) -> Result<()>;

    async fn get(&self, email: &str) -> Result<Option<PendingSignup>>;

    async fn remove(&self, email: &str) -> Result<()>;

    /// Count one wrong OTP for the e-mail. Returns the new count, or `None`
    /// when no signup is pending.
    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>>;

    /// Drop every entry expired at `now`, returning how many were dropped
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// In-memory pending signup store
#[derive(Default)]
pub struct InMemoryPendingSignupStore {
    entries: DashMap<String, PendingSignup>,
}

impl InMemoryPendingSignupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PendingSignupStore for InMemoryPendingSignupStore {
    async fn put(&self, signup: PendingSignup) -> Result<()> {
        self.entries.insert(signup.email.clone(), signup);
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingSignup>> {
        Ok(self.entries.get(email).map(|e| e.clone()))
    }

    async fn remove(&self, email: &str) -> Result<()> {
        self.entries.remove(email);
        Ok(())
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>> {
        Ok(self.entries.get_mut(email).map(|mut signup| {
            signup.failed_attempts = signup.failed_attempts.saturating_add(1);
            signup.failed_attempts
        }))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let before = self.entries.len();
        self.entries.retain(|_, signup| !signup.is_expired(now));
        Ok((before - self.entries.len()) as u64)
    }
}

/// PostgreSQL pending signup store
pub struct PostgresPendingSignupStore {
    pool: PgPool,
}

impl PostgresPendingSignupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingSignupStore for PostgresPendingSignupStore {
    async fn put(&self, signup: PendingSignup) -> Result<()> {
        debug!("Storing pending signup for {}", signup.email);
        sqlx::query(
            r#"
            INSERT INTO pending_signups (email, password_hash, pin_hash, otp, failed_attempts, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                pin_hash = EXCLUDED.pin_hash,
                otp = EXCLUDED.otp,
                failed_attempts = EXCLUDED.failed_attempts,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&signup.email)
        .bind(&signup.password_hash)
        .bind(&signup.pin_hash)
        .bind(&signup.otp)
        .bind(i32::try_from(signup.failed_attempts).unwrap_or(i32::MAX))
        .bind(signup.created_at)
        .bind(signup.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingSignup>> {
        let row = sqlx::query_as::<_, DbPendingSignup>(
            r#"
            SELECT email, password_hash, pin_hash, otp, failed_attempts, created_at, expires_at
            FROM pending_signups
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PendingSignup::from))
    }

    async fn remove(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM pending_signups WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>> {
        let attempts: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE pending_signups
            SET failed_attempts = failed_attempts + 1
            WHERE email = $1
            RETURNING failed_attempts
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempts.map(|n| u32::try_from(n).unwrap_or_default()))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pending_signups WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
