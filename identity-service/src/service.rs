//! Identity service

use std::sync::Arc;

use account_service::AccountService;
use chrono::{DateTime, Duration, Utc};
use common::error::{Error, Result};
use common::model::account::Account;
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::notifier::OtpNotifier;
use crate::password::{hash_secret, validate_password, validate_pin, verify_secret};
use crate::pending::{PendingSignup, PendingSignupStore};
use crate::session::{decode_token, encode_token, Claims, Session};

/// Trim and lower-case an e-mail address, rejecting obviously malformed ones
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace),
        None => false,
    };
    if !valid {
        return Err(Error::ValidationError(format!("invalid e-mail address '{}'", raw.trim())));
    }
    Ok(email)
}

/// Wrong OTPs accepted before a pending signup is discarded
pub const MAX_OTP_ATTEMPTS: u32 = 5;

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Signup, login and PIN checks on top of the account service
pub struct IdentityService {
    accounts: Arc<AccountService>,
    pending: Arc<dyn PendingSignupStore>,
    notifier: Arc<dyn OtpNotifier>,
    config: IdentityConfig,
}

impl IdentityService {
    pub fn new(
        accounts: Arc<AccountService>,
        pending: Arc<dyn PendingSignupStore>,
        notifier: Arc<dyn OtpNotifier>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            accounts,
            pending,
            notifier,
            config,
        }
    }

    /// Start a signup: validate and hash the credentials, then send an OTP.
    /// A repeated signup for the same e-mail replaces the earlier one.
    pub async fn signup(&self, email: &str, password: &str, pin: &str) -> Result<()> {
        let email = normalize_email(email)?;
        if self.accounts.find_credentials_by_email(&email).await?.is_some() {
            return Err(Error::AlreadyExists(format!("account for {} already exists", email)));
        }
        validate_password(password)?;
        validate_pin(pin)?;

        let now = Utc::now();
        let otp = generate_otp();
        self.pending
            .put(PendingSignup {
                email: email.clone(),
                password_hash: hash_secret(password)?,
                pin_hash: hash_secret(pin)?,
                otp: otp.clone(),
                failed_attempts: 0,
                created_at: now,
                expires_at: now + Duration::seconds(self.config.otp_ttl_secs),
            })
            .await?;

        self.notifier.send_otp(&email, &otp).await?;
        info!("Signup started for {}", email);
        Ok(())
    }

    /// Confirm a signup with its OTP and open the account
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Account> {
        let email = normalize_email(email)?;
        let pending = self
            .pending
            .get(&email)
            .await?
            .ok_or_else(|| Error::ValidationError("no signup request".to_string()))?;

        if pending.is_expired(Utc::now()) {
            self.pending.remove(&email).await?;
            return Err(Error::ValidationError("OTP expired".to_string()));
        }
        if pending.otp != otp.trim() {
            let attempts = self.pending.record_failed_attempt(&email).await?.unwrap_or(MAX_OTP_ATTEMPTS);
            debug!("OTP mismatch for {} ({} of {})", email, attempts, MAX_OTP_ATTEMPTS);
            if attempts >= MAX_OTP_ATTEMPTS {
                self.pending.remove(&email).await?;
                warn!("Too many wrong OTPs for {}, signup discarded", email);
                return Err(Error::ValidationError("too many OTP attempts, sign up again".to_string()));
            }
            return Err(Error::ValidationError("invalid OTP".to_string()));
        }

        let account = self
            .accounts
            .open_account(email.clone(), pending.password_hash, pending.pin_hash)
            .await?;
        self.pending.remove(&email).await?;
        Ok(account)
    }

    /// Check e-mail and password and issue a session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let rejected = || Error::AuthenticationError("invalid e-mail or password".to_string());

        let email = normalize_email(email).map_err(|_| rejected())?;
        let credentials = self
            .accounts
            .find_credentials_by_email(&email)
            .await?
            .ok_or_else(rejected)?;

        if !verify_secret(&credentials.password_hash, password) {
            warn!("Failed login for {}", email);
            return Err(rejected());
        }

        let session = self.issue_session(credentials.account_id, Utc::now())?;
        info!("Account {} logged in", credentials.account_id);
        Ok(session)
    }

    /// Check the trading PIN of an account
    pub async fn verify_pin(&self, account_id: Uuid, pin: &str) -> Result<()> {
        let credentials = self
            .accounts
            .get_credentials(account_id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        if verify_secret(&credentials.pin_hash, pin) {
            Ok(())
        } else {
            Err(Error::AuthenticationError("invalid PIN".to_string()))
        }
    }

    pub fn issue_session(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<Session> {
        let expires_at = now + Duration::seconds(self.config.session_ttl_secs);
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(Session {
            token: encode_token(&self.config.jwt_secret, &claims)?,
            account_id,
            expires_at,
        })
    }

    /// Resolve a bearer token to its account ID
    pub fn verify_token(&self, token: &str) -> Result<Uuid> {
        decode_token(&self.config.jwt_secret, token, Utc::now()).map(|claims| claims.sub)
    }

    /// Drop expired pending signups
    pub async fn purge_expired_signups(&self) -> Result<u64> {
        let purged = self.pending.purge_expired(Utc::now()).await?;
        if purged > 0 {
            debug!("Purged {} expired signups", purged);
        }
        Ok(purged)
    }
}
