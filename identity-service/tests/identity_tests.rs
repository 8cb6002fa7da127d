use std::sync::{Arc, Mutex};

use account_service::AccountService;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::decimal::dec;
use common::error::{Error, Result};
use identity_service::{
    IdentityConfig, IdentityService, InMemoryPendingSignupStore, OtpNotifier, PendingSignup, PendingSignupStore,
    MAX_OTP_ATTEMPTS,
};
use uuid::Uuid;

/// Records every OTP instead of delivering it
#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    fn last_otp(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, otp)| otp.clone())
    }
}

#[async_trait]
impl OtpNotifier for CapturingNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()> {
        self.sent.lock().unwrap().push((email.to_string(), otp.to_string()));
        Ok(())
    }
}

struct Fixture {
    identity: IdentityService,
    accounts: Arc<AccountService>,
    pending: Arc<InMemoryPendingSignupStore>,
    notifier: Arc<CapturingNotifier>,
}

fn fixture() -> Fixture {
    let accounts = Arc::new(AccountService::new());
    let pending = Arc::new(InMemoryPendingSignupStore::new());
    let notifier = Arc::new(CapturingNotifier::default());
    let identity = IdentityService::new(
        accounts.clone(),
        pending.clone(),
        notifier.clone(),
        IdentityConfig::new("test-secret", 3600, 600),
    );
    Fixture {
        identity,
        accounts,
        pending,
        notifier,
    }
}

async fn registered(f: &Fixture, email: &str) -> Uuid {
    f.identity.signup(email, "password123", "1234").await.unwrap();
    let otp = f.notifier.last_otp(&email.trim().to_lowercase()).unwrap();
    f.identity.verify_otp(email, &otp).await.unwrap().id
}

#[tokio::test]
async fn test_signup_and_verify_creates_account() {
    let f = fixture();
    f.identity.signup(" Jane@Example.com", "password123", "1234").await.unwrap();

    let otp = f.notifier.last_otp("jane@example.com").unwrap();
    assert_eq!(otp.len(), 6);
    assert_eq!(f.pending.len(), 1);

    let account = f.identity.verify_otp("jane@example.com", &otp).await.unwrap();
    assert_eq!(account.balance, dec!(10000));
    assert!(f.pending.is_empty());

    let portfolio = f.accounts.get_portfolio(account.id).await.unwrap();
    assert!(portfolio.holdings.is_empty());

    // Hashes are stored, never the plain secrets
    let creds = f.accounts.find_credentials_by_email("jane@example.com").await.unwrap().unwrap();
    assert_ne!(creds.password_hash, "password123");
    assert_ne!(creds.pin_hash, "1234");
}

#[tokio::test]
async fn test_signup_validation() {
    let f = fixture();
    for (email, password, pin) in [
        ("not-an-email", "password123", "1234"),
        ("a@example.com", "short", "1234"),
        ("a@example.com", "password123", "12"),
        ("a@example.com", "password123", "12ab"),
    ] {
        let result = f.identity.signup(email, password, pin).await;
        assert!(matches!(result, Err(Error::ValidationError(_))), "{email} {password} {pin}");
    }
    assert!(f.pending.is_empty());
}

#[tokio::test]
async fn test_signup_for_existing_account() {
    let f = fixture();
    registered(&f, "taken@example.com").await;
    let result = f.identity.signup("TAKEN@example.com", "password123", "1234").await;
    assert!(matches!(result, Err(Error::AlreadyExists(_))));
}

#[tokio::test]
async fn test_repeated_signup_replaces_otp() {
    let f = fixture();
    f.identity.signup("a@example.com", "password123", "1234").await.unwrap();
    let first = f.pending.get("a@example.com").await.unwrap().unwrap();
    f.identity.signup("a@example.com", "password456", "5678").await.unwrap();
    let second = f.pending.get("a@example.com").await.unwrap().unwrap();

    assert_eq!(f.pending.len(), 1);
    assert_ne!(first.password_hash, second.password_hash);
    assert_eq!(f.notifier.last_otp("a@example.com").unwrap(), second.otp);
}

#[tokio::test]
async fn test_verify_otp_failures() {
    let f = fixture();

    match f.identity.verify_otp("nobody@example.com", "123456").await {
        Err(Error::ValidationError(msg)) => assert_eq!(msg, "no signup request"),
        other => panic!("unexpected: {other:?}"),
    }

    f.identity.signup("a@example.com", "password123", "1234").await.unwrap();
    let otp = f.notifier.last_otp("a@example.com").unwrap();
    let wrong = if otp == "000000" { "111111" } else { "000000" };
    match f.identity.verify_otp("a@example.com", wrong).await {
        Err(Error::ValidationError(msg)) => assert_eq!(msg, "invalid OTP"),
        other => panic!("unexpected: {other:?}"),
    }

    // A wrong guess keeps the request alive
    assert!(f.identity.verify_otp("a@example.com", &otp).await.is_ok());
}

#[tokio::test]
async fn test_repeated_wrong_otps_discard_signup() {
    let f = fixture();
    f.identity.signup("a@example.com", "password123", "1234").await.unwrap();
    let otp = f.notifier.last_otp("a@example.com").unwrap();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    for attempt in 1..MAX_OTP_ATTEMPTS {
        assert!(f.identity.verify_otp("a@example.com", wrong).await.is_err());
        let pending = f.pending.get("a@example.com").await.unwrap().unwrap();
        assert_eq!(pending.failed_attempts, attempt);
    }

    match f.identity.verify_otp("a@example.com", wrong).await {
        Err(Error::ValidationError(msg)) => assert!(msg.contains("too many OTP attempts")),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(f.pending.is_empty());

    // The right code no longer helps once the signup is gone
    match f.identity.verify_otp("a@example.com", &otp).await {
        Err(Error::ValidationError(msg)) => assert_eq!(msg, "no signup request"),
        other => panic!("unexpected: {other:?}"),
    }

    // A fresh signup starts the count again
    f.identity.signup("a@example.com", "password123", "1234").await.unwrap();
    assert_eq!(f.pending.get("a@example.com").await.unwrap().unwrap().failed_attempts, 0);
}

#[tokio::test]
async fn test_expired_otp_is_purged() {
    let f = fixture();
    let now = Utc::now();
    f.pending
        .put(PendingSignup {
            email: "late@example.com".to_string(),
            password_hash: "hash".to_string(),
            pin_hash: "hash".to_string(),
            otp: "123456".to_string(),
            failed_attempts: 0,
            created_at: now - Duration::seconds(700),
            expires_at: now - Duration::seconds(100),
        })
        .await
        .unwrap();

    match f.identity.verify_otp("late@example.com", "123456").await {
        Err(Error::ValidationError(msg)) => assert_eq!(msg, "OTP expired"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(f.pending.is_empty());
    assert!(f.accounts.find_credentials_by_email("late@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_expired_signups() {
    let f = fixture();
    let now = Utc::now();
    for (email, offset) in [("old@example.com", -5), ("fresh@example.com", 600)] {
        f.pending
            .put(PendingSignup {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                pin_hash: "hash".to_string(),
                otp: "123456".to_string(),
                failed_attempts: 0,
                created_at: now,
                expires_at: now + Duration::seconds(offset),
            })
            .await
            .unwrap();
    }

    assert_eq!(f.identity.purge_expired_signups().await.unwrap(), 1);
    assert!(f.pending.get("fresh@example.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_issues_verifiable_session() {
    let f = fixture();
    let id = registered(&f, "trader@example.com").await;

    let session = f.identity.login("Trader@Example.com", "password123").await.unwrap();
    assert_eq!(session.account_id, id);
    assert!(session.expires_at > Utc::now());
    assert_eq!(f.identity.verify_token(&session.token).unwrap(), id);
}

#[tokio::test]
async fn test_login_failures() {
    let f = fixture();
    registered(&f, "trader@example.com").await;

    for (email, password) in [("trader@example.com", "wrongpass1"), ("ghost@example.com", "password123")] {
        let result = f.identity.login(email, password).await;
        assert!(matches!(result, Err(Error::AuthenticationError(_))));
    }
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let f = fixture();
    let other = IdentityService::new(
        f.accounts.clone(),
        f.pending.clone(),
        f.notifier.clone(),
        IdentityConfig::new("other-secret", 3600, 600),
    );
    let session = other.issue_session(Uuid::new_v4(), Utc::now()).unwrap();
    assert!(matches!(
        f.identity.verify_token(&session.token),
        Err(Error::AuthenticationError(_))
    ));

    let stale = f.identity.issue_session(Uuid::new_v4(), Utc::now() - Duration::hours(2)).unwrap();
    assert!(f.identity.verify_token(&stale.token).is_err());
}

#[tokio::test]
async fn test_verify_pin() {
    let f = fixture();
    let id = registered(&f, "pin@example.com").await;

    assert!(f.identity.verify_pin(id, "1234").await.is_ok());
    assert!(matches!(
        f.identity.verify_pin(id, "4321").await,
        Err(Error::AuthenticationError(_))
    ));
    assert!(matches!(
        f.identity.verify_pin(Uuid::new_v4(), "1234").await,
        Err(Error::AccountNotFound(_))
    ));
}
