//! Identity: OTP-gated signup, login, trading PIN checks and session tokens

pub mod config;
pub mod notifier;
pub mod password;
pub mod pending;
pub mod service;
pub mod session;

pub use config::IdentityConfig;
pub use notifier::{LogNotifier, OtpNotifier};
pub use pending::{InMemoryPendingSignupStore, PendingSignup, PendingSignupStore, PostgresPendingSignupStore};
pub use service::{normalize_email, IdentityService, MAX_OTP_ATTEMPTS};
pub use session::{Claims, Session};
