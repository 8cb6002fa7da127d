use async_trait::async_trait;
use common::error::Result;
use tracing::info;

/// Delivers signup OTPs to their owners
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()>;
}

/// Writes the OTP to the log instead of sending it anywhere
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()> {
        info!("Signup OTP for {}: {}", email, otp);
        Ok(())
    }
}
