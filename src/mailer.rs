use axum::async_trait;
use tracing::info;

/// Hands a reset token off for delivery. The core only forwards; whether the
/// mail actually arrives is this collaborator's problem.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, recipient: &str, reset_token: &str) -> anyhow::Result<()>;
}

/// Default sender: renders the reset link and logs it instead of delivering.
pub struct LogMailer {
    base_url: String,
}

impl LogMailer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, recipient: &str, reset_token: &str) -> anyhow::Result<()> {
        let link = format!(
            "{}/auth/reset-password?token={}",
            self.base_url, reset_token
        );
        info!(recipient = %recipient, link = %link, "password reset link (mail delivery not configured)");
        Ok(())
    }
}
