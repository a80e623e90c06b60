//! Email notifications.
//!
//! Delivery is best-effort: failures are logged and never surface to
//! the caller, so a flaky SMTP relay cannot break commenting.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use memoriaviva_common::config::EmailConfig;

/// SMTP notifier for comment activity.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    /// Build a notifier from configuration.
    ///
    /// When email is disabled the transport is never constructed and
    /// every send becomes a logged no-op.
    pub fn new(config: &EmailConfig) -> Self {
        let from = format!("{} <{}>", config.from_name, config.from_address);

        if !config.enabled {
            tracing::info!("email delivery disabled");
            return Self {
                transport: None,
                from,
            };
        }

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Self {
            transport: Some(builder.build()),
            from,
        }
    }

    /// Notify a post author that someone commented on their post.
    ///
    /// Skipped when delivery is disabled or the recipient has no email
    /// address on file. Never returns an error.
    pub async fn send_comment_notification(
        &self,
        recipient_email: Option<&str>,
        recipient_name: &str,
        commenter_name: &str,
        community_name: &str,
    ) {
        let Some(transport) = &self.transport else {
            tracing::debug!("email disabled, skipping comment notification");
            return;
        };
        let Some(to) = recipient_email else {
            tracing::debug!(recipient = recipient_name, "no email on file, skipping");
            return;
        };

        let subject = format!("New comment on your post in {community_name}");
        let body = format!(
            "Hi {recipient_name},\n\n\
             {commenter_name} commented on your post in the community \"{community_name}\".\n\n\
             Log in to read and reply.\n"
        );

        let message = match self.build_message(to, &subject, &body) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build notification email");
                return;
            }
        };

        if let Err(e) = transport.send(message).await {
            tracing::warn!(error = %e, recipient = to, "failed to send notification email");
        }
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<Message> {
        let from: Mailbox = self.from.parse()?;
        let to: Mailbox = to.parse()?;

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())?)
    }
}
