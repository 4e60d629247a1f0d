use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use crate::domain::SubscriberEmail;

/// Whatever the host uses to send mail. The notifier only builds the message;
/// delivery (and any queuing) is the implementor's business.
pub trait MailSender: Send + Sync {
    fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        text_content: &str,
    ) -> impl Future<Output = Result<(), anyhow::Error>> + Send;
}

/// Client for a Postmark-style HTTP email API (`POST {base_url}/email`).
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    authorization_token: Secret<String>,
    timeout: Duration,
}

// establishing a HTTP connection is expensive, so the `Client` is built once
// and kept for the lifetime of the app (it is an `Arc` internally)

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            sender,
            authorization_token,
            timeout,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

impl MailSender for EmailClient {
    #[tracing::instrument(
        name = "Sending email",
        skip_all,
        fields(recipient = %recipient)
    )]
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        let url = format!("{}/email", self.base_url);
        let body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            text_body: text_content,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .context("could not reach the email API")?
            .error_for_status()
            .context("email API rejected the message")?;
        Ok(())
    }
}
