//! Kit.com subscription bridge: validate, resolve config, one POST, classify,
//! and hand infrastructure failures to the fallback notifier.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Metadata;
use crate::domain::SubscriberEmail;
use crate::domain::SubscriptionRequest;
use crate::email_client::MailSender;
use crate::notifier::FallbackNotifier;
use crate::utils::error_chain_fmt;
use crate::utils::error_chain_message;

/// Used when the provider rejects a request without saying why
pub const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Read-only view of the integration settings, owned by the host. Each value
/// is read at most once per `subscribe` call and never cached; `None` means
/// unset (empty strings included).
pub trait ConfigStore: Send + Sync {
    fn api_secret(&self) -> Option<Secret<String>>;
    fn default_list_id(&self) -> Option<String>;
    fn fallback_address(&self) -> Option<String>;
}

/// Provider accepted the lead
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribed {
    /// Parsed response body, as returned by Kit
    pub provider_response: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// User input; not reported to ops
    InvalidEmail,
    /// Deployment misconfiguration; logged, but no fallback email
    ConfigMissing,
    /// Provider unreachable; fallback email sent
    TransportError,
    /// Provider reachable but didn't subscribe the lead; fallback email sent
    ProviderError,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Invalid email address")]
    InvalidEmail(#[source] crate::domain::ValidationError),
    #[error("Kit.com API secret or form id is missing from settings")]
    ConfigMissing,
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    #[error("{0}")]
    Provider(String),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl SubscribeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidEmail(_) => FailureKind::InvalidEmail,
            Self::ConfigMissing => FailureKind::ConfigMissing,
            Self::Transport(_) => FailureKind::TransportError,
            Self::Provider(_) => FailureKind::ProviderError,
        }
    }

    /// Human readable detail; for provider errors this is Kit's own message,
    /// for transport errors the whole cause chain (timeout, refused, DNS...)
    pub fn detail(&self) -> String {
        match self {
            Self::Transport(e) => error_chain_message(e),
            _ => self.to_string(),
        }
    }
}

pub type SubscriptionResult = Result<Subscribed, SubscribeError>;

#[derive(Serialize)]
struct SubscribeBody<'a> {
    api_secret: &'a str,
    email: &'a str,
    fields: &'a Metadata,
}

/// Constructed once at startup and shared (`web::Data`) by every request.
/// Holds no mutable state.
pub struct SubscriptionBridge<M> {
    http_client: Client,
    base_url: String,
    timeout: Duration,
    config: Arc<dyn ConfigStore>,
    notifier: FallbackNotifier<M>,
}

impl<M: MailSender> SubscriptionBridge<M> {
    pub fn new(
        base_url: String,
        timeout: Duration,
        config: Arc<dyn ConfigStore>,
        notifier: FallbackNotifier<M>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            timeout,
            config,
            notifier,
        }
    }

    /// Subscribe a lead to a Kit form. One attempt, no retries; every outcome
    /// is final. Transport and provider failures trigger exactly one fallback
    /// notification before returning.
    #[tracing::instrument(
        name = "Subscribing lead to Kit",
        skip_all,
        fields(
            lead_email = %request.email,
            list_id = tracing::field::Empty,
        )
    )]
    pub async fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> SubscriptionResult {
        let list_id_override = request.list_id_override().map(str::to_string);
        let email = match SubscriberEmail::parse(request.email) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error.message = %e, "rejecting invalid lead email");
                return Err(SubscribeError::InvalidEmail(e));
            }
        };

        // the default form id is only looked up when the caller didn't name one
        let api_secret = self.config.api_secret();
        let list_id = list_id_override.or_else(|| self.config.default_list_id());
        let (Some(api_secret), Some(list_id)) = (api_secret, list_id) else {
            // no fallback email here: the fallback address is part of the same
            // (broken) settings, so this only goes to the operational log
            tracing::error!(
                alert = "config_missing",
                "Kit.com API secret or form id is missing; lead was not forwarded"
            );
            return Err(SubscribeError::ConfigMissing);
        };
        tracing::Span::current().record("list_id", tracing::field::display(&list_id));

        match self
            .call_provider(&api_secret, &list_id, &email, &request.metadata)
            .await
        {
            Ok(body) if has_subscription(&body) => Ok(Subscribed {
                provider_response: body,
            }),
            Ok(body) => {
                let message = provider_message(&body);
                tracing::error!(error.message = %message, "Kit did not subscribe the lead");
                self.notifier.notify(&email, &message).await;
                Err(SubscribeError::Provider(message))
            }
            Err(e) => {
                let err = SubscribeError::Transport(e);
                let detail = err.detail();
                tracing::error!(
                    error.cause_chain = ?err,
                    error.message = %detail,
                    "could not reach Kit"
                );
                self.notifier.notify(&email, &detail).await;
                Err(err)
            }
        }
    }

    /// POST and read the body. Only transport problems are errors here; an
    /// unparseable body comes back as `Value::Null`.
    async fn call_provider(
        &self,
        api_secret: &Secret<String>,
        list_id: &str,
        email: &SubscriberEmail,
        fields: &Metadata,
    ) -> Result<Value, reqwest::Error> {
        let url = format!(
            "{}/v3/forms/{}/subscribe",
            self.base_url,
            urlencoding::encode(list_id)
        );
        let body = SubscribeBody {
            api_secret: api_secret.expose_secret(),
            email: email.as_ref(),
            fields,
        };
        let bytes = self
            .http_client
            .post(url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn has_subscription(body: &Value) -> bool {
    body.get("subscription").is_some_and(|s| !s.is_null())
}

/// Kit reports errors as `{"error": ..., "message": "..."}`
fn provider_message(body: &Value) -> String {
    match body.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_API_ERROR.to_string(),
        Some(other) => other.to_string(),
    }
}
