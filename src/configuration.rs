use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::bridge::ConfigStore;
use crate::domain::SubscriberEmail;
use crate::domain::ValidationError;
use crate::email_client::EmailClient;
use crate::notifier::SiteContext;
use crate::response::ResponsePolicy;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub kit: KitSettings,
    pub email_client: EmailClientSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Public URL of the site hosting the form. Sent to Kit as attribution
    /// and quoted in alert emails.
    pub base_url: String,

    /// Last resort recipient for alerts when `kit.fallback_email` is unset
    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub response_policy: ResponsePolicy,
}

impl ApplicationSettings {
    pub fn site_context(&self) -> SiteContext {
        SiteContext {
            site_url: self.base_url.clone(),
            admin_email: self.admin_email.clone(),
        }
    }
}

/// Kit.com (ConvertKit) settings. Empty strings are treated as unset, which
/// is what an un-configured deployment looks like.
#[derive(Deserialize, Clone)]
pub struct KitSettings {
    pub base_url: String,
    pub api_secret: Secret<String>,
    /// Default form id, used when a submission doesn't name one
    pub form_id: String,
    #[serde(default)]
    pub fallback_email: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl KitSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ConfigStore for KitSettings {
    fn api_secret(&self) -> Option<Secret<String>> {
        non_empty(self.api_secret.expose_secret()).map(Secret::new)
    }

    fn default_list_id(&self) -> Option<String> { non_empty(&self.form_id) }

    fn fallback_address(&self) -> Option<String> {
        self.fallback_email.as_deref().and_then(non_empty)
    }
}

/// Outgoing mail (alerts only)
#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, ValidationError> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(self) -> Result<EmailClient, ValidationError> {
        let sender = self.sender()?;
        let timeout = self.timeout();
        Ok(EmailClient::new(
            self.base_url,
            sender,
            self.authorization_token,
            timeout,
        ))
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!(
                "{e} is not a supported environment, use either `local` or `production`"
            )),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// apply `APP_*` env var overrides.
///
/// `APP_KIT__API_SECRET=...` -> `Settings.kit.api_secret`
///
/// Env vars are always strings; `serde-aux` takes care of the numeric fields.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
