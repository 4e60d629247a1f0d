use std::sync::Arc;

use crate::bridge::ConfigStore;
use crate::domain::SubscriberEmail;
use crate::email_client::MailSender;

/// Facts about the hosting site that the integration settings don't carry
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub site_url: String,
    /// Site-wide admin contact; alerts go here when no fallback address is set
    pub admin_email: Option<String>,
}

/// Best-effort alert to a human when a lead couldn't be forwarded to Kit.
pub struct FallbackNotifier<M> {
    mailer: M,
    config: Arc<dyn ConfigStore>,
    site: SiteContext,
}

impl<M: MailSender> FallbackNotifier<M> {
    pub fn new(
        mailer: M,
        config: Arc<dyn ConfigStore>,
        site: SiteContext,
    ) -> Self {
        Self {
            mailer,
            config,
            site,
        }
    }

    /// Configured fallback address, else the site admin
    fn recipient(&self) -> Option<String> {
        self.config.fallback_address().or_else(|| {
            self.site
                .admin_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        })
    }

    /// Fire-and-forget: failures end up in the log, never with the caller.
    #[tracing::instrument(
        name = "Sending fallback notification",
        skip_all,
        fields(lead_email = %lead)
    )]
    pub async fn notify(
        &self,
        lead: &SubscriberEmail,
        error_detail: &str,
    ) {
        let Some(address) = self.recipient() else {
            tracing::error!("no fallback or admin address configured, lead alert dropped");
            return;
        };
        let recipient = match SubscriberEmail::parse(address) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error.message = %e, "fallback address is invalid, lead alert dropped");
                return;
            }
        };

        let subject = alert_subject(lead);
        let body = alert_body(lead, &self.site.site_url, error_detail);
        if let Err(e) = self.mailer.send_email(&recipient, &subject, &body).await {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "failed to send fallback notification"
            );
        }
    }
}

fn alert_subject(lead: &SubscriberEmail) -> String { format!("KitLeads Alert (API Failed): {lead}") }

fn alert_body(
    lead: &SubscriberEmail,
    site_url: &str,
    error_detail: &str,
) -> String {
    format!(
        "Kit.com API failed to process a new lead.\n\nEmail: {lead}\nSite: {site_url}\nError: {error_detail}"
    )
}
