use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;

use crate::bridge::SubscriptionBridge;
use crate::domain::SubscriptionRequest;
use crate::email_client::EmailClient;
use crate::notifier::SiteContext;
use crate::response::to_user_response;
use crate::response::ResponsePolicy;

/// Attribution sent to Kit with every lead captured here
pub const LEAD_SOURCE: &str = "KitLeads";

/// Both fields are optional on the wire; a missing email is handled by the
/// bridge like any other invalid one.
#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    email: String,
    #[serde(default)]
    form_id: String,
}

impl FormData {
    fn into_request(
        self,
        site_url: &str,
    ) -> SubscriptionRequest {
        let mut request = SubscriptionRequest::new(self.email.trim())
            .with_field("site_url", site_url)
            .with_field("source", LEAD_SOURCE);
        if !self.form_id.trim().is_empty() {
            request = request.with_list_id(self.form_id.trim());
        }
        request
    }
}

/// `POST /subscriptions`
///
/// ```sh
///     curl --data 'email=john@foo.com&form_id=123456' http://127.0.0.1:8000/subscriptions
/// ```
///
/// Always 200. What the visitor is told depends on `ResponsePolicy`; the real
/// outcome only goes to the log (and, on failure, the fallback email).
#[tracing::instrument(
    name = "Capturing new lead",
    skip(form, bridge, site, policy),
    fields(
        lead_email = %form.email,
        form_id = %form.form_id,
    )
)]
pub async fn subscribe(
    form: web::Form<FormData>,
    bridge: web::Data<SubscriptionBridge<EmailClient>>,
    site: web::Data<SiteContext>,
    policy: web::Data<ResponsePolicy>,
) -> HttpResponse {
    let request = form.into_inner().into_request(&site.site_url);
    let outcome = bridge.subscribe(request).await;
    if let Err(e) = &outcome {
        tracing::info!(failure = ?e.kind(), "lead was not subscribed");
    }
    HttpResponse::Ok().json(to_user_response(&outcome, **policy))
}
