use std::time::Duration;

use kitleads::response::ResponsePolicy;
use secrecy::Secret;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::any;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::TestApp;
use crate::helpers::DEFAULT_FORM_ID;
use crate::helpers::FALLBACK_EMAIL;
use crate::helpers::LEAD;

fn thank_you() -> Value { json!({"success": true, "data": {"message": "Thank you for subscribing!"}}) }

async fn kit_responds(
    app: &TestApp,
    template: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(any())
        .respond_with(template)
        .expect(expected_calls)
        .mount(&app.kit_server)
        .await;
}

async fn email_api_accepts(
    app: &TestApp,
    expected_calls: u64,
) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_calls)
        .mount(&app.email_server)
        .await;
}

#[tokio::test]
async fn subscribe_forwards_lead_to_default_form() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path(format!("/v3/forms/{DEFAULT_FORM_ID}/subscribe")))
        .and(body_partial_json(json!({
            "api_secret": "valid-api-secret",
            "email": LEAD,
            "fields": {"source": "KitLeads"},
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"subscription": {"id": 789, "email": LEAD}})),
        )
        .expect(1)
        .mount(&app.kit_server)
        .await;
    email_api_accepts(&app, 0).await;

    let resp = app.post_subscriptions("email=john%40foo.com").await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), thank_you());
}

#[tokio::test]
async fn form_id_overrides_default_form() {
    let app = spawn_app().await;

    Mock::given(path("/v3/forms/999999/subscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subscription": {"id": 1}})))
        .expect(1)
        .mount(&app.kit_server)
        .await;

    let resp = app
        .post_subscriptions("email=john%40foo.com&form_id=999999")
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn kit_error_alerts_ops_but_still_thanks_visitor() {
    let app = spawn_app().await;
    kit_responds(
        &app,
        ResponseTemplate::new(401).set_body_json(json!({"error": "Authorization Failed", "message": "Invalid form ID"})),
        1,
    )
    .await;
    email_api_accepts(&app, 1).await;

    let resp = app.post_subscriptions("email=john%40foo.com").await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), thank_you());

    let alerts = app.sent_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["To"], FALLBACK_EMAIL);
    assert_eq!(alerts[0]["Subject"], format!("KitLeads Alert (API Failed): {LEAD}"));
    let text = alerts[0]["TextBody"].as_str().unwrap();
    assert!(text.contains(LEAD));
    assert!(text.contains("Error: Invalid form ID"));
}

#[tokio::test]
async fn unreachable_kit_alerts_ops() {
    let app = spawn_app().await;
    // longer than the 500ms timeout set by `spawn_app`
    kit_responds(
        &app,
        ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
        1,
    )
    .await;
    email_api_accepts(&app, 1).await;

    let resp = app.post_subscriptions("email=john%40foo.com").await;
    assert_eq!(resp.json::<Value>().await.unwrap(), thank_you());

    let alerts = app.sent_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0]["TextBody"].as_str().unwrap().contains(LEAD));
}

#[tokio::test]
async fn alert_goes_to_admin_without_fallback_address() {
    let app = spawn_app_with(|cfg| {
        cfg.kit.fallback_email = None;
        cfg.application.admin_email = Some("admin@example.com".to_string());
    })
    .await;
    kit_responds(&app, ResponseTemplate::new(200).set_body_json(json!({})), 1).await;
    email_api_accepts(&app, 1).await;

    app.post_subscriptions("email=john%40foo.com").await;

    let alerts = app.sent_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["To"], "admin@example.com");
    assert!(alerts[0]["TextBody"]
        .as_str()
        .unwrap()
        .contains("Error: Unknown API error"));
}

#[tokio::test]
async fn kit_and_alert_quote_the_same_site_url() {
    let app = spawn_app_with(|cfg| {
        cfg.application.base_url = "https://shop.example.com".to_string();
    })
    .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "fields": {"site_url": "https://shop.example.com"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&app.kit_server)
        .await;
    email_api_accepts(&app, 1).await;

    app.post_subscriptions("email=john%40foo.com").await;

    let alerts = app.sent_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0]["TextBody"]
        .as_str()
        .unwrap()
        .contains("Site: https://shop.example.com"));
}

#[tokio::test]
async fn invalid_email_is_not_forwarded() {
    let app = spawn_app().await;
    kit_responds(&app, ResponseTemplate::new(200), 0).await;
    email_api_accepts(&app, 0).await;

    for (body, msg) in [
        ("", "no fields"),
        ("email=", "empty email"),
        ("email=not-an-email", "invalid email"),
        ("email=%40foo.com", "no user part"),
    ] {
        let resp = app.post_subscriptions(body).await;
        assert_eq!(resp.status().as_u16(), 200, "{msg}");
        assert_eq!(resp.json::<Value>().await.unwrap(), thank_you(), "{msg}");
    }
}

#[tokio::test]
async fn missing_config_is_not_forwarded_nor_alerted() {
    let app = spawn_app_with(|cfg| {
        cfg.kit.api_secret = Secret::new(String::new());
    })
    .await;
    kit_responds(&app, ResponseTemplate::new(200), 0).await;
    email_api_accepts(&app, 0).await;

    let resp = app.post_subscriptions("email=john%40foo.com").await;
    assert_eq!(resp.json::<Value>().await.unwrap(), thank_you());
}

#[tokio::test]
async fn report_failures_policy_tells_the_visitor() {
    let app = spawn_app_with(|cfg| {
        cfg.application.response_policy = ResponsePolicy::ReportFailures;
    })
    .await;
    kit_responds(
        &app,
        ResponseTemplate::new(404).set_body_json(json!({"message": "Invalid form ID"})),
        1,
    )
    .await;
    email_api_accepts(&app, 1).await;

    let resp = app.post_subscriptions("email=nope").await;
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"success": false, "data": {"message": "Please enter a valid email address."}})
    );

    let resp = app.post_subscriptions("email=john%40foo.com").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    // provider details never reach the visitor
    assert!(!body.to_string().contains("Invalid form ID"));
}
