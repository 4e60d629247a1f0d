use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::bridge::SubscriptionBridge;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::notifier::FallbackNotifier;
use crate::notifier::SiteContext;
use crate::response::ResponsePolicy;
use crate::routes::health_check;
use crate::routes::subscribe;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and build the one `SubscriptionBridge` that every
    /// request shares.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // with port 0 the OS picks one; keep it around for tests
        let port = listener.local_addr()?.port();

        let site = cfg.application.site_context();
        let policy = cfg.application.response_policy;
        let bridge = build_bridge(&cfg, cfg.email_client.clone().client()?, site.clone());

        let server = run(listener, bridge, site, policy)?;
        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Kit settings double as the `ConfigStore`; the notifier reads the same
/// instance. `site` is the same context the routes get.
pub fn build_bridge(
    cfg: &Settings,
    email_client: EmailClient,
    site: SiteContext,
) -> SubscriptionBridge<EmailClient> {
    let store = Arc::new(cfg.kit.clone());
    let notifier = FallbackNotifier::new(email_client, store.clone(), site);
    SubscriptionBridge::new(cfg.kit.base_url.clone(), cfg.kit.timeout(), store, notifier)
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    bridge: SubscriptionBridge<EmailClient>,
    site: SiteContext,
    policy: ResponsePolicy,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`; every worker gets a clone of the same bridge
    let bridge = Data::new(bridge);
    let site = Data::new(site);
    let policy = Data::new(policy);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(subscribe))
            .app_data(bridge.clone())
            .app_data(site.clone())
            .app_data(policy.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
