use actix_web::dev::Server;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use secrecy::Secret;
use std::net::TcpListener;
use std::time;
use tracing_actix_web::TracingLogger;

use crate::cms_client::CmsClient;
use crate::config::Settings;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::{
    handle_confirm_subscription, handle_create_subscription, handle_new_post,
    handle_new_post_dry_run, handle_send_test_email, handle_subscription_stats,
    handle_test_email_status, handle_unsubscribe, health_check,
};
use crate::store::SubscriberStore;

/// Public URL of the site, without trailing slash. Links in emails are built on it.
pub struct ApplicationBaseUrl(pub String);

/// Who gets told about new subscribers, if anybody.
pub struct AdminNotificationAddress(pub Option<SubscriberEmail>);

pub struct AdminStatsToken(pub Option<Secret<String>>);

/// Shared secret the CMS webhook must present. `None` leaves the webhook open.
pub struct WebhookSecret(pub Option<Secret<String>>);

/// Upper bound for a single delivery during a fan-out.
pub struct EmailSendTimeout(pub time::Duration);

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let store = SubscriberStore::json_file(config.get_store_path());
        let email_client = EmailClient::from_settings(&config.email_client)
            .context("Failed to build the email client.")?;
        let cms_client = CmsClient::new(
            config.get_cms_base_url(),
            config.cms.blog_id.clone(),
            Some(config.get_email_client_timeout()),
        )
        .context("Failed to build the CMS client.")?;

        let admin_address = config
            .get_admin_notification_address()
            .and_then(|address| match SubscriberEmail::parse(address) {
                Ok(address) => Some(address),
                Err(err) => {
                    tracing::warn!("Admin notifications disabled: {}", err);
                    None
                }
            });

        let webhook_secret = config.get_webhook_secret();
        if webhook_secret.is_none() {
            tracing::warn!("No webhook secret configured. The new post webhook accepts any caller.");
        }

        let listener = TcpListener::bind(config.get_address())
            .with_context(|| format!("Failed to bind {}.", config.get_address()))?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            provider = email_client.provider_info(),
            store = %config.get_store_path().display(),
            "Starting application"
        );

        let server = run(
            listener,
            AppState {
                store,
                email_client,
                cms_client,
                base_url: ApplicationBaseUrl(config.get_app_base_url()),
                admin_address: AdminNotificationAddress(admin_address),
                stats_token: AdminStatsToken(config.get_admin_stats_token()),
                webhook_secret: WebhookSecret(webhook_secret),
                send_timeout: EmailSendTimeout(config.get_email_client_timeout()),
            },
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Everything the handlers receive through `web::Data`.
pub struct AppState {
    pub store: SubscriberStore,
    pub email_client: EmailClient,
    pub cms_client: CmsClient,
    pub base_url: ApplicationBaseUrl,
    pub admin_address: AdminNotificationAddress,
    pub stats_token: AdminStatsToken,
    pub webhook_secret: WebhookSecret,
    pub send_timeout: EmailSendTimeout,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let store = web::Data::new(state.store);
    let email_client = web::Data::new(state.email_client);
    let cms_client = web::Data::new(state.cms_client);
    let base_url = web::Data::new(state.base_url);
    let admin_address = web::Data::new(state.admin_address);
    let stats_token = web::Data::new(state.stats_token);
    let webhook_secret = web::Data::new(state.webhook_secret);
    let send_timeout = web::Data::new(state.send_timeout);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            // Malformed JSON bodies get the same error shape as every other failure
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                let response = HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": "Invalid JSON body" }));
                InternalError::from_response(err, response).into()
            }))
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::post().to(handle_create_subscription))
            .route("/subscribe", web::get().to(handle_confirm_subscription))
            .route("/subscribe", web::delete().to(handle_unsubscribe))
            .route("/subscribe/stats", web::get().to(handle_subscription_stats))
            .route("/unsubscribe", web::get().to(handle_unsubscribe))
            .route("/webhook/new-post", web::post().to(handle_new_post))
            .route("/webhook/new-post", web::get().to(handle_new_post_dry_run))
            .route("/test-email", web::post().to(handle_send_test_email))
            .route("/test-email", web::get().to(handle_test_email_status))
            .app_data(store.clone())
            .app_data(email_client.clone())
            .app_data(cms_client.clone())
            .app_data(base_url.clone())
            .app_data(admin_address.clone())
            .app_data(stats_token.clone())
            .app_data(webhook_secret.clone())
            .app_data(send_timeout.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
