use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;

use crate::{
    domain::{
        new_subscriber::{NewSubscriber, NewSubscriberBody},
        subscriber::Subscriber,
        subscriber_email::SubscriberEmail,
    },
    email_client::{EmailClient, OutgoingEmail},
    routes::{error_chain_fmt, json_error},
    startup::{AdminNotificationAddress, ApplicationBaseUrl},
    store::{InsertOutcome, StoreError, SubscriberStore},
};

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Invalid email address")]
    ValidationError(String),
    #[error("Failed to process subscription. Please try again.")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(body, store, email_client, base_url, admin_address),
    fields(
        subscriber_email = ?body.email,
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<NewSubscriberBody>,
    store: web::Data<SubscriberStore>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    admin_address: web::Data<AdminNotificationAddress>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = body.try_into().map_err(|err: String| {
        tracing::warn!("Validation error: {:?}", err);
        SubscribeError::ValidationError(err)
    })?;

    let subscriber = match store
        .insert_if_absent(Subscriber::new(new_subscriber.email))
        .await?
    {
        InsertOutcome::Created(subscriber) => subscriber,
        InsertOutcome::AlreadySubscribed(_) => {
            return Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "You're already subscribed! Thank you for your interest."
            })));
        }
    };

    // Emails are best-effort: the stored record is the source of truth
    if let Some(admin_email) = &admin_address.0 {
        send_admin_notification(&email_client, admin_email, &subscriber).await;
    }
    send_welcome_email(&email_client, &subscriber, base_url.0.as_str()).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Successfully subscribed! Check your email for a welcome message.",
        "id": subscriber.id,
    })))
}

#[tracing::instrument(
    name = "Send a welcome email to a new subscriber",
    fields(base_url = %base_url),
    skip(email_client, subscriber)
)]
async fn send_welcome_email(email_client: &EmailClient, subscriber: &Subscriber, base_url: &str) {
    let confirmation_link = format!(
        "{}/subscribe?token={}",
        base_url,
        subscriber.token.as_ref()
    );
    let html = format!(
        r#"
            <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
                <h1 style="color: #333;">Welcome to What the Ellie!</h1>
                <p>Thank you for subscribing to our travel blog newsletter!</p>
                <p>Click <a href="{confirmation_link}">here</a> to confirm your email address.</p>
                <p>You'll be the first to know when new travel stories and guides are published.</p>
                <ul>
                    <li><a href="{base_url}/map">Interactive Travel Map</a></li>
                    <li><a href="{base_url}/spain">Spain Travel Guide</a></li>
                    <li><a href="{base_url}">Latest Blog Posts</a></li>
                </ul>
                <p style="color: #666; font-size: 12px;">If you didn't subscribe to this newsletter, you can safely ignore this email.</p>
            </div>
        "#
    );
    let text = format!(
        "Welcome to What the Ellie!\n\nConfirm your email address: {}\n\nIf you didn't subscribe to this newsletter, you can safely ignore this email.\n",
        confirmation_link
    );

    let email = OutgoingEmail {
        to: subscriber.email.clone(),
        subject: String::from("Welcome to What the Ellie!"),
        html,
        text: Some(text),
    };

    if !email_client.send_email(&email).await {
        tracing::warn!("Welcome email was not delivered, keeping the subscription");
    }
}

#[tracing::instrument(
    name = "Notify the admin about a new subscriber",
    skip(email_client, admin_email, subscriber)
)]
async fn send_admin_notification(
    email_client: &EmailClient,
    admin_email: &SubscriberEmail,
    subscriber: &Subscriber,
) {
    let html = format!(
        r#"
            <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
                <h2 style="color: #333;">New Newsletter Subscriber!</h2>
                <p>A new subscriber has joined your newsletter:</p>
                <p><strong>Email:</strong> {}</p>
                <p><strong>Date:</strong> {}</p>
                <p style="color: #666; font-size: 12px;">This is an automated notification from your travel blog.</p>
            </div>
        "#,
        subscriber.email,
        Utc::now().to_rfc2822()
    );

    let email = OutgoingEmail {
        to: admin_email.clone(),
        subject: String::from("New Newsletter Subscriber"),
        html,
        text: None,
    };

    if !email_client.send_email(&email).await {
        tracing::warn!("Admin notification was not delivered");
    }
}
