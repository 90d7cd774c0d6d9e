use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::{EmailClient, OutgoingEmail};
use crate::routes::{error_chain_fmt, json_error};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailBody {
    pub email: Option<String>,
    pub test_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleKind {
    Welcome,
    NewPost,
}

impl TryFrom<Option<String>> for SampleKind {
    type Error = String;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref() {
            None | Some("welcome") => Ok(SampleKind::Welcome),
            Some("newpost") => Ok(SampleKind::NewPost),
            Some(other) => Err(format!("Unknown test type: {}", other)),
        }
    }
}

#[derive(thiserror::Error)]
pub enum TestEmailError {
    #[error("Valid email required")]
    InvalidEmail,
    #[error("{0}")]
    UnknownKind(String),
    #[error("Failed to send test email. Check your configuration.")]
    NotDelivered,
}

impl std::fmt::Debug for TestEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for TestEmailError {
    fn status_code(&self) -> StatusCode {
        match self {
            TestEmailError::InvalidEmail | TestEmailError::UnknownKind(_) => {
                StatusCode::BAD_REQUEST
            }
            TestEmailError::NotDelivered => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Sends a sample email through the active provider.
#[tracing::instrument(name = "Send a test email", skip(body, email_client))]
pub async fn handle_send_test_email(
    body: web::Json<TestEmailBody>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, TestEmailError> {
    let TestEmailBody { email, test_type } = body.into_inner();
    let to = email
        .and_then(|email| SubscriberEmail::parse(email).ok())
        .ok_or(TestEmailError::InvalidEmail)?;
    let kind = SampleKind::try_from(test_type).map_err(TestEmailError::UnknownKind)?;

    let provider = email_client.provider_info();
    tracing::info!(provider, ?kind, "Using email provider");

    let email = sample_email(kind, to, provider);
    if !email_client.send_email(&email).await {
        return Err(TestEmailError::NotDelivered);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Test email sent successfully!",
        "provider": provider,
        "to": email.to.as_ref(),
    })))
}

/// Reports which provider is active.
#[tracing::instrument(name = "Email configuration status", skip(email_client))]
pub async fn handle_test_email_status(email_client: web::Data<EmailClient>) -> HttpResponse {
    let configured = email_client.is_configured();
    let instructions = if configured {
        "Email is configured! Use POST /test-email with {\"email\": \"test@example.com\"} to send a test."
    } else {
        "No email provider configured. Set an API key or SMTP credentials in the configuration."
    };

    HttpResponse::Ok().json(serde_json::json!({
        "configured": configured,
        "provider": email_client.provider_info(),
        "instructions": instructions,
    }))
}

fn sample_email(kind: SampleKind, to: SubscriberEmail, provider: &str) -> OutgoingEmail {
    let (subject, html) = match kind {
        SampleKind::Welcome => (
            "Welcome to What the Ellie!",
            format!(
                r#"
                    <div style="font-family: Georgia, serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto;">
                        <h1>what the ellie</h1>
                        <p>Welcome aboard!</p>
                        <p>This is a test email to confirm your subscription is working.</p>
                        <p>Email provider: <strong>{provider}</strong></p>
                        <p style="font-size: 12px; color: #666;">If you received this, your email configuration is working correctly!</p>
                    </div>
                "#
            ),
        ),
        SampleKind::NewPost => (
            "New Adventure: Testing the Mountains",
            format!(
                r#"
                    <div style="font-family: Georgia, serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto;">
                        <h1>what the ellie</h1>
                        <h2>Testing the Mountains</h2>
                        <p>This is what a new post notification would look like.</p>
                        <p style="margin-top: 40px; font-size: 12px; color: #999;">Email sent via: {provider}</p>
                    </div>
                "#
            ),
        ),
    };

    OutgoingEmail {
        to,
        subject: subject.to_string(),
        html,
        text: None,
    }
}
