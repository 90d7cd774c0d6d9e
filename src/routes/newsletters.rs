use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::authorization::has_bearer_token;
use crate::cms_client::CmsClient;
use crate::domain::new_post::{NewPostBody, NewPostEvent};
use crate::email_client::EmailClient;
use crate::notifications::notify_new_post;
use crate::routes::{error_chain_fmt, json_error};
use crate::startup::{ApplicationBaseUrl, EmailSendTimeout, WebhookSecret};
use crate::store::{StoreError, SubscriberStore};

#[derive(thiserror::Error)]
pub enum NewPostError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid webhook payload")]
    InvalidPayload(String),
    #[error("Failed to process webhook")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for NewPostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        if let NewPostError::InvalidPayload(reason) = self {
            writeln!(f, "Caused by:\n\t{}", reason)?;
        }
        Ok(())
    }
}

impl ResponseError for NewPostError {
    fn status_code(&self) -> StatusCode {
        match self {
            NewPostError::Unauthorized => StatusCode::UNAUTHORIZED,
            NewPostError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            NewPostError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Emails every subscriber about a freshly published post.
///
/// The body is taken raw so that an unauthorized caller is rejected before
/// its payload is even parsed.
#[tracing::instrument(
    name = "Handle a new post webhook",
    skip(request, body, store, email_client, base_url, secret, send_timeout)
)]
pub async fn handle_new_post(
    request: HttpRequest,
    body: web::Bytes,
    store: web::Data<SubscriberStore>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    secret: web::Data<WebhookSecret>,
    send_timeout: web::Data<EmailSendTimeout>,
) -> Result<HttpResponse, NewPostError> {
    if let Some(secret) = &secret.0 {
        if !has_bearer_token(request.headers(), secret) {
            return Err(NewPostError::Unauthorized);
        }
    }

    let body: NewPostBody = serde_json::from_slice(&body)
        .map_err(|err| NewPostError::InvalidPayload(err.to_string()))?;
    let post = NewPostEvent::try_from(body).map_err(|err| {
        tracing::warn!("Validation error: {:?}", err);
        NewPostError::InvalidPayload(err)
    })?;

    let report = notify_new_post(
        &store,
        &email_client,
        base_url.0.as_str(),
        &post,
        send_timeout.0,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Notifications sent",
        "count": report.targeted,
        "delivered": report.delivered,
        "failed": report.failed,
    })))
}

#[derive(Deserialize, Debug)]
pub struct DryRunParameters {
    pub test: Option<String>,
}

#[derive(thiserror::Error)]
pub enum DryRunError {
    #[error("Test mode not enabled")]
    NotEnabled,
    #[error("No posts found")]
    NoPosts,
    #[error("Failed to fetch the latest post")]
    CmsError(#[from] reqwest::Error),
    #[error("Failed to count subscribers")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for DryRunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for DryRunError {
    fn status_code(&self) -> StatusCode {
        match self {
            DryRunError::NotEnabled => StatusCode::BAD_REQUEST,
            DryRunError::NoPosts => StatusCode::NOT_FOUND,
            DryRunError::CmsError(_) | DryRunError::StoreError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Reports what a real notification would do for the latest post, without
/// sending anything.
#[tracing::instrument(name = "New post dry run", skip(parameters, store, cms_client))]
pub async fn handle_new_post_dry_run(
    parameters: web::Query<DryRunParameters>,
    store: web::Data<SubscriberStore>,
    cms_client: web::Data<CmsClient>,
) -> Result<HttpResponse, DryRunError> {
    if parameters.test.as_deref() != Some("true") {
        return Err(DryRunError::NotEnabled);
    }

    let post = cms_client.latest_post().await?.ok_or(DryRunError::NoPosts)?;
    let subscriber_count = store.load().await?.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Test mode - would notify subscribers",
        "post": post,
        "subscriberCount": subscriber_count,
    })))
}
