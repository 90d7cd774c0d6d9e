use actix_web::http::StatusCode;
use actix_web::{
    web::{self, Query},
    HttpResponse, ResponseError,
};
use serde::Deserialize;

use crate::domain::subscriber_token::SubscriberToken;
use crate::routes::{error_chain_fmt, json_error};
use crate::store::{StoreError, SubscriberStore};

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub token: Option<String>,
}

#[derive(thiserror::Error)]
pub enum ConfirmSubscriptionError {
    #[error("Token required")]
    MissingToken,
    #[error("Invalid token")]
    UnknownToken,
    #[error("Failed to verify email")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for ConfirmSubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConfirmSubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmSubscriptionError::MissingToken => StatusCode::BAD_REQUEST,
            ConfirmSubscriptionError::UnknownToken => StatusCode::NOT_FOUND,
            ConfirmSubscriptionError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Verifies the subscriber that owns the token. Verifying twice is fine.
#[tracing::instrument(name = "Confirm a newsletter subscription", skip(store, parameters))]
pub async fn handle_confirm_subscription(
    store: web::Data<SubscriberStore>,
    parameters: Query<Parameters>,
) -> Result<HttpResponse, ConfirmSubscriptionError> {
    let token = parameters
        .into_inner()
        .token
        .and_then(|token| SubscriberToken::parse(token).ok())
        .ok_or(ConfirmSubscriptionError::MissingToken)?;

    let subscriber = store
        .mark_verified(&token)
        .await?
        .ok_or(ConfirmSubscriptionError::UnknownToken)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Email verified successfully",
        "email": subscriber.email,
    })))
}
