use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_token::SubscriberToken;
use crate::routes::{error_chain_fmt, json_error};
use crate::store::{StoreError, SubscriberSelector, SubscriberStore};

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub token: Option<String>,
    pub email: Option<String>,
}

#[derive(thiserror::Error)]
pub enum UnsubscribeError {
    #[error("Token or email required")]
    MissingIdentifier,
    #[error("Subscriber not found")]
    NotFound,
    #[error("Failed to unsubscribe")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for UnsubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for UnsubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            UnsubscribeError::MissingIdentifier => StatusCode::BAD_REQUEST,
            UnsubscribeError::NotFound => StatusCode::NOT_FOUND,
            UnsubscribeError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Removes a subscriber by token or by email. When both are given only the
/// token is used.
#[tracing::instrument(name = "Unsubscribe from the newsletter", skip(store, parameters))]
pub async fn handle_unsubscribe(
    store: web::Data<SubscriberStore>,
    parameters: web::Query<Parameters>,
) -> Result<HttpResponse, UnsubscribeError> {
    let Parameters { token, email } = parameters.into_inner();
    let token = token.and_then(|token| SubscriberToken::parse(token).ok());
    let email = email.filter(|email| !email.trim().is_empty());

    if token.is_none() && email.is_none() {
        return Err(UnsubscribeError::MissingIdentifier);
    }

    // An address that cannot be valid cannot belong to a subscriber either
    let email = email.and_then(|email| SubscriberEmail::parse(email).ok());
    let selector =
        SubscriberSelector::from_parts(token, email).ok_or(UnsubscribeError::NotFound)?;

    let removed = store
        .remove(&selector)
        .await?
        .ok_or(UnsubscribeError::NotFound)?;

    tracing::info!(subscriber_id = %removed.id, "Subscriber removed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully unsubscribed",
    })))
}
