use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;

use crate::authorization::has_bearer_token;
use crate::routes::{error_chain_fmt, json_error};
use crate::startup::AdminStatsToken;
use crate::stats::SubscriberStats;
use crate::store::{StoreError, SubscriberStore};

#[derive(thiserror::Error)]
pub enum StatsError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Failed to get stats")]
    StoreError(#[from] StoreError),
}

impl std::fmt::Debug for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for StatsError {
    fn status_code(&self) -> StatusCode {
        match self {
            StatsError::Unauthorized => StatusCode::UNAUTHORIZED,
            StatsError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

#[tracing::instrument(name = "Subscriber stats", skip(request, store, stats_token))]
pub async fn handle_subscription_stats(
    request: HttpRequest,
    store: web::Data<SubscriberStore>,
    stats_token: web::Data<AdminStatsToken>,
) -> Result<HttpResponse, StatsError> {
    // Without a configured token nobody gets in
    let authorized = stats_token
        .0
        .as_ref()
        .map(|token| has_bearer_token(request.headers(), token))
        .unwrap_or(false);

    if !authorized {
        return Err(StatsError::Unauthorized);
    }

    let subscribers = store.load().await?;

    Ok(HttpResponse::Ok().json(SubscriberStats::compute(&subscribers, Utc::now())))
}
