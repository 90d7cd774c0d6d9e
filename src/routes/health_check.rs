use actix_web::{web, HttpResponse};

use crate::store::SubscriberStore;

/// Endpoint used by clients to know if the server is working. A store that
/// cannot be read makes the service unhealthy.
#[tracing::instrument(name = "Health Check handler", skip(store))]
pub async fn health_check(store: web::Data<SubscriberStore>) -> HttpResponse {
    match store.load().await {
        Ok(subscribers) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "subscribers": subscribers.len(),
        })),
        Err(err) => {
            tracing::error!(error = ?err, "Subscriber store is unavailable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unavailable",
            }))
        }
    }
}
