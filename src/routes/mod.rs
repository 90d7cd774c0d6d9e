mod health_check;
mod newsletters;
mod subscription_stats;
mod subscriptions;
mod subscriptions_confirm;
mod test_email;
mod unsubscribe;

pub use health_check::health_check;
pub use newsletters::{handle_new_post, handle_new_post_dry_run};
pub use subscription_stats::handle_subscription_stats;
pub use subscriptions::handle_create_subscription;
pub use subscriptions_confirm::handle_confirm_subscription;
pub use test_email::{handle_send_test_email, handle_test_email_status};
pub use unsubscribe::handle_unsubscribe;

use actix_web::{HttpResponse, ResponseError};

/// Prints an error followed by every error in its `source` chain.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// `{"error": "<message>"}` with the status the error maps to.
pub fn json_error(error: &impl ResponseError) -> HttpResponse {
    HttpResponse::build(error.status_code()).json(serde_json::json!({ "error": error.to_string() }))
}
