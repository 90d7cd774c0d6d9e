use actix_web::http::header::HeaderMap;
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};

/// Extracts the credential from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, anyhow::Error> {
    let header_value = headers
        .get("Authorization")
        .context("The 'Authorization' header was missing")?
        .to_str()
        .context("The 'Authorization' header was not a valid UTF8 string.")?;

    header_value
        .strip_prefix("Bearer ")
        .context("The authorization scheme was not 'Bearer'.")
}

/// Whether the request carries `expected` as its bearer token.
pub fn has_bearer_token(headers: &HeaderMap, expected: &Secret<String>) -> bool {
    match bearer_token(headers) {
        Ok(presented) => constant_time_eq(presented.as_bytes(), expected.expose_secret().as_bytes()),
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer credentials");
            false
        }
    }
}

// Runtime depends only on the lengths, never on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
