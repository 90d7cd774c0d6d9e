//! "New post" fan-out: one personalized email per subscriber, sent
//! concurrently, where a failing recipient never stops the others.

use askama_escape::{escape, Html};
use futures::future::join_all;
use std::time;

use crate::domain::new_post::NewPostEvent;
use crate::domain::subscriber::Subscriber;
use crate::email_client::{EmailClient, OutgoingEmail};
use crate::store::{StoreError, SubscriberStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FanOutReport {
    /// Subscribers an email was attempted for.
    pub targeted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[tracing::instrument(
    name = "Notify subscribers about a new post",
    skip(store, email_client, base_url, post, send_timeout),
    fields(post_id = %post.post_id, slug = %post.slug)
)]
pub async fn notify_new_post(
    store: &SubscriberStore,
    email_client: &EmailClient,
    base_url: &str,
    post: &NewPostEvent,
    send_timeout: time::Duration,
) -> Result<FanOutReport, StoreError> {
    let recipients: Vec<Subscriber> = store
        .load()
        .await?
        .into_iter()
        .filter(Subscriber::accepts_notifications)
        .collect();

    let sends = recipients.iter().map(|subscriber| async move {
        let email = new_post_email(subscriber, post, base_url);

        match tokio::time::timeout(send_timeout, email_client.send_email(&email)).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(recipient = %subscriber.email, "New post email was not delivered");
                false
            }
            Err(_) => {
                tracing::warn!(
                    recipient = %subscriber.email,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "New post email timed out"
                );
                false
            }
        }
    });

    let outcomes = join_all(sends).await;
    let delivered = outcomes.iter().filter(|delivered| **delivered).count();
    let report = FanOutReport {
        targeted: outcomes.len(),
        delivered,
        failed: outcomes.len() - delivered,
    };

    tracing::info!(
        targeted = report.targeted,
        delivered = report.delivered,
        failed = report.failed,
        "New post fan-out finished"
    );

    Ok(report)
}

/// Builds the email announcing `post` to one subscriber, with an unsubscribe
/// link bound to that subscriber's token.
pub fn new_post_email(subscriber: &Subscriber, post: &NewPostEvent, base_url: &str) -> OutgoingEmail {
    let post_url = format!("{}/blog/{}", base_url, post.slug);
    let unsubscribe_url = format!("{}/unsubscribe?token={}", base_url, subscriber.token.as_ref());

    // Post fields come from the webhook caller
    let post_href = format!("{}/blog/{}", base_url, escape(&post.slug, Html));
    let description_html = post
        .description
        .as_ref()
        .map(|d| format!(r#"<p class="description">{}</p>"#, escape(d, Html)))
        .unwrap_or_default();
    let author_html = post
        .author_name
        .as_ref()
        .map(|a| format!(r#"<p style="color: #888;">by {}</p>"#, escape(a, Html)))
        .unwrap_or_default();

    let html = format!(
        r#"
            <!DOCTYPE html>
            <html>
              <body style="font-family: Georgia, serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                  <h1 style="font-size: 24px;">what the ellie</h1>
                  <h2>{title}</h2>
                  {description_html}
                  {author_html}
                  <a href="{post_href}">Read the full story</a>
                  <p style="margin-top: 40px; font-size: 12px; color: #999;">
                    You're receiving this because you subscribed to updates from what the ellie.
                    <a href="{unsubscribe_url}">Unsubscribe</a> if you no longer wish to receive these emails.
                  </p>
                </div>
              </body>
            </html>
        "#,
        title = escape(&post.title, Html),
    );

    let mut text = format!("New Post: {}\n\n", post.title);
    if let Some(description) = &post.description {
        text.push_str(&format!("{}\n\n", description));
    }
    if let Some(author) = &post.author_name {
        text.push_str(&format!("by {}\n\n", author));
    }
    text.push_str(&format!(
        "Read the full story: {}\n\n---\nUnsubscribe: {}\n",
        post_url, unsubscribe_url
    ));

    OutgoingEmail {
        to: subscriber.email.clone(),
        subject: format!("New Post: {}", post.title),
        html,
        text: Some(text),
    }
}
