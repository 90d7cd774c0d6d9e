use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_token::SubscriberToken;

/// One newsletter sign-up, as stored in the subscriber document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub subscribed_at: DateTime<Utc>,
    // `None` only for hand-edited or legacy records without the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    pub token: SubscriberToken,
}

impl Subscriber {
    pub fn new(email: SubscriberEmail) -> Subscriber {
        Subscriber {
            id: Uuid::new_v4(),
            email,
            subscribed_at: Utc::now(),
            verified: Some(false),
            token: SubscriberToken::generate(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }

    /// Only an explicit `false` opts a subscriber out of new post emails.
    pub fn accepts_notifications(&self) -> bool {
        self.verified != Some(false)
    }

    /// Flips the flag to verified. Returns whether anything changed.
    pub fn verify(&mut self) -> bool {
        if self.is_verified() {
            return false;
        }

        self.verified = Some(true);
        true
    }
}
