use validator::validate_email;

/// A lowercase email address. Two addresses that only differ in case or
/// surrounding whitespace are the same subscriber.
///
/// [`SubscriberEmail::parse`] validates request input. Records read back from
/// the store are only normalized, so an address accepted by an older, looser
/// check stays loadable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "StoredEmail", into = "String")]
pub struct SubscriberEmail(String);

#[derive(serde::Deserialize)]
#[serde(transparent)]
struct StoredEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let normalized = email.trim().to_lowercase();
        let is_valid_email = validate_email(&normalized);

        if !is_valid_email {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(normalized))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<StoredEmail> for SubscriberEmail {
    fn from(stored: StoredEmail) -> Self {
        Self(stored.0.trim().to_lowercase())
    }
}

impl From<SubscriberEmail> for String {
    fn from(email: SubscriberEmail) -> Self {
        email.0
    }
}
