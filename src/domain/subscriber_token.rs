use rand::rngs::OsRng;
use rand::RngCore;

// 32 bytes = 256 bits of entropy
const TOKEN_BYTES: usize = 32;

/// Secret bound to one subscriber, used both to verify the address and to
/// authenticate unsubscribe links. Generated once, never rotated.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SubscriberToken(String);

impl SubscriberToken {
    pub fn generate() -> SubscriberToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self(hex::encode(bytes))
    }

    /// Accepts whatever the caller presented; an empty string is not a token.
    pub fn parse(token: String) -> Result<SubscriberToken, String> {
        let token = token.trim();

        if token.is_empty() {
            return Err(String::from("token cannot be empty"));
        }

        Ok(Self(token.to_string()))
    }
}

impl AsRef<str> for SubscriberToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials, keep them out of logs
impl std::fmt::Debug for SubscriberToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SubscriberToken([REDACTED])")
    }
}
